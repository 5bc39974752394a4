use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// One authoring command. Commands are pure data; applying them is
/// deterministic. Identity fields are last-write-wins, set-like fields are
/// monotonic and deduplicated (piece identifiers are case-normalized).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    DefineRule {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        template: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },
    SetPieces {
        pieces: Vec<String>,
    },
    AddMechanic {
        mechanic: String,
    },
    AddHazard {
        hazard: String,
    },
    AddStatus {
        status: String,
    },
    AddKeyword {
        keyword: String,
    },
    SetTargeting {
        mode: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Json>,
    },
    SetLimit {
        limit: Limit,
    },
    SetRequirement {
        requirement: String,
    },
    AddTextHint {
        hint: String,
    },
    AddNote {
        note: String,
    },
    /// Test expectation: triggering `event` should execute `action`.
    /// Does not mutate the compiled intent.
    ExpectAction {
        event: String,
        action: String,
    },
    /// Test expectation about move legality. Does not mutate the intent.
    ExpectMove {
        piece: String,
        from: String,
        to: String,
        legal: bool,
    },
    /// Movement delta for the external legality engine; reported out-of-band.
    AddMove {
        piece: String,
        move_spec: String,
    },
    RemoveMove {
        piece: String,
        move_spec: String,
    },
}

/// One usage limit on the rule's abilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Limit {
    CooldownPerPiece(u32),
    Duration(u32),
    ChargesPerMatch(u32),
    OncePerMatch,
}

/// An ordered authoring program, created once per authoring session and
/// immutable after compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleProgram {
    commands: Vec<Command>,
}

impl RuleProgram {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command, builder style.
    #[must_use]
    pub fn with(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl From<Vec<Command>> for RuleProgram {
    fn from(commands: Vec<Command>) -> Self {
        Self { commands }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_order() {
        let program = RuleProgram::new()
            .with(Command::DefineRule {
                name: "Mines".into(),
                template: None,
                category: None,
            })
            .with(Command::AddHazard {
                hazard: "mine".into(),
            });
        assert_eq!(program.len(), 2);
        assert!(matches!(program.commands()[1], Command::AddHazard { .. }));
    }

    #[test]
    fn command_serializes_with_op_tag() {
        let cmd = Command::SetPieces {
            pieces: vec!["pawn".into()],
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["op"], "SET_PIECES");
        assert_eq!(json["pieces"][0], "pawn");
    }

    #[test]
    fn command_deserializes_from_op_tag() {
        let cmd: Command = serde_json::from_str(
            r#"{"op": "ADD_MECHANIC", "mechanic": "ability:teleport"}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::AddMechanic {
                mechanic: "ability:teleport".into()
            }
        );
    }
}
