use serde_json::json;

use crate::lexicon::{AssetLexicon, BuiltinLexicon};
use crate::types::{
    ActionStep, CanonicalIntent, Command, CompileOutput, CompilerWarning, Condition, CooldownSpec,
    Effect, Limit, Limits, Logic, Meta, MovementOverride, RuleDocument, RuleProgram, Scope, Steps,
    Targeting, TestExpectation, Ui, UiAction, events,
};

/// Default rule name substituted when no `DEFINE_RULE` command is present.
pub const DEFAULT_RULE_NAME: &str = "Règle personnalisée";

const DEFAULT_TEMPLATE: &str = "custom_template";
const DEFAULT_CATEGORY: &str = "custom";

/// Compile an authoring program into a canonical intent using the built-in
/// asset lexicon. Never fails: missing pieces of the program are replaced by
/// safe defaults and reported as warnings.
#[must_use]
pub fn compile(program: &RuleProgram) -> CompileOutput {
    compile_with(program, &BuiltinLexicon)
}

/// Compile with a caller-supplied asset lexicon.
#[must_use]
pub fn compile_with(program: &RuleProgram, lexicon: &dyn AssetLexicon) -> CompileOutput {
    let mut acc = Accumulator::default();
    for command in program.commands() {
        acc.apply(command);
    }
    acc.finish(lexicon)
}

#[derive(Default)]
struct Accumulator {
    name: Option<String>,
    template: Option<String>,
    category: Option<String>,
    pieces: Vec<String>,
    mechanics: Vec<String>,
    hazards: Vec<String>,
    statuses: Vec<String>,
    keywords: Vec<String>,
    targeting: Option<Targeting>,
    limits: Limits,
    requirements: Vec<String>,
    text_hints: Vec<String>,
    notes: Vec<String>,
    tests: Vec<TestExpectation>,
    // (piece, added, spec) in command order
    moves: Vec<(String, bool, String)>,
}

impl Accumulator {
    fn apply(&mut self, command: &Command) {
        match command {
            Command::DefineRule {
                name,
                template,
                category,
            } => {
                self.name = Some(name.clone());
                if template.is_some() {
                    self.template.clone_from(template);
                }
                if category.is_some() {
                    self.category.clone_from(category);
                }
            }
            Command::SetPieces { pieces } => {
                for piece in pieces {
                    push_unique(&mut self.pieces, piece.to_lowercase());
                }
            }
            Command::AddMechanic { mechanic } => push_unique(&mut self.mechanics, mechanic.clone()),
            Command::AddHazard { hazard } => push_unique(&mut self.hazards, hazard.clone()),
            Command::AddStatus { status } => push_unique(&mut self.statuses, status.clone()),
            Command::AddKeyword { keyword } => push_unique(&mut self.keywords, keyword.clone()),
            Command::SetTargeting {
                mode,
                provider,
                params,
            } => {
                self.targeting = Some(Targeting {
                    mode: mode.clone(),
                    provider: provider.clone(),
                    params: params.clone(),
                });
            }
            Command::SetLimit { limit } => match limit {
                Limit::CooldownPerPiece(turns) => self.limits.cooldown_per_piece = Some(*turns),
                Limit::Duration(turns) => self.limits.duration = Some(*turns),
                Limit::ChargesPerMatch(charges) => self.limits.charges_per_match = Some(*charges),
                Limit::OncePerMatch => self.limits.once_per_match = true,
            },
            Command::SetRequirement { requirement } => {
                push_unique(&mut self.requirements, requirement.clone());
            }
            Command::AddTextHint { hint } => self.text_hints.push(hint.clone()),
            Command::AddNote { note } => self.notes.push(note.clone()),
            Command::ExpectAction { event, action } => self.tests.push(TestExpectation::Action {
                event: event.clone(),
                action: action.clone(),
            }),
            Command::ExpectMove {
                piece,
                from,
                to,
                legal,
            } => self.tests.push(TestExpectation::Move {
                piece: piece.clone(),
                from: from.clone(),
                to: to.clone(),
                legal: *legal,
            }),
            Command::AddMove { piece, move_spec } => {
                self.moves
                    .push((piece.to_lowercase(), true, move_spec.clone()));
            }
            Command::RemoveMove { piece, move_spec } => {
                self.moves
                    .push((piece.to_lowercase(), false, move_spec.clone()));
            }
        }
    }

    fn finish(self, lexicon: &dyn AssetLexicon) -> CompileOutput {
        let mut warnings = Vec::new();

        let rule_name = self.name.unwrap_or_else(|| {
            warnings.push(CompilerWarning::new(
                "missing_rule_name",
                "no DEFINE_RULE command; substituting the default rule name",
            ));
            DEFAULT_RULE_NAME.to_owned()
        });
        let template_id = self.template.unwrap_or_else(|| {
            warnings.push(CompilerWarning::new(
                "missing_template",
                "no template selected; substituting the default template",
            ));
            DEFAULT_TEMPLATE.to_owned()
        });
        let category = self.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_owned());

        let affected_pieces = if self.pieces.is_empty() {
            warnings.push(CompilerWarning::new(
                "missing_pieces",
                "no affected pieces declared; defaulting to pawns",
            ));
            vec!["pawn".to_owned()]
        } else {
            self.pieces
        };
        let mechanics = if self.mechanics.is_empty() {
            warnings.push(CompilerWarning::new(
                "missing_mechanics",
                "no mechanics declared; defaulting to a custom mechanic",
            ));
            vec!["custom".to_owned()]
        } else {
            self.mechanics
        };

        // Asset tokens: keywords, hazards, statuses, and the suffix of each
        // mechanic (text after the last `:`).
        let mut tokens: Vec<String> = Vec::new();
        for keyword in &self.keywords {
            push_unique(&mut tokens, keyword.clone());
        }
        for hazard in &self.hazards {
            push_unique(&mut tokens, hazard.clone());
        }
        for status in &self.statuses {
            push_unique(&mut tokens, status.clone());
        }
        for mechanic in &mechanics {
            push_unique(&mut tokens, mechanic_token(mechanic).to_owned());
        }
        let mut vfx = Vec::new();
        let mut sfx = Vec::new();
        for token in &tokens {
            if let Some(pair) = lexicon.resolve(token) {
                push_unique(&mut vfx, pair.vfx);
                push_unique(&mut sfx, pair.sfx);
            }
        }

        let mut movement_overrides: Vec<MovementOverride> = Vec::new();
        for (piece, added, spec) in self.moves {
            let entry = match movement_overrides.iter_mut().find(|o| o.piece == piece) {
                Some(entry) => entry,
                None => {
                    movement_overrides.push(MovementOverride {
                        piece,
                        added: Vec::new(),
                        removed: Vec::new(),
                    });
                    movement_overrides.last_mut().expect("just pushed")
                }
            };
            if added {
                entry.added.push(spec);
            } else {
                entry.removed.push(spec);
            }
        }

        let intent = CanonicalIntent {
            rule_name,
            template_id,
            category,
            affected_pieces,
            mechanics,
            hazards: self.hazards,
            statuses: self.statuses,
            keywords: self.keywords,
            targeting: self.targeting,
            limits: self.limits,
            requirements: self.requirements,
            text_hints: self.text_hints,
            notes: self.notes,
            vfx,
            sfx,
        };

        CompileOutput {
            intent,
            warnings,
            tests: self.tests,
            movement_overrides,
        }
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// The behavior token of a mechanic: the text after the last `:`
/// (`"ability:teleport"` → `"teleport"`).
fn mechanic_token(mechanic: &str) -> &str {
    mechanic.rsplit(':').next().unwrap_or(mechanic)
}

/// Slug a free-form name into the `meta.ruleId` character set
/// (`[a-z0-9_-]`, 3 to 50 chars). The result always starts with a letter or
/// underscore so `state.<ruleId>` condition paths stay parseable.
fn slug(name: &str) -> String {
    let mut out = String::new();
    let mut pending_sep = false;
    for ch in name.chars() {
        let c = ch.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else if c == '_' || c == ':' || c.is_whitespace() {
            pending_sep = true;
        }
        // anything else (accents, punctuation) is dropped
    }
    if out.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        out.insert_str(0, "rule_");
    }
    out.truncate(50);
    while out.ends_with('_') || out.ends_with('-') {
        out.pop();
    }
    if out.len() < 3 {
        "custom_rule".to_owned()
    } else {
        out
    }
}

/// Slug a behavior token for use inside effect and UI-action ids.
fn token_slug(token: &str) -> String {
    let cleaned = slug(token);
    if cleaned == "custom_rule" && token != "custom_rule" {
        "custom".to_owned()
    } else {
        cleaned
    }
}

impl CanonicalIntent {
    /// Lower this intent into the canonical persisted rule document fed to
    /// the validator. Mechanics become UI-triggered ability effects, hazards
    /// become a placement/trigger effect pair, statuses become `status.*`
    /// reactions. `logic.effects` is never empty because `mechanics` never
    /// is.
    #[must_use]
    pub fn to_document(&self) -> RuleDocument {
        let rule_id = slug(&self.rule_name);
        let first_vfx = self
            .vfx
            .first()
            .cloned()
            .unwrap_or_else(|| "vfx_sparkle".to_owned());
        let first_sfx = self
            .sfx
            .first()
            .cloned()
            .unwrap_or_else(|| "sfx_chime".to_owned());
        let cooldown = self
            .limits
            .cooldown_per_piece
            .map(|turns| CooldownSpec { turns });

        let mut actions: Vec<UiAction> = Vec::new();
        let mut effects: Vec<Effect> = Vec::new();

        for mechanic in &self.mechanics {
            let token = mechanic_token(mechanic);
            let tslug = token_slug(token);
            let action_id = format!("special_{tslug}");
            if actions.iter().any(|a| a.id == action_id) {
                continue;
            }
            actions.push(UiAction {
                id: action_id.clone(),
                label: Some(title_case(token)),
                icon: None,
            });
            effects.push(Effect {
                id: format!("{tslug}_activate"),
                when: format!("ui.{action_id}"),
                condition: None,
                steps: Steps::Many(vec![
                    step(
                        "vfx.play",
                        json!({"sprite": first_vfx, "tile": "$targetTile"}),
                    ),
                    step("audio.play", json!({"sound": first_sfx})),
                    step(
                        "ui.toast",
                        json!({"message": format!("{} activated", self.rule_name)}),
                    ),
                ]),
                on_fail: None,
                consumes_turn: false,
                cooldown: cooldown.clone(),
            });
        }

        for hazard in &self.hazards {
            let hslug = token_slug(hazard);
            let (hazard_vfx, hazard_sfx) = match BuiltinLexicon.resolve(hazard) {
                Some(pair) => (pair.vfx, pair.sfx),
                None => (first_vfx.clone(), first_sfx.clone()),
            };
            let action_id = format!("special_place_{hslug}");
            if actions.iter().any(|a| a.id == action_id) {
                continue;
            }
            actions.push(UiAction {
                id: action_id.clone(),
                label: Some(format!("Place {}", title_case(hazard))),
                icon: None,
            });
            effects.push(Effect {
                id: format!("{hslug}_place"),
                when: format!("ui.{action_id}"),
                condition: None,
                steps: Steps::Many(vec![
                    step(
                        "state.set",
                        json!({
                            "namespace": rule_id,
                            "key": "$targetTile",
                            "value": {"armed": true, "owner": "$side", "kind": hslug},
                        }),
                    ),
                    step("vfx.decal", json!({"tile": "$targetTile", "decal": hslug})),
                ]),
                on_fail: None,
                consumes_turn: true,
                cooldown: cooldown.clone(),
            });
            effects.push(Effect {
                id: format!("{hslug}_trigger"),
                when: events::ENTER_TILE.to_owned(),
                condition: Some(Condition::One(format!(
                    "state.{rule_id}.$tile.armed == true"
                ))),
                steps: Steps::Many(vec![
                    step(
                        "board.capture",
                        json!({"pieceId": "$pieceId", "reason": hslug}),
                    ),
                    step("state.remove", json!({"namespace": rule_id, "key": "$tile"})),
                    step("vfx.clear", json!({"tile": "$tile"})),
                    step("vfx.play", json!({"sprite": hazard_vfx, "tile": "$tile"})),
                    step("audio.play", json!({"sound": hazard_sfx})),
                ]),
                on_fail: None,
                consumes_turn: false,
                cooldown: None,
            });
        }

        for status in &self.statuses {
            let sslug = token_slug(status);
            if effects.iter().any(|e| e.id == format!("{sslug}_applied")) {
                continue;
            }
            let (status_vfx, _) = match BuiltinLexicon.resolve(status) {
                Some(pair) => (pair.vfx, pair.sfx),
                None => (first_vfx.clone(), first_sfx.clone()),
            };
            effects.push(Effect {
                id: format!("{sslug}_applied"),
                when: format!("status.{sslug}"),
                condition: None,
                steps: Steps::Many(vec![
                    step("vfx.play", json!({"sprite": status_vfx, "tile": "$tile"})),
                    step(
                        "ui.toast",
                        json!({"message": format!("{} applied", title_case(status))}),
                    ),
                ]),
                on_fail: None,
                consumes_turn: false,
                cooldown: None,
            });
        }

        let mut parameters = serde_json::Map::new();
        if let Some(targeting) = &self.targeting {
            parameters.insert(
                "targeting".to_owned(),
                serde_json::to_value(targeting).unwrap_or_default(),
            );
        }
        if self.limits != Limits::default() {
            parameters.insert(
                "limits".to_owned(),
                serde_json::to_value(&self.limits).unwrap_or_default(),
            );
        }
        let parameters = if parameters.is_empty() {
            None
        } else {
            Some(serde_json::Value::Object(parameters))
        };

        RuleDocument {
            meta: Meta {
                rule_id,
                version: "1.0.0".to_owned(),
                name: Some(self.rule_name.clone()),
                category: Some(self.category.clone()),
                summary: if self.text_hints.is_empty() {
                    None
                } else {
                    Some(self.text_hints.join("; "))
                },
            },
            scope: Scope {
                affected_pieces: self.affected_pieces.clone(),
            },
            logic: Logic { effects },
            ui: Ui { actions },
            assets: crate::types::Assets {
                vfx: self.vfx.clone(),
                sfx: self.sfx.clone(),
            },
            state: None,
            parameters,
        }
    }
}

fn step(action: &str, params: serde_json::Value) -> ActionStep {
    ActionStep {
        action: action.to_owned(),
        params: Some(params),
    }
}

fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Command, Limit, RuleProgram};

    fn mine_program() -> RuleProgram {
        RuleProgram::new()
            .with(Command::DefineRule {
                name: "Pawn Mines".into(),
                template: Some("trap_template".into()),
                category: Some("hazard".into()),
            })
            .with(Command::SetPieces {
                pieces: vec!["Pawn".into(), "pawn".into()],
            })
            .with(Command::AddHazard {
                hazard: "mine".into(),
            })
            .with(Command::AddMechanic {
                mechanic: "ability:explosion".into(),
            })
            .with(Command::SetLimit {
                limit: Limit::CooldownPerPiece(2),
            })
    }

    #[test]
    fn compile_is_deterministic() {
        let program = mine_program();
        let a = compile(&program);
        let b = compile(&program);
        assert_eq!(a.intent, b.intent);
        assert_eq!(a.warnings, b.warnings);
        assert_eq!(
            serde_json::to_string(&a.intent).unwrap(),
            serde_json::to_string(&b.intent).unwrap()
        );
    }

    #[test]
    fn missing_rule_name_warns_and_defaults() {
        let program = RuleProgram::new().with(Command::AddMechanic {
            mechanic: "custom".into(),
        });
        let out = compile(&program);
        assert!(out.has_warning("missing_rule_name"));
        assert_eq!(out.intent.rule_name, "Règle personnalisée");
    }

    #[test]
    fn empty_program_gets_all_defaults() {
        let out = compile(&RuleProgram::new());
        assert!(out.has_warning("missing_rule_name"));
        assert!(out.has_warning("missing_template"));
        assert!(out.has_warning("missing_pieces"));
        assert!(out.has_warning("missing_mechanics"));
        assert_eq!(out.intent.template_id, "custom_template");
        assert_eq!(out.intent.affected_pieces, vec!["pawn"]);
        assert_eq!(out.intent.mechanics, vec!["custom"]);
    }

    #[test]
    fn pieces_are_case_normalized_and_deduplicated() {
        let out = compile(&mine_program());
        assert_eq!(out.intent.affected_pieces, vec!["pawn"]);
    }

    #[test]
    fn last_define_rule_wins() {
        let program = RuleProgram::new()
            .with(Command::DefineRule {
                name: "First".into(),
                template: None,
                category: None,
            })
            .with(Command::DefineRule {
                name: "Second".into(),
                template: Some("t2".into()),
                category: None,
            });
        let out = compile(&program);
        assert_eq!(out.intent.rule_name, "Second");
        assert_eq!(out.intent.template_id, "t2");
    }

    #[test]
    fn expectations_do_not_mutate_intent() {
        let base = compile(&mine_program());
        let with_tests = compile(
            &mine_program()
                .with(Command::ExpectAction {
                    event: "ui.special_place_mine".into(),
                    action: "state.set".into(),
                })
                .with(Command::ExpectMove {
                    piece: "pawn".into(),
                    from: "e2".into(),
                    to: "e5".into(),
                    legal: false,
                }),
        );
        assert_eq!(base.intent, with_tests.intent);
        assert_eq!(with_tests.tests.len(), 2);
    }

    #[test]
    fn movement_deltas_are_reported_out_of_band() {
        let out = compile(
            &mine_program()
                .with(Command::AddMove {
                    piece: "Knight".into(),
                    move_spec: "leap(3,1)".into(),
                })
                .with(Command::RemoveMove {
                    piece: "knight".into(),
                    move_spec: "leap(2,1)".into(),
                }),
        );
        assert_eq!(out.movement_overrides.len(), 1);
        let knight = &out.movement_overrides[0];
        assert_eq!(knight.piece, "knight");
        assert_eq!(knight.added, vec!["leap(3,1)"]);
        assert_eq!(knight.removed, vec!["leap(2,1)"]);
    }

    #[test]
    fn assets_resolved_from_hazards_and_mechanic_suffix() {
        let out = compile(&mine_program());
        // "mine" and the "explosion" mechanic suffix share the same pair
        assert_eq!(out.intent.vfx, vec!["vfx_explosion"]);
        assert_eq!(out.intent.sfx, vec!["sfx_explosion"]);
    }

    #[test]
    fn slug_rules() {
        assert_eq!(slug("Pawn Mines"), "pawn_mines");
        assert_eq!(slug("Règle personnalisée"), "rgle_personnalise");
        assert_eq!(slug("4th Rank Mines"), "rule_4th_rank_mines");
        assert_eq!(slug("x"), "custom_rule");
        assert!(slug(&"a".repeat(80)).len() <= 50);
    }

    #[test]
    fn lowering_produces_nonempty_effects_and_valid_ids() {
        let out = compile(&mine_program());
        let doc = out.intent.to_document();
        assert!(!doc.logic.effects.is_empty());
        assert_eq!(doc.meta.rule_id, "pawn_mines");
        assert!(doc.ui.actions.iter().all(|a| a.id.starts_with("special_")));
    }

    #[test]
    fn lowering_hazard_creates_place_and_trigger_pair() {
        let out = compile(&mine_program());
        let doc = out.intent.to_document();
        let place = doc
            .logic
            .effects
            .iter()
            .find(|e| e.id == "mine_place")
            .unwrap();
        assert_eq!(place.when, "ui.special_place_mine");
        assert!(place.consumes_turn);
        assert_eq!(place.cooldown.as_ref().unwrap().turns, 2);

        let trigger = doc
            .logic
            .effects
            .iter()
            .find(|e| e.id == "mine_trigger")
            .unwrap();
        assert_eq!(trigger.when, "lifecycle.onEnterTile");
        let clause = &trigger.condition.as_ref().unwrap().clauses()[0];
        assert_eq!(clause, "state.pawn_mines.$tile.armed == true");
        assert!(crate::parse_condition(clause).is_ok());
    }

    #[test]
    fn numeric_leading_rule_name_keeps_trigger_condition_parseable() {
        let program = RuleProgram::new()
            .with(Command::DefineRule {
                name: "4th Rank Mines".into(),
                template: None,
                category: None,
            })
            .with(Command::AddHazard {
                hazard: "mine".into(),
            });
        let doc = compile(&program).intent.to_document();
        assert_eq!(doc.meta.rule_id, "rule_4th_rank_mines");
        let trigger = doc
            .logic
            .effects
            .iter()
            .find(|e| e.id == "mine_trigger")
            .unwrap();
        let clause = &trigger.condition.as_ref().unwrap().clauses()[0];
        assert!(crate::parse_condition(clause).is_ok(), "clause: {clause}");
    }

    #[test]
    fn colliding_hazard_slugs_lower_a_single_pair() {
        let program = RuleProgram::new()
            .with(Command::AddHazard {
                hazard: "Fire Trap".into(),
            })
            .with(Command::AddHazard {
                hazard: "fire trap".into(),
            });
        let doc = compile(&program).intent.to_document();
        let mut action_ids: Vec<_> = doc.ui.actions.iter().map(|a| a.id.as_str()).collect();
        action_ids.sort_unstable();
        action_ids.dedup();
        assert_eq!(action_ids.len(), doc.ui.actions.len());
        let places = doc
            .logic
            .effects
            .iter()
            .filter(|e| e.id == "fire_trap_place")
            .count();
        assert_eq!(places, 1);
    }

    #[test]
    fn lowering_records_targeting_and_limits_in_parameters() {
        let out = compile(&mine_program().with(Command::SetTargeting {
            mode: "tile".into(),
            provider: Some("radius".into()),
            params: None,
        }));
        let doc = out.intent.to_document();
        let params = doc.parameters.unwrap();
        assert_eq!(params["targeting"]["mode"], "tile");
        assert_eq!(params["limits"]["cooldownPerPiece"], 2);
    }

    #[test]
    fn lowered_document_passes_validation() {
        let out = compile(&mine_program());
        let doc = out.intent.to_document();
        let report = crate::validate(&serde_json::to_value(&doc).unwrap());
        assert!(report.valid, "errors: {:?}", report.errors);
    }
}
