use std::fmt;

/// The closed action-verb vocabulary, one variant per `namespace.verb`.
///
/// Unknown verbs are preserved as [`Verb::Unrecognized`] so a structurally
/// valid document survives validation with a warning and only fails (in an
/// isolated way) if the effect actually fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    BoardCapture,
    PieceSpawn,
    PieceTeleport,
    PieceRemove,
    StatusAdd,
    StatusRemove,
    CooldownSet,
    TurnEnd,
    TurnSet,
    StateSet,
    StateRemove,
    VfxPlay,
    VfxDecal,
    VfxClear,
    AudioPlay,
    UiToast,
    Unrecognized(String),
}

/// Every verb the interpreter knows how to execute, in stable order.
pub const KNOWN_VERBS: &[&str] = &[
    "board.capture",
    "piece.spawn",
    "piece.teleport",
    "piece.remove",
    "status.add",
    "status.remove",
    "cooldown.set",
    "turn.end",
    "turn.set",
    "state.set",
    "state.remove",
    "vfx.play",
    "vfx.decal",
    "vfx.clear",
    "audio.play",
    "ui.toast",
];

impl Verb {
    /// Parse a `namespace.verb` action string. Never fails: anything outside
    /// the known vocabulary becomes [`Verb::Unrecognized`].
    #[must_use]
    pub fn parse(action: &str) -> Verb {
        match action {
            "board.capture" => Verb::BoardCapture,
            "piece.spawn" => Verb::PieceSpawn,
            "piece.teleport" => Verb::PieceTeleport,
            "piece.remove" => Verb::PieceRemove,
            "status.add" => Verb::StatusAdd,
            "status.remove" => Verb::StatusRemove,
            "cooldown.set" => Verb::CooldownSet,
            "turn.end" => Verb::TurnEnd,
            "turn.set" => Verb::TurnSet,
            "state.set" => Verb::StateSet,
            "state.remove" => Verb::StateRemove,
            "vfx.play" => Verb::VfxPlay,
            "vfx.decal" => Verb::VfxDecal,
            "vfx.clear" => Verb::VfxClear,
            "audio.play" => Verb::AudioPlay,
            "ui.toast" => Verb::UiToast,
            other => Verb::Unrecognized(other.to_owned()),
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Verb::Unrecognized(_))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Verb::BoardCapture => "board.capture",
            Verb::PieceSpawn => "piece.spawn",
            Verb::PieceTeleport => "piece.teleport",
            Verb::PieceRemove => "piece.remove",
            Verb::StatusAdd => "status.add",
            Verb::StatusRemove => "status.remove",
            Verb::CooldownSet => "cooldown.set",
            Verb::TurnEnd => "turn.end",
            Verb::TurnSet => "turn.set",
            Verb::StateSet => "state.set",
            Verb::StateRemove => "state.remove",
            Verb::VfxPlay => "vfx.play",
            Verb::VfxDecal => "vfx.decal",
            Verb::VfxClear => "vfx.clear",
            Verb::AudioPlay => "audio.play",
            Verb::UiToast => "ui.toast",
            Verb::Unrecognized(s) => s,
        }
    }

    /// Whether a string has the `namespace.verb` shape required of every
    /// action, known or not: a lowercase namespace, a dot, and a verb
    /// starting with a lowercase run.
    #[must_use]
    pub fn has_shape(action: &str) -> bool {
        match action.split_once('.') {
            Some((ns, rest)) => {
                !ns.is_empty()
                    && ns.bytes().all(|b| b.is_ascii_lowercase())
                    && rest.bytes().next().is_some_and(|b| b.is_ascii_lowercase())
            }
            None => false,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
