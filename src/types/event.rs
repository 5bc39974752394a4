use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical lifecycle event names used in effect `when` selectors.
pub mod events {
    pub const TURN_START: &str = "lifecycle.onTurnStart";
    pub const MOVE_COMMITTED: &str = "lifecycle.onMoveCommitted";
    pub const ENTER_TILE: &str = "lifecycle.onEnterTile";
    pub const UNDO: &str = "lifecycle.onUndo";
    pub const PROMOTE: &str = "lifecycle.onPromote";
}

/// One of the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Side::White => "white",
            Side::Black => "black",
        }
    }

    #[must_use]
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Parse a lowercase side name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Side> {
        match s {
            "white" => Some(Side::White),
            "black" => Some(Side::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for `lifecycle.onMoveCommitted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveEvent {
    pub piece_id: String,
    pub from: String,
    pub to: String,
    pub side: Side,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured: Option<String>,
}

/// Payload for a UI-triggered special action (`ui.runAction`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiActionEvent {
    pub action_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piece_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_tile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_round_trip() {
        assert_eq!(Side::parse("white"), Some(Side::White));
        assert_eq!(Side::parse("black"), Some(Side::Black));
        assert_eq!(Side::parse("red"), None);
        assert_eq!(Side::White.opponent(), Side::Black);
        assert_eq!(Side::Black.to_string(), "black");
    }

    #[test]
    fn side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::White).unwrap(), "\"white\"");
    }

    #[test]
    fn ui_action_event_camel_case() {
        let evt: UiActionEvent = serde_json::from_str(
            r#"{"actionId": "special_place_mine", "targetTile": "e4"}"#,
        )
        .unwrap();
        assert_eq!(evt.action_id, "special_place_mine");
        assert_eq!(evt.target_tile.as_deref(), Some("e4"));
        assert_eq!(evt.piece_id, None);
    }

    #[test]
    fn move_event_camel_case() {
        let mv = MoveEvent {
            piece_id: "white_pawn_e2".into(),
            from: "e2".into(),
            to: "e4".into(),
            side: Side::White,
            captured: None,
        };
        let json = serde_json::to_value(&mv).unwrap();
        assert_eq!(json["pieceId"], "white_pawn_e2");
        assert!(json.get("captured").is_none());
    }
}
