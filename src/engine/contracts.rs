use thiserror::Error;

use crate::types::{Side, UiAction};

/// Expected failure signals from host adapters. These are not engine bugs;
/// the dispatcher isolates them per effect step.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("piece '{0}' not found")]
    PieceNotFound(String),

    #[error("tile '{0}' is outside the board")]
    TileOutOfBounds(String),

    #[error("{0}")]
    Other(String),
}

/// A piece as exposed by the board adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub id: String,
    pub kind: String,
    pub side: Side,
    pub tile: String,
}

/// Snapshot of the match clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSnapshot {
    pub ply: u32,
    pub turn_side: Side,
}

/// Board adapter. Reads of unknown piece ids must fail with
/// [`ContractError::PieceNotFound`]; `remove_piece` of an already-absent id
/// must be a no-op.
pub trait BoardContract {
    fn tiles(&self) -> Vec<String>;
    fn is_empty(&self, tile: &str) -> bool;
    fn piece_at(&self, tile: &str) -> Option<Piece>;
    fn piece(&self, id: &str) -> Result<Piece, ContractError>;
    fn set_piece_tile(&mut self, id: &str, tile: &str) -> Result<(), ContractError>;
    fn remove_piece(&mut self, id: &str);
    fn capture_piece(&mut self, id: &str, reason: &str) -> Result<(), ContractError>;
    fn spawn_piece(&mut self, kind: &str, side: Side, tile: &str) -> Result<String, ContractError>;
    fn within_board(&self, tile: &str) -> bool;
    fn neighbors(&self, tile: &str, radius: u32) -> Vec<String>;
}

/// UI adapter.
pub trait UiContract {
    fn toast(&mut self, message: &str);
    fn register_action(&mut self, spec: &UiAction);
    fn all_actions(&self) -> Vec<UiAction>;
    fn clear_actions(&mut self);
}

/// Presentation adapter for animations, decals, and audio. Decals live here
/// rather than on the board: they are cosmetic markers, and hosts read them
/// back through `decal_at`.
pub trait VfxContract {
    fn spawn_decal(&mut self, tile: &str, decal: &str);
    fn clear_decal(&mut self, tile: &str);
    fn decal_at(&self, tile: &str) -> Option<String>;
    fn play_animation(&mut self, sprite_id: &str, tile: Option<&str>);
    fn play_audio(&mut self, audio_id: &str);
}

/// Match/turn adapter.
pub trait MatchContract {
    fn get(&self) -> MatchSnapshot;
    fn set_turn(&mut self, side: Side);
    fn end_turn(&mut self);
}

/// The full contracts boundary handed to the engine at construction. The
/// engine is the only caller once a match is running.
pub struct Contracts {
    pub board: Box<dyn BoardContract>,
    pub ui: Box<dyn UiContract>,
    pub vfx: Box<dyn VfxContract>,
    pub game: Box<dyn MatchContract>,
}
