//! Pre-activation smoke harness.
//!
//! Runs a rule against recording mock contracts and a fixed scenario script
//! to catch documents that compile and validate but never produce an
//! observable side effect.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::engine::{
    BoardContract, ContractError, Contracts, MatchContract, MatchSnapshot, Piece, RuleEngine,
    UiContract, VfxContract,
};
use crate::types::{MoveEvent, RuleDocument, Side, UiAction};

/// Outcome of dry-running one rule. `success` is true iff no scenario
/// raised an error; warnings never affect it.
#[derive(Debug, Clone)]
pub struct DryRunReport {
    pub success: bool,
    pub errors: Vec<String>,
    pub executed_actions: Vec<String>,
    pub warnings: Vec<String>,
}

type ActionLog = Rc<RefCell<Vec<String>>>;

/// Replay the fixed scenario script against mock contracts:
/// turn-start(white), move-committed, enter-tile, turn-start(black).
#[must_use]
pub fn dry_run_rule(rule: &RuleDocument) -> DryRunReport {
    let log: ActionLog = Rc::default();
    let contracts = Contracts {
        board: Box::new(MockBoard {
            log: Rc::clone(&log),
        }),
        ui: Box::new(MockUi {
            log: Rc::clone(&log),
        }),
        vfx: Box::new(MockVfx {
            log: Rc::clone(&log),
            decals: HashMap::new(),
        }),
        game: Box::new(MockMatch {
            log: Rc::clone(&log),
        }),
    };
    let mut engine = RuleEngine::new(contracts, std::slice::from_ref(rule));
    let mut errors = Vec::new();

    engine.on_turn_start(Side::White);
    collect(&mut engine, "turn-start(white)", &mut errors);

    engine.on_move_committed(&MoveEvent {
        piece_id: "white_pawn_e2".to_owned(),
        from: "e2".to_owned(),
        to: "e4".to_owned(),
        side: Side::White,
        captured: None,
    });
    collect(&mut engine, "move-committed", &mut errors);

    engine.on_enter_tile("white_pawn_e2", "e4");
    collect(&mut engine, "enter-tile", &mut errors);

    engine.on_turn_start(Side::Black);
    collect(&mut engine, "turn-start(black)", &mut errors);

    let executed_actions = log.borrow().clone();
    let mut warnings = Vec::new();
    if !rule.logic.effects.is_empty() && executed_actions.is_empty() {
        warnings.push("no action executed despite declared effects".to_owned());
    }

    DryRunReport {
        success: errors.is_empty(),
        errors,
        executed_actions,
        warnings,
    }
}

fn collect(engine: &mut RuleEngine, scenario: &str, errors: &mut Vec<String>) {
    for failure in engine.drain_failures() {
        errors.push(format!(
            "{scenario}: effect '{}' action '{}': {}",
            failure.effect_id, failure.action, failure.message
        ));
    }
}

// -- Recording mocks ---------------------------------------------------------

struct MockBoard {
    log: ActionLog,
}

impl MockBoard {
    fn record(&self, method: &str) {
        self.log.borrow_mut().push(method.to_owned());
    }
}

impl BoardContract for MockBoard {
    fn tiles(&self) -> Vec<String> {
        ('a'..='h')
            .flat_map(|file| (1..=8).map(move |rank| format!("{file}{rank}")))
            .collect()
    }

    fn is_empty(&self, _tile: &str) -> bool {
        true
    }

    fn piece_at(&self, _tile: &str) -> Option<Piece> {
        None
    }

    fn piece(&self, id: &str) -> Result<Piece, ContractError> {
        Ok(Piece {
            id: id.to_owned(),
            kind: "pawn".to_owned(),
            side: Side::White,
            tile: "e4".to_owned(),
        })
    }

    fn set_piece_tile(&mut self, _id: &str, _tile: &str) -> Result<(), ContractError> {
        self.record("board.setPieceTile");
        Ok(())
    }

    fn remove_piece(&mut self, _id: &str) {
        self.record("board.removePiece");
    }

    fn capture_piece(&mut self, _id: &str, _reason: &str) -> Result<(), ContractError> {
        self.record("board.capturePiece");
        Ok(())
    }

    fn spawn_piece(
        &mut self,
        _kind: &str,
        _side: Side,
        _tile: &str,
    ) -> Result<String, ContractError> {
        self.record("board.spawnPiece");
        Ok("mock_piece".to_owned())
    }

    fn within_board(&self, _tile: &str) -> bool {
        true
    }

    fn neighbors(&self, _tile: &str, _radius: u32) -> Vec<String> {
        Vec::new()
    }
}

struct MockUi {
    log: ActionLog,
}

impl UiContract for MockUi {
    fn toast(&mut self, _message: &str) {
        self.log.borrow_mut().push("ui.toast".to_owned());
    }

    // registration happens at engine construction, not during dispatch, so
    // it is not an executed action
    fn register_action(&mut self, _spec: &UiAction) {}

    fn all_actions(&self) -> Vec<UiAction> {
        Vec::new()
    }

    fn clear_actions(&mut self) {}
}

struct MockVfx {
    log: ActionLog,
    decals: HashMap<String, String>,
}

impl MockVfx {
    fn record(&self, method: &str) {
        self.log.borrow_mut().push(method.to_owned());
    }
}

impl VfxContract for MockVfx {
    fn spawn_decal(&mut self, tile: &str, decal: &str) {
        self.decals.insert(tile.to_owned(), decal.to_owned());
        self.record("vfx.spawnDecal");
    }

    fn clear_decal(&mut self, tile: &str) {
        self.decals.remove(tile);
        self.record("vfx.clearDecal");
    }

    fn decal_at(&self, tile: &str) -> Option<String> {
        self.decals.get(tile).cloned()
    }

    fn play_animation(&mut self, _sprite_id: &str, _tile: Option<&str>) {
        self.record("vfx.playAnimation");
    }

    fn play_audio(&mut self, _audio_id: &str) {
        self.record("vfx.playAudio");
    }
}

struct MockMatch {
    log: ActionLog,
}

impl MatchContract for MockMatch {
    fn get(&self) -> MatchSnapshot {
        MatchSnapshot {
            ply: 1,
            turn_side: Side::White,
        }
    }

    fn set_turn(&mut self, _side: Side) {
        self.log.borrow_mut().push("match.setTurn".to_owned());
    }

    fn end_turn(&mut self) {
        self.log.borrow_mut().push("match.endTurn".to_owned());
    }
}
