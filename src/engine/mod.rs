//! Event-driven rule interpreter.
//!
//! The engine owns no state machine of its own: it is a synchronous
//! dispatcher driven by host-issued lifecycle and UI events. Effects run in
//! rule-registration order, then document order; failures are isolated per
//! effect so one broken rule never takes down the rest of the tick.

mod bus;
mod contracts;
mod cooldown;
mod state;

pub use bus::EventBus;
pub use contracts::{
    BoardContract, ContractError, Contracts, MatchContract, MatchSnapshot, Piece, UiContract,
    VfxContract,
};
pub use cooldown::CooldownTracker;
pub use state::StateStore;

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use serde_json::{json, Map, Value as Json};
use thiserror::Error;
use tracing::{debug, warn};

use crate::parse::parse_condition;
use crate::types::{
    events, Effect, EvalContext, Expr, MoveEvent, RuleDocument, Side, UiActionEvent, Verb,
};

/// Cap on queued cascade events (`status.*`) processed per dispatched host
/// event, so a status reaction that re-adds its own status cannot spin
/// forever.
const CASCADE_LIMIT: usize = 32;

/// A step failure recorded during dispatch. Routed to the operator log, not
/// to the in-game UI.
#[derive(Debug, Clone)]
pub struct DispatchFailure {
    pub rule_id: String,
    pub effect_id: String,
    pub action: String,
    pub message: String,
}

#[derive(Debug, Error)]
enum StepError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("unrecognized action verb '{0}'")]
    UnrecognizedVerb(String),

    #[error("missing or invalid parameter '{0}'")]
    BadParam(&'static str),
}

/// One effect flattened out of its rule, with pre-parsed conditions.
#[derive(Clone)]
struct EffectRuntime {
    rule_id: String,
    effect: Effect,
    /// `None` when a clause failed to parse; such an effect never fires.
    conditions: Option<Vec<Expr>>,
    /// Set for `ui.*` selectors; matched by suffix against the actionId.
    ui_selector: Option<String>,
}

/// The rule interpreter. Single-threaded and not reentrant: contract
/// callbacks must not re-enter the engine mid-dispatch.
pub struct RuleEngine {
    effects: Vec<EffectRuntime>,
    dispatch: HashMap<String, Vec<usize>>,
    ui_effects: Vec<usize>,
    contracts: Contracts,
    state: StateStore,
    cooldowns: CooldownTracker,
    failures: Vec<DispatchFailure>,
    pending: VecDeque<(String, Map<String, Json>)>,
}

impl RuleEngine {
    /// Build an engine over already-validated rule documents. UI actions
    /// declared by the rules are registered with the UI contract here.
    #[must_use]
    pub fn new(mut contracts: Contracts, rules: &[RuleDocument]) -> Self {
        let mut effects = Vec::new();
        let mut dispatch: HashMap<String, Vec<usize>> = HashMap::new();
        let mut ui_effects = Vec::new();

        for rule in rules {
            for effect in &rule.logic.effects {
                let idx = effects.len();
                let conditions = parse_conditions(&rule.meta.rule_id, effect);
                let ui_selector = effect.when.strip_prefix("ui.").map(str::to_owned);
                if ui_selector.is_some() {
                    ui_effects.push(idx);
                } else {
                    dispatch.entry(effect.when.clone()).or_default().push(idx);
                }
                effects.push(EffectRuntime {
                    rule_id: rule.meta.rule_id.clone(),
                    effect: effect.clone(),
                    conditions,
                    ui_selector,
                });
            }
            for action in &rule.ui.actions {
                contracts.ui.register_action(action);
            }
        }

        Self {
            effects,
            dispatch,
            ui_effects,
            contracts,
            state: StateStore::new(),
            cooldowns: CooldownTracker::new(),
            failures: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    // -- Host-facing lifecycle ----------------------------------------------

    pub fn on_turn_start(&mut self, side: Side) {
        let mut payload = Map::new();
        payload.insert("side".to_owned(), json!(side.as_str()));
        self.dispatch_event(events::TURN_START, payload);
    }

    /// Dispatch a committed move. One undo snapshot is pushed per committed
    /// move so [`RuleEngine::on_undo`] can restore rule state alongside the
    /// host's own board undo.
    pub fn on_move_committed(&mut self, mv: &MoveEvent) {
        self.state.push_undo();
        let payload = as_object(serde_json::to_value(mv).unwrap_or_default());
        self.dispatch_event(events::MOVE_COMMITTED, payload);
    }

    pub fn on_enter_tile(&mut self, piece_id: &str, tile: &str) {
        let mut payload = Map::new();
        payload.insert("pieceId".to_owned(), json!(piece_id));
        payload.insert("tile".to_owned(), json!(tile));
        self.dispatch_event(events::ENTER_TILE, payload);
    }

    pub fn on_undo(&mut self) {
        self.state.undo();
        self.dispatch_event(events::UNDO, Map::new());
    }

    pub fn on_promote(&mut self, piece_id: &str, from_type: &str, to_type: &str) {
        let mut payload = Map::new();
        payload.insert("pieceId".to_owned(), json!(piece_id));
        payload.insert("fromType".to_owned(), json!(from_type));
        payload.insert("toType".to_owned(), json!(to_type));
        self.dispatch_event(events::PROMOTE, payload);
    }

    /// Dispatch a UI special action. `ui.*` selectors match when the
    /// selector equals the actionId or is a suffix of it, so
    /// `ui.place_mine` also catches `special_place_mine`.
    pub fn on_ui_action(&mut self, event: &UiActionEvent) {
        let payload = as_object(serde_json::to_value(event).unwrap_or_default());
        let indices: Vec<usize> = self
            .ui_effects
            .iter()
            .copied()
            .filter(|&i| {
                self.effects[i].ui_selector.as_deref().is_some_and(|sel| {
                    event.action_id == sel || event.action_id.ends_with(sel)
                })
            })
            .collect();
        debug!(action = %event.action_id, candidates = indices.len(), "ui dispatch");
        self.run_effects(&indices, &payload);
        self.drain_pending();
    }

    /// Tick every cooldown entry. The host calls this exactly once per turn
    /// boundary; the engine never ticks on its own.
    pub fn tick_cooldowns(&mut self) {
        self.cooldowns.tick_all();
    }

    /// Clear rule state and cooldowns on new-game start.
    pub fn reset_for_new_game(&mut self) {
        self.state.reset();
        self.cooldowns.reset();
        self.failures.clear();
        self.pending.clear();
    }

    /// Take the failures recorded since the last drain.
    pub fn drain_failures(&mut self) -> Vec<DispatchFailure> {
        std::mem::take(&mut self.failures)
    }

    #[must_use]
    pub fn state(&self) -> &StateStore {
        &self.state
    }

    #[must_use]
    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    // -- Dispatch core ------------------------------------------------------

    fn dispatch_event(&mut self, name: &str, payload: Map<String, Json>) {
        let indices = self.dispatch.get(name).cloned().unwrap_or_default();
        debug!(event = name, candidates = indices.len(), "dispatch");
        self.run_effects(&indices, &payload);
        self.drain_pending();
    }

    fn drain_pending(&mut self) {
        let mut processed = 0;
        while let Some((name, payload)) = self.pending.pop_front() {
            if processed >= CASCADE_LIMIT {
                warn!(event = %name, "cascade limit reached, dropping queued event");
                self.pending.clear();
                return;
            }
            processed += 1;
            let indices = self.dispatch.get(&name).cloned().unwrap_or_default();
            self.run_effects(&indices, &payload);
        }
    }

    fn run_effects(&mut self, indices: &[usize], payload: &Map<String, Json>) {
        let mut end_turn = false;
        for &i in indices {
            let runtime = self.effects[i].clone();
            let effect = &runtime.effect;

            if effect.cooldown.is_some() {
                let actor = actor_id(payload);
                // not ready is expected steady-state, skip silently
                if !self.cooldowns.is_ready(&actor, &effect.id) {
                    continue;
                }
            }

            if !self.conditions_hold(&runtime, payload) {
                continue;
            }

            let mut failed = false;
            for step in effect.steps.as_slice() {
                if let Err(err) = self.exec_step(&step.action, step.params.as_ref(), payload) {
                    self.record_failure(&runtime, &step.action, &err);
                    failed = true;
                    break;
                }
            }

            if failed {
                if let Some(on_fail) = &effect.on_fail {
                    for step in on_fail.as_slice() {
                        if let Err(err) =
                            self.exec_step(&step.action, step.params.as_ref(), payload)
                        {
                            self.record_failure(&runtime, &step.action, &err);
                            break;
                        }
                    }
                }
                continue;
            }

            if let Some(cooldown) = &effect.cooldown {
                self.cooldowns
                    .set(&actor_id(payload), &effect.id, cooldown.turns);
            }
            if effect.consumes_turn {
                end_turn = true;
            }
        }
        // deferred so every effect for this event observes consistent turn
        // state
        if end_turn {
            self.contracts.game.end_turn();
        }
    }

    fn conditions_hold(&self, runtime: &EffectRuntime, payload: &Map<String, Json>) -> bool {
        let Some(exprs) = &runtime.conditions else {
            return false;
        };
        if exprs.is_empty() {
            return true;
        }
        let snapshot = self.contracts.game.get();
        let ctx = EvalContext::new(payload)
            .with_state(self.state.namespaces())
            .with_match(snapshot.ply, snapshot.turn_side);
        exprs.iter().all(|expr| expr.eval(&ctx))
    }

    fn record_failure(&mut self, runtime: &EffectRuntime, action: &str, err: &StepError) {
        warn!(
            rule = %runtime.rule_id,
            effect = %runtime.effect.id,
            action,
            error = %err,
            "effect step failed"
        );
        self.failures.push(DispatchFailure {
            rule_id: runtime.rule_id.clone(),
            effect_id: runtime.effect.id.clone(),
            action: action.to_owned(),
            message: err.to_string(),
        });
    }

    fn exec_step(
        &mut self,
        action: &str,
        params: Option<&Json>,
        payload: &Map<String, Json>,
    ) -> Result<(), StepError> {
        let params = Params::new(params, payload);
        match Verb::parse(action) {
            Verb::BoardCapture => {
                let piece_id = params.str_required("pieceId")?;
                let reason = params
                    .str_optional("reason")
                    .unwrap_or_else(|| "captured".to_owned());
                self.contracts.board.capture_piece(&piece_id, &reason)?;
            }
            Verb::PieceSpawn => {
                let kind = params.str_required("type")?;
                let side = params
                    .str_required("side")
                    .ok()
                    .and_then(|s| Side::parse(&s))
                    .ok_or(StepError::BadParam("side"))?;
                let tile = params.str_required("tile")?;
                self.contracts.board.spawn_piece(&kind, side, &tile)?;
            }
            Verb::PieceTeleport => {
                let piece_id = params.str_required("pieceId")?;
                let tile = params.str_required("tile")?;
                self.contracts.board.set_piece_tile(&piece_id, &tile)?;
            }
            Verb::PieceRemove => {
                let piece_id = params.str_required("pieceId")?;
                self.contracts.board.remove_piece(&piece_id);
            }
            Verb::StatusAdd => {
                let status = params.str_required("status")?;
                let key = status_key(&params, payload, &status);
                self.state.set_path("statuses", &key, json!(true));
                // reactions run after the current pass completes
                let mut cascade = payload.clone();
                cascade.insert("status".to_owned(), json!(status));
                self.pending.push_back((format!("status.{status}"), cascade));
            }
            Verb::StatusRemove => {
                let status = params.str_required("status")?;
                let key = status_key(&params, payload, &status);
                self.state.remove_path("statuses", &key);
            }
            Verb::CooldownSet => {
                let actor = params
                    .str_optional("actorId")
                    .unwrap_or_else(|| actor_id(payload));
                let action_id = params.str_required("actionId")?;
                let turns = params.u32_required("turns")?;
                self.cooldowns.set(&actor, &action_id, turns);
            }
            Verb::TurnEnd => self.contracts.game.end_turn(),
            Verb::TurnSet => {
                let side = params
                    .str_required("side")
                    .ok()
                    .and_then(|s| Side::parse(&s))
                    .ok_or(StepError::BadParam("side"))?;
                self.contracts.game.set_turn(side);
            }
            Verb::StateSet => {
                let namespace = params.str_required("namespace")?;
                let key = params.str_required("key")?;
                let value = params.json_required("value")?;
                self.state.set_path(&namespace, &key, value);
            }
            Verb::StateRemove => {
                let namespace = params.str_required("namespace")?;
                let key = params.str_required("key")?;
                self.state.remove_path(&namespace, &key);
            }
            Verb::VfxPlay => {
                let sprite = params.str_required("sprite")?;
                let tile = params.str_optional("tile");
                self.contracts.vfx.play_animation(&sprite, tile.as_deref());
            }
            Verb::VfxDecal => {
                let tile = params.str_required("tile")?;
                let decal = params.str_required("decal")?;
                self.contracts.vfx.spawn_decal(&tile, &decal);
            }
            Verb::VfxClear => {
                let tile = params.str_required("tile")?;
                self.contracts.vfx.clear_decal(&tile);
            }
            Verb::AudioPlay => {
                let sound = params.str_required("sound")?;
                self.contracts.vfx.play_audio(&sound);
            }
            Verb::UiToast => {
                let message = params.str_required("message")?;
                self.contracts.ui.toast(&message);
            }
            Verb::Unrecognized(verb) => return Err(StepError::UnrecognizedVerb(verb)),
        }
        Ok(())
    }
}

/// Subscribe a shared engine to the host event bus's `ui.runAction` channel.
pub fn attach_ui_bus(engine: Rc<RefCell<RuleEngine>>, bus: &mut EventBus) {
    bus.on("ui.runAction", move |payload| {
        let event: UiActionEvent = serde_json::from_value(payload.clone())?;
        engine.borrow_mut().on_ui_action(&event);
        Ok(())
    });
}

/// The acting entity for cooldown purposes: the payload's piece, else its
/// side, else a global bucket.
fn actor_id(payload: &Map<String, Json>) -> String {
    payload
        .get("pieceId")
        .and_then(Json::as_str)
        .or_else(|| payload.get("side").and_then(Json::as_str))
        .unwrap_or("global")
        .to_owned()
}

fn status_key(params: &Params<'_>, payload: &Map<String, Json>, status: &str) -> String {
    let target = params
        .str_optional("pieceId")
        .or_else(|| {
            payload
                .get("pieceId")
                .and_then(Json::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| "global".to_owned());
    format!("{target}:{status}")
}

fn as_object(value: Json) -> Map<String, Json> {
    match value {
        Json::Object(map) => map,
        _ => Map::new(),
    }
}

fn parse_conditions(rule_id: &str, effect: &Effect) -> Option<Vec<Expr>> {
    let Some(condition) = &effect.condition else {
        return Some(Vec::new());
    };
    let mut exprs = Vec::new();
    for clause in condition.clauses() {
        match parse_condition(clause) {
            Ok(expr) => exprs.push(expr),
            Err(err) => {
                warn!(rule = rule_id, effect = %effect.id, error = %err, "condition disabled");
                return None;
            }
        }
    }
    Some(exprs)
}

/// Step parameters with `$name` payload substitution: a string parameter
/// `"$tile"` resolves to the payload's `tile` field.
struct Params<'a> {
    map: Option<&'a Map<String, Json>>,
    payload: &'a Map<String, Json>,
}

impl<'a> Params<'a> {
    fn new(params: Option<&'a Json>, payload: &'a Map<String, Json>) -> Self {
        Self {
            map: params.and_then(Json::as_object),
            payload,
        }
    }

    fn raw(&self, key: &str) -> Option<&'a Json> {
        self.map?.get(key)
    }

    fn str_optional(&self, key: &str) -> Option<String> {
        match self.raw(key)? {
            Json::String(s) => match s.strip_prefix('$') {
                Some(name) => match self.payload.get(name)? {
                    Json::String(v) => Some(v.clone()),
                    Json::Number(n) => Some(n.to_string()),
                    Json::Bool(b) => Some(b.to_string()),
                    _ => None,
                },
                None => Some(s.clone()),
            },
            _ => None,
        }
    }

    fn str_required(&self, key: &'static str) -> Result<String, StepError> {
        self.str_optional(key).ok_or(StepError::BadParam(key))
    }

    fn u32_required(&self, key: &'static str) -> Result<u32, StepError> {
        self.raw(key)
            .and_then(Json::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or(StepError::BadParam(key))
    }

    /// A parameter value with `$name` strings substituted recursively from
    /// the payload (substituted fields keep their payload JSON type).
    fn json_required(&self, key: &'static str) -> Result<Json, StepError> {
        let raw = self.raw(key).ok_or(StepError::BadParam(key))?;
        Ok(self.substitute(raw))
    }

    fn substitute(&self, value: &Json) -> Json {
        match value {
            Json::String(s) => match s.strip_prefix('$') {
                Some(name) => self.payload.get(name).cloned().unwrap_or(Json::Null),
                None => value.clone(),
            },
            Json::Object(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.substitute(v)))
                    .collect(),
            ),
            Json::Array(items) => Json::Array(items.iter().map(|v| self.substitute(v)).collect()),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn actor_id_prefers_piece_then_side() {
        let both = as_object(json!({"pieceId": "p1", "side": "white"}));
        assert_eq!(actor_id(&both), "p1");
        let side_only = as_object(json!({"side": "white"}));
        assert_eq!(actor_id(&side_only), "white");
        assert_eq!(actor_id(&Map::new()), "global");
    }

    #[test]
    fn params_substitute_from_payload() {
        let payload = as_object(json!({"tile": "e4", "ply": 7}));
        let raw = json!({"key": "$tile", "literal": "d5", "nested": {"at": "$tile", "n": "$ply"}});
        let params = Params::new(Some(&raw), &payload);

        assert_eq!(params.str_optional("key").as_deref(), Some("e4"));
        assert_eq!(params.str_optional("literal").as_deref(), Some("d5"));
        assert_eq!(
            params.json_required("nested").unwrap(),
            json!({"at": "e4", "n": 7})
        );
    }

    #[test]
    fn params_missing_substitution_fails_required() {
        let payload = Map::new();
        let raw = json!({"key": "$tile"});
        let params = Params::new(Some(&raw), &payload);
        assert!(params.str_required("key").is_err());
    }

    #[test]
    fn unparsable_condition_disables_effect() {
        let effect: Effect = serde_json::from_value(json!({
            "id": "broken",
            "when": "lifecycle.onTurnStart",
            "if": "tile == ",
            "do": {"action": "ui.toast", "params": {"message": "hi"}}
        }))
        .unwrap();
        assert!(parse_conditions("r", &effect).is_none());
    }
}
