use serde_json::{Map, Value as Json};

use super::event::Side;
use super::Value;

/// Read-only evaluation context for condition expressions.
///
/// Resolution order for a dotted path:
/// - a leading `state.` segment resolves into the engine's namespaced state
///   store (e.g. `state.mines.e4.armed`),
/// - a leading `match.` segment resolves `match.ply` and `match.turnSide`,
/// - anything else resolves into the current event payload.
///
/// Path segments of the form `$name` are substituted with the payload field
/// `name` (stringified) before lookup, so `state.mines.$tile.armed` follows
/// the tile carried by the event.
#[derive(Debug, Clone)]
pub struct EvalContext<'a> {
    payload: &'a Map<String, Json>,
    state: Option<&'a Map<String, Json>>,
    ply: Option<u32>,
    turn_side: Option<Side>,
}

impl<'a> EvalContext<'a> {
    #[must_use]
    pub fn new(payload: &'a Map<String, Json>) -> Self {
        Self {
            payload,
            state: None,
            ply: None,
            turn_side: None,
        }
    }

    /// Expose the state store's namespace map under the `state.` prefix.
    #[must_use]
    pub fn with_state(mut self, namespaces: &'a Map<String, Json>) -> Self {
        self.state = Some(namespaces);
        self
    }

    /// Expose `match.ply` and `match.turnSide`.
    #[must_use]
    pub fn with_match(mut self, ply: u32, turn_side: Side) -> Self {
        self.ply = Some(ply);
        self.turn_side = Some(turn_side);
        self
    }

    /// Resolve a dotted path to a value. Absent paths, paths pointing at
    /// objects, and failed `$` substitutions all yield `None`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Value> {
        let mut segments = Vec::new();
        for raw in path.split('.') {
            if let Some(name) = raw.strip_prefix('$') {
                segments.push(self.substitute(name)?);
            } else {
                segments.push(raw.to_owned());
            }
        }
        match segments.first().map(String::as_str) {
            Some("state") => walk(self.state?, &segments[1..]),
            Some("match") => self.match_field(segments.get(1)?.as_str()),
            Some(_) => walk(self.payload, &segments),
            None => None,
        }
    }

    fn match_field(&self, name: &str) -> Option<Value> {
        match name {
            "ply" => self.ply.map(|p| Value::Int(i64::from(p))),
            "turnSide" => self
                .turn_side
                .map(|side| Value::String(side.as_str().to_owned())),
            _ => None,
        }
    }

    fn substitute(&self, name: &str) -> Option<String> {
        match self.payload.get(name)? {
            Json::String(s) => Some(s.clone()),
            Json::Number(n) => Some(n.to_string()),
            Json::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

fn walk(map: &Map<String, Json>, segments: &[String]) -> Option<Value> {
    let (first, rest) = segments.split_first()?;
    let entry = map.get(first)?;
    if rest.is_empty() {
        Value::from_json(entry)
    } else {
        walk(entry.as_object()?, rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Json) -> Map<String, Json> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn payload_lookup_nested() {
        let payload = obj(json!({"move": {"from": "e2", "to": "e4"}}));
        let ctx = EvalContext::new(&payload);
        assert_eq!(ctx.get("move.to"), Some(Value::String("e4".into())));
        assert_eq!(ctx.get("move.missing"), None);
        assert_eq!(ctx.get("move"), None);
    }

    #[test]
    fn state_lookup() {
        let payload = obj(json!({"tile": "e4"}));
        let state = obj(json!({"mines": {"e4": {"armed": true, "owner": "white"}}}));
        let ctx = EvalContext::new(&payload).with_state(&state);
        assert_eq!(ctx.get("state.mines.e4.armed"), Some(Value::Bool(true)));
        assert_eq!(ctx.get("state.mines.d4.armed"), None);
    }

    #[test]
    fn state_absent_without_store() {
        let payload = obj(json!({}));
        let ctx = EvalContext::new(&payload);
        assert_eq!(ctx.get("state.anything"), None);
    }

    #[test]
    fn dollar_substitution_from_payload() {
        let payload = obj(json!({"tile": "e4"}));
        let state = obj(json!({"mines": {"e4": {"armed": true}}}));
        let ctx = EvalContext::new(&payload).with_state(&state);
        assert_eq!(ctx.get("state.mines.$tile.armed"), Some(Value::Bool(true)));
    }

    #[test]
    fn dollar_substitution_missing_field() {
        let payload = obj(json!({}));
        let state = obj(json!({"mines": {}}));
        let ctx = EvalContext::new(&payload).with_state(&state);
        assert_eq!(ctx.get("state.mines.$tile.armed"), None);
    }

    #[test]
    fn match_fields() {
        let payload = obj(json!({}));
        let ctx = EvalContext::new(&payload).with_match(12, Side::Black);
        assert_eq!(ctx.get("match.ply"), Some(Value::Int(12)));
        assert_eq!(ctx.get("match.turnSide"), Some(Value::String("black".into())));
        assert_eq!(ctx.get("match.unknown"), None);
    }
}
