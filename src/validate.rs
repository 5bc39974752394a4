use serde_json::Value as Json;

use crate::error::GambitError;
use crate::parse::parse_condition;
use crate::types::{RuleDocument, Verb};

/// Outcome of validating one candidate rule document.
///
/// `errors` are fatal: a document with any error must not be activated.
/// `warnings` are advisory and never flip `valid` to false.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Validate a candidate rule document. Layer 1 checks the structural schema;
/// layer 2 (run only when layer 1 passes) checks semantics: unknown action
/// verbs, unparsable conditions, and dangling UI-action references. Pure —
/// no mutation, safe to call repeatedly.
#[must_use]
pub fn validate(doc: &Json) -> ValidationReport {
    let mut report = ValidationReport::default();
    structural(doc, &mut report.errors);
    if report.errors.is_empty() {
        semantic(doc, &mut report.warnings);
        report.valid = true;
    }
    report
}

/// Parse a JSON string and gate it through [`validate`], returning the typed
/// document only when it is structurally valid.
///
/// # Errors
///
/// [`GambitError::Json`] on malformed JSON, [`GambitError::Validation`] when
/// the document fails schema validation.
pub fn parse_and_validate(text: &str) -> Result<RuleDocument, GambitError> {
    let value: Json = serde_json::from_str(text)?;
    let report = validate(&value);
    if !report.valid {
        return Err(GambitError::Validation {
            errors: report.errors,
        });
    }
    Ok(serde_json::from_value(value)?)
}

// -- Layer 1: structural schema ---------------------------------------------

fn structural(doc: &Json, errors: &mut Vec<String>) {
    let Some(root) = doc.as_object() else {
        errors.push("document: not a JSON object".to_owned());
        return;
    };

    match root.get("meta").and_then(Json::as_object) {
        None => errors.push("meta: missing or not an object".to_owned()),
        Some(meta) => {
            match meta.get("ruleId").and_then(Json::as_str) {
                None => errors.push("meta.ruleId: missing or not a string".to_owned()),
                Some(id) if !is_rule_id(id) => errors.push(format!(
                    "meta.ruleId: '{id}' must match [a-z0-9_-]{{3,50}}"
                )),
                Some(_) => {}
            }
            match meta.get("version").and_then(Json::as_str) {
                None => errors.push("meta.version: missing or not a string".to_owned()),
                Some(v) if !is_semver(v) => {
                    errors.push(format!("meta.version: '{v}' is not a semver string"));
                }
                Some(_) => {}
            }
        }
    }

    match root
        .get("scope")
        .and_then(|s| s.get("affectedPieces"))
        .and_then(Json::as_array)
    {
        None => errors.push("scope.affectedPieces: missing or not an array".to_owned()),
        Some(pieces) => {
            if pieces.is_empty() {
                errors.push("scope.affectedPieces: must not be empty".to_owned());
            }
            for (i, piece) in pieces.iter().enumerate() {
                match piece.as_str() {
                    Some(p) if !p.is_empty() => {}
                    _ => errors.push(format!(
                        "scope.affectedPieces[{i}]: must be a non-empty string"
                    )),
                }
            }
        }
    }

    match root
        .get("logic")
        .and_then(|l| l.get("effects"))
        .and_then(Json::as_array)
    {
        None => errors.push("logic.effects: missing or not an array".to_owned()),
        Some(effects) => {
            if effects.is_empty() {
                errors.push("logic.effects: must not be empty".to_owned());
            }
            for (i, effect) in effects.iter().enumerate() {
                structural_effect(effect, &format!("logic.effects[{i}]"), errors);
            }
        }
    }

    if let Some(ui) = root.get("ui") {
        match ui.get("actions").and_then(Json::as_array) {
            None => errors.push("ui.actions: missing or not an array".to_owned()),
            Some(actions) => {
                for (i, action) in actions.iter().enumerate() {
                    match action.get("id").and_then(Json::as_str) {
                        None => errors.push(format!("ui.actions[{i}].id: missing or not a string")),
                        Some(id) if !id.starts_with("special_") => errors.push(format!(
                            "ui.actions[{i}].id: '{id}' must start with 'special_'"
                        )),
                        Some(_) => {}
                    }
                }
            }
        }
    }
}

fn structural_effect(effect: &Json, path: &str, errors: &mut Vec<String>) {
    let Some(obj) = effect.as_object() else {
        errors.push(format!("{path}: not an object"));
        return;
    };

    match obj.get("id").and_then(Json::as_str) {
        Some(id) if !id.is_empty() => {}
        _ => errors.push(format!("{path}.id: missing or empty")),
    }

    match obj.get("when").and_then(Json::as_str) {
        None => errors.push(format!("{path}.when: missing or not a string")),
        Some(when)
            if !(when.starts_with("ui.")
                || when.starts_with("lifecycle.")
                || when.starts_with("status.")) =>
        {
            errors.push(format!(
                "{path}.when: '{when}' must start with ui., lifecycle. or status."
            ));
        }
        Some(_) => {}
    }

    if let Some(cond) = obj.get("if") {
        let ok = match cond {
            Json::String(_) => true,
            Json::Array(items) => items.iter().all(Json::is_string),
            _ => false,
        };
        if !ok {
            errors.push(format!("{path}.if: must be a string or array of strings"));
        }
    }

    match obj.get("do") {
        None => errors.push(format!("{path}.do: missing")),
        Some(steps) => structural_steps(steps, &format!("{path}.do"), errors),
    }
    if let Some(steps) = obj.get("onFail") {
        structural_steps(steps, &format!("{path}.onFail"), errors);
    }

    if let Some(consumes) = obj.get("consumesTurn") {
        if !consumes.is_boolean() {
            errors.push(format!("{path}.consumesTurn: must be a boolean"));
        }
    }

    if let Some(cooldown) = obj.get("cooldown") {
        match cooldown.get("turns").and_then(Json::as_u64) {
            Some(turns) if turns >= 1 => {}
            _ => errors.push(format!("{path}.cooldown.turns: must be an integer >= 1")),
        }
    }
}

fn structural_steps(steps: &Json, path: &str, errors: &mut Vec<String>) {
    match steps {
        Json::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                structural_step(item, &format!("{path}[{i}]"), errors);
            }
        }
        single => structural_step(single, path, errors),
    }
}

fn structural_step(step: &Json, path: &str, errors: &mut Vec<String>) {
    let Some(obj) = step.as_object() else {
        errors.push(format!("{path}: not an object"));
        return;
    };
    match obj.get("action").and_then(Json::as_str) {
        None => errors.push(format!("{path}.action: missing or not a string")),
        Some(action) if !Verb::has_shape(action) => {
            errors.push(format!(
                "{path}.action: '{action}' does not match namespace.verb"
            ));
        }
        Some(_) => {}
    }
    if let Some(params) = obj.get("params") {
        if !params.is_object() {
            errors.push(format!("{path}.params: must be an object"));
        }
    }
}

fn is_rule_id(id: &str) -> bool {
    (3..=50).contains(&id.len())
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

fn is_semver(version: &str) -> bool {
    let mut parts = version.split('.');
    let ok = parts
        .by_ref()
        .take(3)
        .filter(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
        .count()
        == 3;
    ok && parts.next().is_none()
}

// -- Layer 2: semantics ------------------------------------------------------

fn semantic(doc: &Json, warnings: &mut Vec<String>) {
    let effects = doc["logic"]["effects"].as_array().cloned().unwrap_or_default();
    let ui_action_ids: Vec<String> = doc["ui"]["actions"]
        .as_array()
        .map(|actions| {
            actions
                .iter()
                .filter_map(|a| a.get("id").and_then(Json::as_str))
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    let mut seen_ids: Vec<&str> = Vec::new();
    for effect in &effects {
        let id = effect["id"].as_str().unwrap_or_default();
        if seen_ids.contains(&id) {
            warnings.push(format!("effect '{id}': duplicate effect id"));
        } else {
            seen_ids.push(id);
        }

        for key in ["do", "onFail"] {
            if let Some(steps) = effect.get(key) {
                for action in step_actions(steps) {
                    if !Verb::parse(&action).is_known() {
                        warnings.push(format!("effect '{id}': unknown action verb '{action}'"));
                    }
                }
            }
        }

        for clause in condition_clauses(effect.get("if")) {
            if let Err(err) = parse_condition(&clause) {
                warnings.push(format!("effect '{id}': {err}"));
            }
        }

        // Dangling UI references are only meaningful when the document
        // declares UI actions at all.
        if !ui_action_ids.is_empty() {
            if let Some(when) = effect["when"].as_str() {
                if let Some(action_id) = when.strip_prefix("ui.") {
                    let bound = ui_action_ids
                        .iter()
                        .any(|declared| declared == action_id || declared.ends_with(action_id));
                    if !bound {
                        warnings.push(format!(
                            "effect '{id}': when '{when}' references no declared UI action"
                        ));
                    }
                }
            }
        }
    }
}

fn step_actions(steps: &Json) -> Vec<String> {
    let collect = |step: &Json| {
        step.get("action")
            .and_then(Json::as_str)
            .map(str::to_owned)
    };
    match steps {
        Json::Array(items) => items.iter().filter_map(collect).collect(),
        single => collect(single).into_iter().collect(),
    }
}

fn condition_clauses(cond: Option<&Json>) -> Vec<String> {
    match cond {
        Some(Json::String(s)) => vec![s.clone()],
        Some(Json::Array(items)) => items
            .iter()
            .filter_map(Json::as_str)
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_doc() -> Json {
        json!({
            "meta": {"ruleId": "pawn_mines", "version": "1.0.0"},
            "scope": {"affectedPieces": ["pawn"]},
            "logic": {"effects": [
                {"id": "boom", "when": "lifecycle.onEnterTile",
                 "do": {"action": "board.capture", "params": {"pieceId": "$pieceId"}}}
            ]},
            "ui": {"actions": []},
            "assets": {"vfx": [], "sfx": []}
        })
    }

    #[test]
    fn minimal_document_is_valid() {
        let report = validate(&minimal_doc());
        assert!(report.valid, "errors: {:?}", report.errors);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn empty_effects_is_rejected() {
        let mut doc = minimal_doc();
        doc["logic"]["effects"] = json!([]);
        let report = validate(&doc);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("logic.effects")));
    }

    #[test]
    fn unknown_verb_warns_but_validates() {
        let mut doc = minimal_doc();
        doc["logic"]["effects"][0]["do"] = json!({"action": "unknown.verb"});
        let report = validate(&doc);
        assert!(report.valid);
        assert!(report.warnings.iter().any(|w| w.contains("unknown.verb")));
        assert!(report.warnings.iter().any(|w| w.contains("'boom'")));
    }

    #[test]
    fn bad_rule_id_is_rejected_with_path_prefix() {
        let mut doc = minimal_doc();
        doc["meta"]["ruleId"] = json!("X!");
        let report = validate(&doc);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.starts_with("meta.ruleId")));
    }

    #[test]
    fn bad_version_is_rejected() {
        let mut doc = minimal_doc();
        doc["meta"]["version"] = json!("one.two");
        assert!(!validate(&doc).valid);
    }

    #[test]
    fn empty_pieces_is_rejected() {
        let mut doc = minimal_doc();
        doc["scope"]["affectedPieces"] = json!([]);
        let report = validate(&doc);
        assert!(!report.valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.starts_with("scope.affectedPieces")));
    }

    #[test]
    fn bad_when_prefix_is_rejected() {
        let mut doc = minimal_doc();
        doc["logic"]["effects"][0]["when"] = json!("onEnterTile");
        let report = validate(&doc);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains(".when")));
    }

    #[test]
    fn ui_action_id_must_be_special() {
        let mut doc = minimal_doc();
        doc["ui"]["actions"] = json!([{"id": "place_mine"}]);
        let report = validate(&doc);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("special_")));
    }

    #[test]
    fn zero_turn_cooldown_is_rejected() {
        let mut doc = minimal_doc();
        doc["logic"]["effects"][0]["cooldown"] = json!({"turns": 0});
        assert!(!validate(&doc).valid);
    }

    #[test]
    fn semantic_layer_skipped_when_structure_fails() {
        let mut doc = minimal_doc();
        doc["logic"]["effects"][0]["do"] = json!({"action": "unknown.verb"});
        doc["meta"]["version"] = json!(7);
        let report = validate(&doc);
        assert!(!report.valid);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn unparsable_condition_warns() {
        let mut doc = minimal_doc();
        doc["logic"]["effects"][0]["if"] = json!("tile == ");
        let report = validate(&doc);
        assert!(report.valid);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("condition parse error")));
    }

    #[test]
    fn condition_array_is_accepted() {
        let mut doc = minimal_doc();
        doc["logic"]["effects"][0]["if"] = json!(["a == 1", "b == 2"]);
        assert!(validate(&doc).valid);
    }

    #[test]
    fn dangling_ui_reference_warns() {
        let mut doc = minimal_doc();
        doc["ui"]["actions"] = json!([{"id": "special_place_mine"}]);
        doc["logic"]["effects"][0]["when"] = json!("ui.special_teleport");
        let report = validate(&doc);
        assert!(report.valid);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("no declared UI action")));
    }

    #[test]
    fn ui_suffix_reference_is_not_dangling() {
        let mut doc = minimal_doc();
        doc["ui"]["actions"] = json!([{"id": "special_place_mine"}]);
        doc["logic"]["effects"][0]["when"] = json!("ui.place_mine");
        let report = validate(&doc);
        assert!(report.valid);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn parse_and_validate_gates_bad_documents() {
        let err = parse_and_validate("{\"meta\": {}}").unwrap_err();
        assert!(matches!(err, GambitError::Validation { .. }));

        let doc = parse_and_validate(&minimal_doc().to_string()).unwrap();
        assert_eq!(doc.meta.rule_id, "pawn_mines");
    }
}
