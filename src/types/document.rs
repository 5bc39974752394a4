use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::GambitError;

/// The canonical, persisted representation of one custom rule (RuleJSON).
///
/// This is the on-disk/on-wire format; `meta.version` carries a semver
/// string so documents stay schema-compatible across engine versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDocument {
    pub meta: Meta,
    pub scope: Scope,
    pub logic: Logic,
    #[serde(default, skip_serializing_if = "Ui::is_empty")]
    pub ui: Ui,
    #[serde(default, skip_serializing_if = "Assets::is_empty")]
    pub assets: Assets,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Json>,
}

impl RuleDocument {
    /// Deserialize a rule document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`GambitError::Json`] if the text is not a structurally
    /// compatible document. Use [`crate::validate`] for the full schema and
    /// semantic report.
    pub fn from_json_str(json: &str) -> Result<Self, GambitError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a rule document from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`GambitError::Io`] if the file cannot be read and
    /// [`GambitError::Json`] if its contents are not a compatible document.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, GambitError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize this document to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GambitError::Json`] if encoding fails.
    pub fn to_json_string(&self) -> Result<String, GambitError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub rule_id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub affected_pieces: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logic {
    pub effects: Vec<Effect>,
}

/// One `when`/`if`/`do` binding inside a rule's effect list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    pub id: String,
    pub when: String,
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(rename = "do")]
    pub steps: Steps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_fail: Option<Steps>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub consumes_turn: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<CooldownSpec>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// An `if` clause: one boolean-expression string, or an array of strings
/// that must all hold (conjunction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    One(String),
    All(Vec<String>),
}

impl Condition {
    /// The clauses as a flat slice, singleton or array alike.
    #[must_use]
    pub fn clauses(&self) -> &[String] {
        match self {
            Condition::One(clause) => std::slice::from_ref(clause),
            Condition::All(clauses) => clauses,
        }
    }
}

/// A `do`/`onFail` body: one action step or an ordered array of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Steps {
    One(ActionStep),
    Many(Vec<ActionStep>),
}

impl Steps {
    #[must_use]
    pub fn as_slice(&self) -> &[ActionStep] {
        match self {
            Steps::One(step) => std::slice::from_ref(step),
            Steps::Many(steps) => steps,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

/// One `namespace.verb` instruction with parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStep {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Json>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ui {
    #[serde(default)]
    pub actions: Vec<UiAction>,
}

impl Ui {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// A special action surfaced in the host UI. Ids are `special_`-prefixed by
/// contract so hosts can route them back as `ui.*` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiAction {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Assets {
    #[serde(default)]
    pub vfx: Vec<String>,
    #[serde(default)]
    pub sfx: Vec<String>,
}

impl Assets {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vfx.is_empty() && self.sfx.is_empty()
    }
}

/// Per-effect cooldown: turns to wait before the same actor may fire the
/// effect again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooldownSpec {
    pub turns: u32,
}
