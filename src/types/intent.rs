use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// The compiled, normalized rule intent. Produced by
/// [`compile`](crate::compile); `affected_pieces` and `mechanics` are never
/// empty (the compiler substitutes defaults and warns instead of failing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalIntent {
    pub rule_name: String,
    pub template_id: String,
    pub category: String,
    pub affected_pieces: Vec<String>,
    pub mechanics: Vec<String>,
    pub hazards: Vec<String>,
    pub statuses: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targeting: Option<Targeting>,
    pub limits: Limits,
    pub requirements: Vec<String>,
    pub text_hints: Vec<String>,
    pub notes: Vec<String>,
    pub vfx: Vec<String>,
    pub sfx: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Targeting {
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Json>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_per_piece: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charges_per_match: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub once_per_match: bool,
}

/// A non-fatal compiler diagnostic with a stable code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerWarning {
    pub code: String,
    pub message: String,
}

impl CompilerWarning {
    pub(crate) fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_owned(),
            message: message.into(),
        }
    }
}

/// A test expectation accumulated from `EXPECT_*` commands, consumed by the
/// dry-run harness or an external test generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestExpectation {
    Action {
        event: String,
        action: String,
    },
    Move {
        piece: String,
        from: String,
        to: String,
        legal: bool,
    },
}

/// Per-piece movement deltas for the external move-legality engine.
/// These never reach the effect interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementOverride {
    pub piece: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// Everything compilation produces. The compiler never fails; problems show
/// up as warnings on an otherwise usable intent.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    pub intent: CanonicalIntent,
    pub warnings: Vec<CompilerWarning>,
    pub tests: Vec<TestExpectation>,
    pub movement_overrides: Vec<MovementOverride>,
}

impl CompileOutput {
    /// Whether a warning with the given code was emitted.
    #[must_use]
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}
