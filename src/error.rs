use thiserror::Error;

use crate::parse::ParseError;

/// Top-level error type for document loading and validation.
#[derive(Debug, Error)]
pub enum GambitError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("malformed rule document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A document was structurally well-formed JSON but failed validation.
    #[error("rule document rejected: {}", .errors.join("; "))]
    Validation { errors: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_failure() {
        let err = GambitError::Validation {
            errors: vec!["meta.ruleId: missing".into(), "logic.effects: empty".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("meta.ruleId"));
        assert!(msg.contains("logic.effects"));
    }

    #[test]
    fn json_error_converts() {
        let bad: Result<crate::RuleDocument, _> = serde_json::from_str("{");
        let err: GambitError = bad.unwrap_err().into();
        assert!(matches!(err, GambitError::Json(_)));
    }
}
