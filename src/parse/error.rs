use std::fmt;

/// Error produced by the condition grammar: what the parser expected and
/// the byte offset into the input where it gave up.
#[derive(Debug)]
pub struct ParseError {
    message: String,
    offset: usize,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }

    /// Byte offset into the condition string where parsing stopped.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "condition parse error at offset {}: {}",
            self.offset, self.message
        )
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ParseError::new("unexpected token", 7);
        assert_eq!(
            err.to_string(),
            "condition parse error at offset 7: unexpected token"
        );
    }

    #[test]
    fn offset_points_into_the_input() {
        let err = crate::parse_condition("a == ???").unwrap_err();
        assert!(err.offset() > 0);
        assert!(err.offset() <= "a == ???".len());
    }
}
