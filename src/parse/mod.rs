mod error;
mod grammar;

pub use error::ParseError;

/// Parse one author-facing condition string into an [`Expr`](crate::Expr).
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid condition expression.
pub fn parse_condition(input: &str) -> Result<crate::Expr, ParseError> {
    use winnow::Parser;
    grammar::expr
        .parse(input)
        .map_err(|e| ParseError::new(e.inner().to_string(), e.offset()))
}
