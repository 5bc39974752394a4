use std::fmt;
use std::ops::Not;

use super::context::EvalContext;
use super::Value;

/// Comparison operators supported in rule conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Parsed condition expression. Produced by
/// [`parse_condition`](crate::parse_condition) from the author-facing `if`
/// strings of a rule document, and evaluated against an [`EvalContext`]
/// built per event.
///
/// Paths are dot-separated; a segment starting with `$` is substituted from
/// the event payload before lookup. Unknown paths evaluate as absent, and
/// every comparison on an absent value is false. Conditions never raise.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Compare {
        path: String,
        op: CompareOp,
        value: Value,
    },
    In {
        path: String,
        values: Vec<Value>,
    },
    /// Bare path: a truthiness test on the resolved value.
    Path(String),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    /// Evaluate this expression against the given context.
    #[must_use]
    pub fn eval(&self, ctx: &EvalContext<'_>) -> bool {
        match self {
            Expr::Compare { path, op, value } => ctx
                .get(path)
                .and_then(|resolved| resolved.compare(*op, value))
                .unwrap_or(false),
            Expr::In { path, values } => ctx.get(path).is_some_and(|resolved| {
                values
                    .iter()
                    .any(|candidate| resolved.compare(CompareOp::Eq, candidate) == Some(true))
            }),
            Expr::Path(path) => ctx.get(path).is_some_and(|resolved| resolved.truthy()),
            Expr::And(a, b) => a.eval(ctx) && b.eval(ctx),
            Expr::Or(a, b) => a.eval(ctx) || b.eval(ctx),
            Expr::Not(inner) => !inner.eval(ctx),
        }
    }

    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(other))
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Neq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Compare { path, op, value } => write!(f, "({path} {op} {value})"),
            Expr::In { path, values } => {
                write!(f, "({path} in [")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "])")
            }
            Expr::Path(path) => write!(f, "{path}"),
            Expr::And(a, b) => write!(f, "({a} AND {b})"),
            Expr::Or(a, b) => write!(f, "({a} OR {b})"),
            Expr::Not(inner) => write!(f, "(NOT {inner})"),
        }
    }
}
