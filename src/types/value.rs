use std::cmp::Ordering;
use std::fmt;

use super::expr::CompareOp;

/// Supported value types for condition evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A boolean value.
    Bool(bool),
    /// A UTF-8 string.
    String(String),
    /// A list of values, used by `in` membership tests.
    List(Vec<Value>),
}

impl Value {
    /// Compare this value to another using the given operator.
    /// Returns `None` for incompatible types or unsupported operations
    /// (e.g. ordering on lists).
    #[must_use]
    pub fn compare(&self, op: CompareOp, other: &Value) -> Option<bool> {
        let ord = self.partial_cmp_value(other)?;
        Some(match op {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Neq => ord != Ordering::Equal,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Gte => ord != Ordering::Less,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Lte => ord != Ordering::Greater,
        })
    }

    /// Whether this value counts as "true" when a condition names a bare path.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Bool(v) => *v,
            Value::String(v) => !v.is_empty(),
            Value::List(v) => !v.is_empty(),
        }
    }

    /// Membership test: whether `candidate` equals any element of this list.
    /// Non-list values never contain anything.
    #[must_use]
    pub fn contains(&self, candidate: &Value) -> bool {
        match self {
            Value::List(items) => items
                .iter()
                .any(|item| item.compare(CompareOp::Eq, candidate) == Some(true)),
            _ => false,
        }
    }

    /// Convert a JSON leaf into a [`Value`]. Objects and nulls have no
    /// scalar counterpart and yield `None`.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Option<Value> {
        match json {
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Int(i))
                } else {
                    n.as_f64().map(Value::Float)
                }
            }
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Array(items) => Some(Value::List(
                items.iter().filter_map(Value::from_json).collect(),
            )),
            serde_json::Value::Null | serde_json::Value::Object(_) => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            // Only equality comparisons are meaningful for bools
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "\"{v}\""),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_i64() {
        assert_eq!(Value::from(42_i64), Value::Int(42));
    }

    #[test]
    fn from_str() {
        assert_eq!(Value::from("hello"), Value::String("hello".to_owned()));
    }

    #[test]
    fn display() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::String("e4".into()).to_string(), "\"e4\"");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Int(2)]).to_string(),
            "[1, 2]"
        );
    }

    #[test]
    fn compare_int() {
        let a = Value::Int(10);
        let b = Value::Int(20);
        assert_eq!(a.compare(CompareOp::Eq, &b), Some(false));
        assert_eq!(a.compare(CompareOp::Lt, &b), Some(true));
        assert_eq!(a.compare(CompareOp::Gte, &a), Some(true));
    }

    #[test]
    fn compare_int_float_cross_type() {
        let i = Value::Int(10);
        let f = Value::Float(10.0);
        assert_eq!(i.compare(CompareOp::Eq, &f), Some(true));
        assert_eq!(f.compare(CompareOp::Eq, &i), Some(true));
        let f2 = Value::Float(10.5);
        assert_eq!(i.compare(CompareOp::Lt, &f2), Some(true));
    }

    #[test]
    fn compare_type_mismatch_returns_none() {
        let i = Value::Int(1);
        let s = Value::String("hello".into());
        assert_eq!(i.compare(CompareOp::Eq, &s), None);
        let list = Value::List(vec![]);
        assert_eq!(list.compare(CompareOp::Eq, &list), None);
    }

    #[test]
    fn truthiness() {
        assert!(Value::Bool(true).truthy());
        assert!(!Value::Bool(false).truthy());
        assert!(Value::Int(1).truthy());
        assert!(!Value::Int(0).truthy());
        assert!(Value::String("x".into()).truthy());
        assert!(!Value::String(String::new()).truthy());
        assert!(!Value::List(vec![]).truthy());
    }

    #[test]
    fn list_membership() {
        let list = Value::List(vec![Value::String("e4".into()), Value::String("d4".into())]);
        assert!(list.contains(&Value::String("e4".into())));
        assert!(!list.contains(&Value::String("a1".into())));
        assert!(!Value::Int(1).contains(&Value::Int(1)));
    }

    #[test]
    fn membership_coerces_int_and_float() {
        let list = Value::List(vec![Value::Int(3)]);
        assert!(list.contains(&Value::Float(3.0)));
    }

    #[test]
    fn from_json_leaves() {
        assert_eq!(Value::from_json(&serde_json::json!(7)), Some(Value::Int(7)));
        assert_eq!(
            Value::from_json(&serde_json::json!(2.5)),
            Some(Value::Float(2.5))
        );
        assert_eq!(
            Value::from_json(&serde_json::json!("e4")),
            Some(Value::String("e4".into()))
        );
        assert_eq!(
            Value::from_json(&serde_json::json!([1, 2])),
            Some(Value::List(vec![Value::Int(1), Value::Int(2)]))
        );
        assert_eq!(Value::from_json(&serde_json::Value::Null), None);
        assert_eq!(Value::from_json(&serde_json::json!({})), None);
    }
}
