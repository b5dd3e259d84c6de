//! Stored values and typed conversion out of them.

use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value held by the variable database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean switch.
    Flag(bool),
    /// Any numeric quantity (counts, lengths, temperatures).
    Number(f64),
    /// Text, usually a material name.
    Text(String),
    /// Ordered list of values.
    List(Vec<Value>),
}

impl Value {
    /// Short name of the value kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Flag(_) => "flag",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Flag(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (k, v) in items.iter().enumerate() {
                    if k > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(f64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Number(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Flag(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// Conversion from a stored [`Value`] to a Rust type.
pub trait FromValue: Sized {
    /// Name of the target type, for error messages.
    const EXPECTED: &'static str;

    /// Convert, or `None` if the value has the wrong kind.
    fn convert(value: &Value) -> Option<Self>;

    /// Convert, reporting a type mismatch against `key`.
    fn from_value(key: &str, value: &Value) -> Result<Self> {
        Self::convert(value).ok_or_else(|| ConfigError::TypeMismatch {
            key: key.to_string(),
            expected: Self::EXPECTED,
            found: format!("{} `{}`", value.kind(), value),
        })
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "number";

    fn convert(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "integer";

    fn convert(value: &Value) -> Option<Self> {
        let n = f64::convert(value)?;
        (n.fract() == 0.0 && n.abs() < 9.0e15).then_some(n as i64)
    }
}

impl FromValue for usize {
    const EXPECTED: &'static str = "non-negative integer";

    fn convert(value: &Value) -> Option<Self> {
        let n = i64::convert(value)?;
        usize::try_from(n).ok()
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "flag";

    fn convert(value: &Value) -> Option<Self> {
        match value {
            Value::Flag(b) => Some(*b),
            Value::Number(n) => Some(*n != 0.0),
            _ => None,
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "text";

    fn convert(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s.clone()),
            // Numeric material ids are common.
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const EXPECTED: &'static str = "list";

    fn convert(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::convert).collect(),
            scalar => T::convert(scalar).map(|v| vec![v]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_conversions() {
        let v = Value::from(4.0);
        assert_eq!(f64::convert(&v), Some(4.0));
        assert_eq!(usize::convert(&v), Some(4));
        assert_eq!(usize::convert(&Value::from(-1)), None);
        assert_eq!(usize::convert(&Value::from(2.5)), None);
        assert_eq!(f64::convert(&Value::from(" 2.5 ")), Some(2.5));
    }

    #[test]
    fn test_text_conversions() {
        assert_eq!(String::convert(&Value::from("Be")), Some("Be".to_string()));
        assert_eq!(String::convert(&Value::from(5)), Some("5".to_string()));
        assert_eq!(String::convert(&Value::from(true)), None);
    }

    #[test]
    fn test_list_conversions() {
        let v = Value::from(vec![3.0, 1.0, 2.0]);
        assert_eq!(Vec::<f64>::convert(&v), Some(vec![3.0, 1.0, 2.0]));
        assert_eq!(Vec::<usize>::convert(&Value::from(2)), Some(vec![2]));
        let mixed = Value::List(vec![Value::from(1), Value::from("x")]);
        assert_eq!(Vec::<f64>::convert(&mixed), None);
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = f64::from_value("PlateThick0", &Value::from(true)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "variable `PlateThick0`: expected number, found flag `true`"
        );
    }
}
