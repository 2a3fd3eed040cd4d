//! Predicate operands
//!
//! Settings consulted by predicate rules are loosely typed. FieldValue is the
//! closed set of shapes they can take once they cross into the planner, with
//! an explicit `Absent` marker for a field that has no value at all.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Value of a looked-up field or a configured predicate operand
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// The field has no value. Never produced from configuration.
    #[default]
    #[serde(skip)]
    Absent,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Loose string form used by the equality operators.
    ///
    /// Absent, null and `false` all read as the empty string, `true` as `"1"`,
    /// integral floats drop their fraction, and collections read as `"Array"`.
    pub fn to_loose_string(&self) -> String {
        match self {
            Self::Absent | Self::Null | Self::Bool(false) => String::new(),
            Self::Bool(true) => "1".to_string(),
            Self::Int(n) => n.to_string(),
            Self::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", *f as i64)
            }
            Self::Float(f) => f.to_string(),
            Self::Str(s) => s.clone(),
            Self::List(_) | Self::Map(_) => "Array".to_string(),
        }
    }

    /// Short name of the value's shape, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::Str(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from).collect()),
            Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        Self::List(value)
    }
}

/// Comparison applied by a predicate rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateOperator {
    Equals,
    NotEquals,
    Contains,
    In,
}

impl PredicateOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::In => "in",
        }
    }
}

impl fmt::Display for PredicateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator name outside the fixed operator set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown predicate operator: {0}")]
pub struct UnknownOperator(pub String);

impl FromStr for PredicateOperator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equals" => Ok(Self::Equals),
            "not_equals" => Ok(Self::NotEquals),
            "contains" => Ok(Self::Contains),
            "in" => Ok(Self::In),
            _ => Err(UnknownOperator(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_loose_string_forms() {
        assert_eq!(FieldValue::Absent.to_loose_string(), "");
        assert_eq!(FieldValue::Null.to_loose_string(), "");
        assert_eq!(FieldValue::Bool(false).to_loose_string(), "");
        assert_eq!(FieldValue::Bool(true).to_loose_string(), "1");
        assert_eq!(FieldValue::Int(42).to_loose_string(), "42");
        assert_eq!(FieldValue::Float(3.0).to_loose_string(), "3");
        assert_eq!(FieldValue::Float(2.5).to_loose_string(), "2.5");
        assert_eq!(FieldValue::List(vec![]).to_loose_string(), "Array");
    }

    #[test]
    fn test_from_json() {
        let value = FieldValue::from(&json!(["a", 1, true, null]));
        assert_eq!(
            value,
            FieldValue::List(vec![
                FieldValue::Str("a".into()),
                FieldValue::Int(1),
                FieldValue::Bool(true),
                FieldValue::Null,
            ])
        );
        assert_eq!(FieldValue::from(&json!(1.5)), FieldValue::Float(1.5));
    }

    #[test]
    fn test_operator_parse() {
        assert_eq!("equals".parse(), Ok(PredicateOperator::Equals));
        assert_eq!(" NOT_EQUALS ".parse(), Ok(PredicateOperator::NotEquals));
        assert_eq!("in".parse(), Ok(PredicateOperator::In));
        assert_eq!(
            "matches".parse::<PredicateOperator>(),
            Err(UnknownOperator("matches".into()))
        );
    }

    #[test]
    fn test_strict_equality_distinguishes_types() {
        assert_ne!(FieldValue::Int(1), FieldValue::Str("1".into()));
        assert_ne!(FieldValue::Int(1), FieldValue::Float(1.0));
    }
}
