//! Values accepted by the builders and returned by the driver.

use crate::error::{SqlError, SqlResult};
use serde::Serialize;
use std::hash::{Hash, Hasher};

/// A SQL value.
///
/// `Text("NULL")` is treated as SQL `NULL` wherever a value is rendered.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Only valid as the right-hand side of `IN` / `NOT IN`.
    List(Vec<Value>),
    /// SQL function applied to a column, e.g. `count(id)` or `unix_timestamp(created)`.
    RawCall { name: String, arg_field: String },
}

impl Value {
    /// Build a function call value.
    pub fn call(name: impl Into<String>, arg_field: impl Into<String>) -> Self {
        Value::RawCall {
            name: name.into(),
            arg_field: arg_field.into(),
        }
    }

    /// `Null` or the legacy `Text("NULL")` marker.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s == "NULL",
            _ => false,
        }
    }

    /// Null or empty text. Used to detect unmatched LEFT JOIN rows.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::RawCall { .. } => "call",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (
                Value::RawCall {
                    name: n1,
                    arg_field: a1,
                },
                Value::RawCall {
                    name: n2,
                    arg_field: a2,
                },
            ) => n1 == n2 && a1 == a2,
            _ => false,
        }
    }
}

// Floats compare by bit pattern.
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::List(items) => items.hash(state),
            Value::RawCall { name, arg_field } => {
                name.hash(state);
                arg_field.hash(state);
            }
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
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

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<&serde_json::Value> for Value {
    type Error = SqlError;

    fn try_from(json: &serde_json::Value) -> SqlResult<Self> {
        use serde_json::Value as Json;

        Ok(match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Text(s.clone()),
            Json::Array(items) => Value::List(
                items
                    .iter()
                    .map(Value::try_from)
                    .collect::<SqlResult<Vec<_>>>()?,
            ),
            Json::Object(_) => {
                return Err(SqlError::malformed(format!(
                    "objects are not valid condition values: {json}"
                )));
            }
        })
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = SqlError;

    fn try_from(json: serde_json::Value) -> SqlResult<Self> {
        Value::try_from(&json)
    }
}

pub(crate) fn describe(value: &Value) -> String {
    format!("{} value {:?}", value.type_name(), value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_marker_text_is_null() {
        assert!(Value::from("NULL").is_null());
        assert!(Value::Null.is_null());
        assert!(!Value::from("null").is_null());
    }

    #[test]
    fn empty_detection() {
        assert!(Value::from("").is_empty());
        assert!(Value::Null.is_empty());
        assert!(!Value::Int(0).is_empty());
        assert!(!Value::Bool(false).is_empty());
    }

    #[test]
    fn option_maps_to_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::Int(3));
    }

    #[test]
    fn json_conversion() {
        let v = Value::try_from(json!([1, 2.5, "a", null, true])).unwrap();
        assert_eq!(
            v,
            Value::List(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::from("a"),
                Value::Null,
                Value::Bool(true),
            ])
        );
    }

    #[test]
    fn json_object_is_rejected() {
        let err = Value::try_from(json!({"a": 1})).unwrap_err();
        assert!(matches!(err, SqlError::MalformedCondition(_)));
    }

    #[test]
    fn serializes_untagged() {
        let v = Value::List(vec![Value::Int(1), Value::Null, Value::from("x")]);
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"[1,null,"x"]"#);
    }
}
