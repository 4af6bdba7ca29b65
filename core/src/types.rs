//! Value and type definitions shared by flags, the tokenizer and the registry.
//!
//! A [`Value`] is what a flag holds after parsing. Command lines only carry
//! text, so the tokenizer produces strings and booleans; declared flags then
//! [`coerce`](Value::coerce) them to their [`FlagType`].

use std::fmt;

use serde::{Serialize, Serializer};

/// Declared type of a flag.
///
/// String inputs are normalized leniently (`"integer"`, `"float"` and
/// `"double"` all mean [`FlagType::Number`]); anything unrecognized falls
/// back to [`FlagType::String`].
///
/// # Examples
///
/// ```
/// use argflags_core::FlagType;
///
/// assert_eq!(FlagType::from("Integer"), FlagType::Number);
/// assert_eq!(FlagType::from("bool"), FlagType::Boolean);
/// assert_eq!(FlagType::from("whatever"), FlagType::String);
/// assert_eq!(FlagType::default(), FlagType::String);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagType {
    /// Text (the default).
    #[default]
    String,
    /// Floating point number.
    Number,
    /// Boolean switch.
    Boolean,
    /// Arbitrary precision integer (backed by `i128`).
    BigInt,
    /// Accepts any value; never type-checked.
    Any,
}

impl FlagType {
    /// Normalizes a textual type name.
    pub fn normalize(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "number" | "integer" | "float" | "double" => Self::Number,
            "bigint" => Self::BigInt,
            "boolean" | "bool" => Self::Boolean,
            "any" | "*" => Self::Any,
            _ => Self::String,
        }
    }

    /// Name used in violation messages and introspection output.
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::BigInt => "bigint",
            Self::Any => "any",
        }
    }

    /// Returns `true` when a value of this type passes a strict type check.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            _ => value.type_name() == self.name(),
        }
    }
}

impl From<&str> for FlagType {
    fn from(name: &str) -> Self {
        Self::normalize(name)
    }
}

impl From<String> for FlagType {
    fn from(name: String) -> Self {
        Self::normalize(&name)
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a flag was configured up front or created while parsing input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Explicitly configured through a schema or a registry method.
    Declared,
    /// Created on the fly for an input token with no prior declaration.
    #[default]
    Discovered,
}

/// A parsed or configured flag value.
///
/// # Examples
///
/// ```
/// use argflags_core::{FlagType, Value};
///
/// assert_eq!(Value::from_literal("TRUE"), Value::Bool(true));
/// assert_eq!(Value::from_literal("8080"), Value::String("8080".into()));
///
/// let port = Value::from_literal("8080").coerce(FlagType::Number);
/// assert_eq!(port, Value::Number(8080.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    BigInt(i128),
    String(String),
    /// Ordered values of a multi-value flag.
    List(Vec<Value>),
}

impl Value {
    /// Interprets raw command-line text: `true`/`false` (any case) become
    /// booleans, everything else stays a string.
    pub fn from_literal(text: &str) -> Self {
        match parse_bool(text) {
            Some(b) => Self::Bool(b),
            None => Self::String(text.to_string()),
        }
    }

    /// Type name used in strict type checks.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::String(_) => "string",
            Self::List(_) => "list",
        }
    }

    /// Converts the value to `target` when it can be converted without
    /// guessing; any scalar converts to a string. Values that do not convert
    /// are returned unchanged so the mismatch can be reported by validation.
    pub fn coerce(self, target: FlagType) -> Self {
        match (target, self) {
            (_, Self::List(items)) => {
                Self::List(items.into_iter().map(|item| item.coerce(target)).collect())
            }
            (FlagType::Number, Self::String(text)) => match text.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Self::Number(n),
                _ => Self::String(text),
            },
            (FlagType::Number, Self::BigInt(n)) => Self::Number(n as f64),
            (FlagType::BigInt, Self::String(text)) => match text.trim().parse::<i128>() {
                Ok(n) => Self::BigInt(n),
                Err(_) => Self::String(text),
            },
            (FlagType::BigInt, Self::Number(n)) if n.fract() == 0.0 => Self::BigInt(n as i128),
            (FlagType::Boolean, Self::String(text)) => match parse_bool(&text) {
                Some(b) => Self::Bool(b),
                None => Self::String(text),
            },
            (FlagType::String, Self::Bool(b)) => Self::String(b.to_string()),
            (FlagType::String, Self::Number(n)) => Self::String(n.to_string()),
            (FlagType::String, Self::BigInt(n)) => Self::String(n.to_string()),
            (_, other) => other,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Converts a JSON value. `null` has no counterpart and yields `None`.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            serde_json::Value::Array(items) => {
                Some(Self::List(items.iter().filter_map(Self::from_json).collect()))
            }
            serde_json::Value::Object(_) => Some(Self::String(json.to_string())),
        }
    }

    /// The type a default of this value implies when no type is configured.
    pub(crate) fn inferred_type(&self) -> Option<FlagType> {
        match self {
            Self::Bool(_) => Some(FlagType::Boolean),
            Self::Number(_) => Some(FlagType::Number),
            Self::BigInt(_) => Some(FlagType::BigInt),
            Self::String(_) => Some(FlagType::String),
            Self::List(items) => items.first().and_then(Self::inferred_type),
        }
    }
}

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::BigInt(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::List(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&rendered.join(","))
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::BigInt(n) => match i64::try_from(*n) {
                Ok(small) => serializer.serialize_i64(small),
                Err(_) => serializer.serialize_str(&n.to_string()),
            },
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => items.serialize(serializer),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i128> for Value {
    fn from(n: i128) -> Self {
        Self::BigInt(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_type_normalizes_aliases() {
        assert_eq!(FlagType::normalize(" double "), FlagType::Number);
        assert_eq!(FlagType::normalize("BigInt"), FlagType::BigInt);
        assert_eq!(FlagType::normalize("*"), FlagType::Any);
        assert_eq!(FlagType::normalize("path"), FlagType::String);
    }

    #[test]
    fn test_coerce_number_keeps_unparseable_text() {
        assert_eq!(
            Value::from("abc").coerce(FlagType::Number),
            Value::String("abc".into())
        );
        assert_eq!(
            Value::from("inf").coerce(FlagType::Number),
            Value::String("inf".into())
        );
        assert_eq!(Value::from("2.5").coerce(FlagType::Number), Value::Number(2.5));
    }

    #[test]
    fn test_coerce_bigint_and_string() {
        assert_eq!(
            Value::from("170141183460469231731687303715884105727").coerce(FlagType::BigInt),
            Value::BigInt(i128::MAX)
        );
        assert_eq!(Value::Bool(false).coerce(FlagType::String), Value::from("false"));
        assert_eq!(Value::Number(5.0).coerce(FlagType::String), Value::from("5"));
        assert_eq!(Value::BigInt(7).coerce(FlagType::String), Value::from("7"));
        assert_eq!(Value::Bool(true).coerce(FlagType::Any), Value::Bool(true));
    }

    #[test]
    fn test_coerce_applies_to_list_items() {
        let list = Value::from(vec!["1", "x"]).coerce(FlagType::Number);
        assert_eq!(
            list,
            Value::List(vec![Value::Number(1.0), Value::String("x".into())])
        );
    }

    #[test]
    fn test_from_json_drops_null_items() {
        let json = serde_json::json!([1, null, "a", true]);
        assert_eq!(
            Value::from_json(&json),
            Some(Value::List(vec![
                Value::Number(1.0),
                Value::from("a"),
                Value::Bool(true)
            ]))
        );
        assert_eq!(Value::from_json(&serde_json::Value::Null), None);
    }

    #[test]
    fn test_serialize_bigint_falls_back_to_string() {
        let small = serde_json::to_string(&Value::BigInt(42)).unwrap();
        assert_eq!(small, "42");
        let large = serde_json::to_string(&Value::BigInt(i128::MAX)).unwrap();
        assert_eq!(large, "\"170141183460469231731687303715884105727\"");
    }
}
