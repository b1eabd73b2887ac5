//! Closed result-value tree and the non-finite sanitizer.
//!
//! Every analysis section is rendered into a [`ResultValue`] before it leaves
//! the engine. The variant set is closed (number, text, boolean, null, list,
//! map), so [`sanitize`] is a total, exhaustive walk: NaN and ±∞ become
//! [`ResultValue::Null`], everything else is kept as is.
//!
//! Maps keep insertion order, so factors, levels and cells come out in the
//! order the engine computed them.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::experiment::Level;

/// A JSON-shaped result value.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    /// Absent or undefined value.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Floating point number. May be non-finite until sanitized.
    Number(f64),
    /// Text.
    Text(String),
    /// Ordered sequence.
    List(Vec<ResultValue>),
    /// String-keyed mapping, in insertion order.
    Map(IndexMap<String, ResultValue>),
}

impl ResultValue {
    /// Build a map from `(key, value)` pairs.
    #[must_use]
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ResultValue)>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a list from anything convertible.
    #[must_use]
    pub fn list<T, I>(items: I) -> Self
    where
        T: Into<ResultValue>,
        I: IntoIterator<Item = T>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Whether this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric payload, if any.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Text payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key in a map value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ResultValue> {
        match self {
            Self::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Keys of a map value, in order. Empty for other variants.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Self::Map(m) => m.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Index into a list value.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&ResultValue> {
        match self {
            Self::List(items) => items.get(index),
            _ => None,
        }
    }

    /// Render as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Replace every NaN/±∞ number in `value` with null.
///
/// Idempotent: `sanitize(sanitize(x)) == sanitize(x)`.
#[must_use]
pub fn sanitize(value: ResultValue) -> ResultValue {
    match value {
        ResultValue::Number(v) if !v.is_finite() => ResultValue::Null,
        ResultValue::List(items) => ResultValue::List(items.into_iter().map(sanitize).collect()),
        ResultValue::Map(entries) => {
            ResultValue::Map(entries.into_iter().map(|(k, v)| (k, sanitize(v))).collect())
        }
        other @ (ResultValue::Null
        | ResultValue::Bool(_)
        | ResultValue::Number(_)
        | ResultValue::Text(_)) => other,
    }
}

impl Serialize for ResultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(v) if v.is_finite() => serializer.serialize_f64(*v),
            Self::Number(_) => serializer.serialize_unit(),
            Self::Text(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl From<f64> for ResultValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<usize> for ResultValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(v: usize) -> Self {
        Self::Number(v as f64)
    }
}

impl From<i64> for ResultValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<u64> for ResultValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(v: u64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<bool> for ResultValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for ResultValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ResultValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&Level> for ResultValue {
    fn from(level: &Level) -> Self {
        match level {
            Level::Number(v) => Self::Number(*v),
            Level::Label(s) => Self::Text(s.clone()),
        }
    }
}

impl<T: Into<ResultValue>> From<Option<T>> for ResultValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<ResultValue>> From<Vec<T>> for ResultValue {
    fn from(items: Vec<T>) -> Self {
        Self::list(items)
    }
}
