#![forbid(unsafe_code)]

//! Raw document values.
//!
//! A configuration document is an ordered map from string keys to
//! [`Value`]s. Nested documents are [`RawMap`] handles, so the same mapping
//! can sit inside a parent's list and back a child document at the same
//! time: edits made through the child are visible when the parent is read
//! or serialized.
//!
//! # Numeric reads
//!
//! `Int` and `Long` are distinct variants, but integer reads convert between
//! them whenever the conversion is lossless. Every other cross-variant read
//! reports the value's [`type_name`](Value::type_name) as a mismatch.

use configdoc_reactive::ObservableMap;

/// The raw, observable mapping backing one document.
pub type RawMap = ObservableMap<String, Value>;

/// One raw value in a configuration document.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    List(Vec<Value>),
    Map(RawMap),
}

impl Value {
    /// Short name of the variant, used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// `Int`, or a `Long` that fits in `i32`.
    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Long(l) => i32::try_from(*l).ok(),
            _ => None,
        }
    }

    /// `Long`, or any `Int`.
    #[must_use]
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(l) => Some(*l),
            Self::Int(i) => Some(i64::from(*i)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&RawMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Whether both values are integers (`Int` or `Long`) of equal value.
    #[must_use]
    pub fn same_integer(&self, other: &Self) -> bool {
        matches!((self.as_long(), other.as_long()), (Some(a), Some(b)) if a == b)
    }

    /// Copy the value, giving every nested map a fresh handle.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        match self {
            Self::List(items) => Self::List(items.iter().map(Self::deep_clone).collect()),
            Self::Map(map) => Self::Map(deep_clone_map(map)),
            scalar => scalar.clone(),
        }
    }
}

/// Copy `map` and everything nested in it into fresh handles.
#[must_use]
pub fn deep_clone_map(map: &RawMap) -> RawMap {
    map.entries()
        .into_iter()
        .map(|(key, value)| (key, value.deep_clone()))
        .collect()
}

/// Build a [`RawMap`] from key/value pairs.
///
/// ```
/// use configdoc_core::value::{raw_map, Value};
///
/// let table = raw_map([("name", Value::from("user")), ("enabled", Value::from(true))]);
/// assert_eq!(table.keys(), vec!["name".to_string(), "enabled".to_string()]);
/// ```
pub fn raw_map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> RawMap
where
    K: Into<String>,
    V: Into<Value>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Iterate the map-shaped elements of a raw list, skipping anything else.
pub(crate) fn maps_in(items: &[Value]) -> impl Iterator<Item = &RawMap> {
    items.iter().filter_map(Value::as_map)
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<RawMap> for Value {
    fn from(value: RawMap) -> Self {
        Self::Map(value)
    }
}
