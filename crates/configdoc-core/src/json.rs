#![forbid(unsafe_code)]

//! JSON load and export (feature `serde`).
//!
//! | JSON | Value |
//! |------|-------|
//! | string | `String` |
//! | `true` / `false` | `Bool` |
//! | integer in `i32` range | `Int` |
//! | other integer | `Long` |
//! | float | `Double` |
//! | array | `List` |
//! | object | `Map` |
//! | `null` | dropped |
//!
//! Export is the inverse. Non-finite doubles have no JSON form and export
//! as `null`. Object member order is preserved both ways.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Malformed text | `Err(DocumentError::Json)` |
//! | Root is not an object | `Err(DocumentError::Json)` |
//! | Unsigned integer above `i64::MAX` | Loaded as `Double` |

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map as JsonMap, Number, Value as Json};

use crate::document::DocumentProperty;
use crate::error::{DocumentError, Result};
use crate::factory::{DocumentFactory, DocumentKind};
use crate::value::{RawMap, Value};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i32(*i),
            Self::Long(l) => serializer.serialize_i64(*l),
            Self::Double(d) if d.is_finite() => serializer.serialize_f64(*d),
            Self::Double(_) => serializer.serialize_none(),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(map) => serialize_raw_map(map, serializer),
        }
    }
}

fn serialize_raw_map<S: Serializer>(map: &RawMap, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let entries = map.entries();
    let mut out = serializer.serialize_map(Some(entries.len()))?;
    for (key, value) in &entries {
        out.serialize_entry(key, value)?;
    }
    out.end()
}

impl Value {
    /// Convert a JSON value. Returns `None` for `null`.
    #[must_use]
    pub fn from_json(json: Json) -> Option<Self> {
        match json {
            Json::Null => None,
            Json::Bool(b) => Some(Self::Bool(b)),
            Json::Number(n) => Some(number_to_value(&n)),
            Json::String(s) => Some(Self::String(s)),
            Json::Array(items) => Some(Self::List(
                items.into_iter().filter_map(Self::from_json).collect(),
            )),
            Json::Object(members) => Some(Self::Map(object_to_raw_map(members))),
        }
    }

    /// Convert to a JSON value.
    #[must_use]
    pub fn to_json(&self) -> Json {
        match self {
            Self::String(s) => Json::String(s.clone()),
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(i) => Json::from(*i),
            Self::Long(l) => Json::from(*l),
            Self::Double(d) => Number::from_f64(*d).map_or(Json::Null, Json::Number),
            Self::List(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => Json::Object(raw_map_to_object(map)),
        }
    }
}

fn number_to_value(n: &Number) -> Value {
    if let Some(l) = n.as_i64() {
        return i32::try_from(l).map_or(Value::Long(l), Value::Int);
    }
    Value::Double(n.as_f64().unwrap_or(f64::NAN))
}

fn object_to_raw_map(members: JsonMap<String, Json>) -> RawMap {
    members
        .into_iter()
        .filter_map(|(key, json)| Value::from_json(json).map(|value| (key, value)))
        .collect()
}

fn raw_map_to_object(map: &RawMap) -> JsonMap<String, Json> {
    map.entries()
        .into_iter()
        .map(|(key, value)| (key, value.to_json()))
        .collect()
}

impl DocumentProperty {
    /// Parse `text` into a generic document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let json: Json =
            serde_json::from_str(text).map_err(|err| DocumentError::Json(err.to_string()))?;
        Self::from_json_value(json)
    }

    /// Load a generic document from a JSON object.
    pub fn from_json_value(json: Json) -> Result<Self> {
        Self::from_json_value_with(DocumentKind::GENERIC, json, DocumentFactory::new())
    }

    /// Load a document of `kind` from a JSON object, resolving children with
    /// `factory`.
    pub fn from_json_value_with(
        kind: DocumentKind,
        json: Json,
        factory: DocumentFactory,
    ) -> Result<Self> {
        match json {
            Json::Object(members) => {
                let data = object_to_raw_map(members);
                tracing::debug!(%kind, keys = data.len(), "document loaded from json");
                Ok(Self::with_factory(kind, data, factory))
            }
            other => Err(DocumentError::Json(format!(
                "expected an object at the root, found {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Export the raw store as a JSON object.
    #[must_use]
    pub fn to_json_value(&self) -> Json {
        Json::Object(raw_map_to_object(&self.data()))
    }

    /// Export the raw store as compact JSON text.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&Value::Map(self.data()))
            .map_err(|err| DocumentError::Json(err.to_string()))
    }

    /// Export the raw store as indented JSON text.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&Value::Map(self.data()))
            .map_err(|err| DocumentError::Json(err.to_string()))
    }
}

fn json_type_name(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
