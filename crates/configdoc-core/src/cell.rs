#![forbid(unsafe_code)]

//! Typed scalar views of raw values.
//!
//! Each cached scalar key of a document is projected as one [`ScalarCell`],
//! an [`Observable`] of the matching Rust type. Cells are created either on
//! demand (`*_property_of`) or when a raw write introduces a new key; both
//! paths end in the same registration, which wires exactly one write-back
//! listener per cell.

use configdoc_reactive::{Observable, Subscription};

use crate::value::Value;

pub type StringProperty = Observable<String>;
pub type BooleanProperty = Observable<bool>;
pub type IntegerProperty = Observable<i32>;
pub type LongProperty = Observable<i64>;
pub type DoubleProperty = Observable<f64>;
/// Holds any raw value; `None` means the key is absent.
pub type ObjectProperty = Observable<Option<Value>>;

/// A typed observable bound to one key of one document.
#[derive(Debug, Clone)]
pub enum ScalarCell {
    String(StringProperty),
    Boolean(BooleanProperty),
    Integer(IntegerProperty),
    Long(LongProperty),
    Double(DoubleProperty),
    Object(ObjectProperty),
}

impl ScalarCell {
    /// A new cell of the variant matching `value`, holding it.
    ///
    /// Values without a scalar variant of their own land in an `Object` cell.
    #[must_use]
    pub fn for_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::String(Observable::new(s.clone())),
            Value::Bool(b) => Self::Boolean(Observable::new(*b)),
            Value::Int(i) => Self::Integer(Observable::new(*i)),
            Value::Long(l) => Self::Long(Observable::new(*l)),
            Value::Double(d) => Self::Double(Observable::new(*d)),
            other => Self::Object(Observable::new(Some(other.clone()))),
        }
    }

    /// Name of the cell's value type, matching [`Value::type_name`].
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Boolean(_) => "bool",
            Self::Integer(_) => "int",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::Object(_) => "object",
        }
    }

    /// The current value as a raw value.
    #[must_use]
    pub fn value(&self) -> Option<Value> {
        match self {
            Self::String(p) => Some(Value::String(p.get())),
            Self::Boolean(p) => Some(Value::Bool(p.get())),
            Self::Integer(p) => Some(Value::Int(p.get())),
            Self::Long(p) => Some(Value::Long(p.get())),
            Self::Double(p) => Some(Value::Double(p.get())),
            Self::Object(p) => p.get(),
        }
    }

    /// Whether [`assign`](Self::assign) would take `value`.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String(_) => value.as_str().is_some(),
            Self::Boolean(_) => value.as_bool().is_some(),
            Self::Integer(_) => value.as_int().is_some(),
            Self::Long(_) => value.as_long().is_some(),
            Self::Double(_) => value.as_double().is_some(),
            Self::Object(_) => true,
        }
    }

    /// Store `value` in the cell, keeping the cell's identity.
    ///
    /// Returns `false`, leaving the cell untouched, when the value does not
    /// fit the cell's type.
    pub fn assign(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String(p), Value::String(s)) => {
                p.set(s.clone());
            }
            (Self::Boolean(p), Value::Bool(b)) => {
                p.set(*b);
            }
            (Self::Integer(p), v) => match v.as_int() {
                Some(i) => {
                    p.set(i);
                }
                None => return false,
            },
            (Self::Long(p), v) => match v.as_long() {
                Some(l) => {
                    p.set(l);
                }
                None => return false,
            },
            (Self::Double(p), Value::Double(d)) => {
                p.set(*d);
            }
            (Self::Object(p), v) => {
                p.set(Some(v.clone()));
            }
            _ => return false,
        }
        true
    }

    /// Run `callback` with the new raw value after every change of the cell.
    #[must_use = "dropping the subscription detaches the callback"]
    pub fn subscribe_raw(
        &self,
        callback: impl Fn(Option<Value>) + Send + Sync + 'static,
    ) -> Subscription {
        match self {
            Self::String(p) => p.subscribe(move |v| callback(Some(Value::String(v.clone())))),
            Self::Boolean(p) => p.subscribe(move |v| callback(Some(Value::Bool(*v)))),
            Self::Integer(p) => p.subscribe(move |v| callback(Some(Value::Int(*v)))),
            Self::Long(p) => p.subscribe(move |v| callback(Some(Value::Long(*v)))),
            Self::Double(p) => p.subscribe(move |v| callback(Some(Value::Double(*v)))),
            Self::Object(p) => p.subscribe(move |v| callback(v.clone())),
        }
    }

    /// Number of live subscribers on the underlying observable.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        match self {
            Self::String(p) => p.subscriber_count(),
            Self::Boolean(p) => p.subscriber_count(),
            Self::Integer(p) => p.subscriber_count(),
            Self::Long(p) => p.subscriber_count(),
            Self::Double(p) => p.subscriber_count(),
            Self::Object(p) => p.subscriber_count(),
        }
    }

    /// Whether both cells are the same observable.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a.ptr_eq(b),
            (Self::Boolean(a), Self::Boolean(b)) => a.ptr_eq(b),
            (Self::Integer(a), Self::Integer(b)) => a.ptr_eq(b),
            (Self::Long(a), Self::Long(b)) => a.ptr_eq(b),
            (Self::Double(a), Self::Double(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}
