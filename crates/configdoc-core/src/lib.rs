#![forbid(unsafe_code)]

//! Reactive configuration documents.
//!
//! A configuration tree is stored as nested raw key-value maps (the form
//! that is loaded from and saved to disk) and exposed to editors as typed,
//! observable views. This crate keeps the two in agreement:
//!
//! - [`Value`] / [`RawMap`]: the raw, observable tree.
//! - [`ScalarCell`]: typed observable views of scalar keys.
//! - [`DocumentProperty`]: one node, owning its cells and child lists.
//! - [`DocumentFactory`] / [`DocumentKind`]: which kind of document wraps
//!   the mappings found under a given list key.
//!
//! # Example
//!
//! ```
//! use configdoc_core::{DocumentFactory, DocumentKind, DocumentProperty, RawMap, Value, raw_map};
//!
//! let table = DocumentProperty::with_factory(
//!     DocumentKind::TABLE,
//!     RawMap::new(),
//!     DocumentFactory::project_tree(),
//! );
//! table.put("name", "users").unwrap();
//!
//! let name = table.string_property_of("name").unwrap();
//! name.set("accounts".to_string());
//! assert_eq!(table.get_as_string("name").unwrap().as_deref(), Some("accounts"));
//!
//! let columns = table.observable_list_of("columns", DocumentKind::COLUMN).unwrap();
//! columns.push(table.create_document("columns", raw_map([("name", "id")])));
//! assert_eq!(table.get("columns").and_then(|v| v.as_list().map(<[Value]>::len)), Some(1));
//! ```
//!
//! # Feature Flags
//!
//! - `serde`: JSON load and export through `serde_json`.

pub mod cell;
pub mod document;
pub mod error;
pub mod factory;
#[cfg(feature = "serde")]
mod json;
pub(crate) mod monitor;
pub mod value;

pub use cell::{
    BooleanProperty, DoubleProperty, IntegerProperty, LongProperty, ObjectProperty, ScalarCell,
    StringProperty,
};
pub use document::DocumentProperty;
pub use error::{DocumentError, Result};
pub use factory::{DocumentFactory, DocumentKind};
pub use value::{RawMap, Value, deep_clone_map, raw_map};

pub use configdoc_reactive::{ListChange, MapChange, ObservableList, Subscription};
