#![forbid(unsafe_code)]

//! Reactive configuration documents: public facade crate.
//!
//! This crate provides the stable surface for users. Everything lives in
//! [`configdoc_core`] and [`configdoc_reactive`]; the [`prelude`] gathers
//! what editors usually need.
//!
//! # Feature Flags
//!
//! - `serde`: JSON load and export on [`DocumentProperty`](prelude::DocumentProperty).
//! - `tracing-json`: [`logging::init`] installs a JSON `tracing` subscriber.

#[cfg(feature = "tracing-json")]
pub mod logging;

pub use configdoc_core as core;
pub use configdoc_reactive as reactive;

pub mod prelude {
    pub use configdoc_core::{
        BooleanProperty, DocumentError, DocumentFactory, DocumentKind, DocumentProperty,
        DoubleProperty, IntegerProperty, LongProperty, ObjectProperty, RawMap, Result,
        ScalarCell, StringProperty, Value, raw_map,
    };
    pub use configdoc_reactive::{
        BindingScope, ListChange, MapChange, Observable, ObservableList, ObservableMap,
        Subscription,
    };
}
