#![forbid(unsafe_code)]

//! Reactive observation primitives for configdoc.
//!
//! This crate provides the change-tracking building blocks the document
//! model is synchronized with:
//!
//! - [`Observable`]: A shared, version-tracked value cell with change
//!   notification via subscriber callbacks.
//! - [`ObservableList`]: A shared ordered sequence publishing
//!   [`ListChange`]s.
//! - [`ObservableMap`]: A shared insertion-ordered map publishing
//!   [`MapChange`]s.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//! - [`BindingScope`]: Owner of a group of subscriptions.
//!
//! # Architecture
//!
//! Every primitive keeps its state behind `Arc<Mutex<..>>`; cloning a
//! handle shares the underlying state, and handles are `Send + Sync` so a
//! structure built on one thread can be read or handed over on another.
//! Subscribers are stored as `Weak` callbacks (which must themselves be
//! `Send + Sync`) and cleaned up lazily during notification. Callbacks run
//! synchronously on the writing thread once the mutation is complete and
//! no lock is held, so they may re-enter the structure that notified them.
//! A poisoned lock is recovered rather than propagated.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. A write that changes nothing publishes nothing.
//! 3. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.

pub mod list;
pub mod map;
pub mod observable;
pub mod scope;

pub use list::{ListChange, ObservableList};
pub use map::{MapChange, ObservableMap};
pub use observable::{Observable, Subscription};
pub use scope::BindingScope;
