#![forbid(unsafe_code)]

//! Lifetime management for groups of subscriptions.
//!
//! A [`BindingScope`] owns every [`Subscription`] a component registers on
//! its observables, lists and maps. Dropping the scope (or calling
//! [`BindingScope::clear`]) disconnects them all at once.
//!
//! # Invariants
//!
//! 1. Subscriptions are released in registration order on drop.
//! 2. After drop or `clear()`, no callback registered through this scope
//!    fires again.
//! 3. `binding_count()` is exactly the number of held subscriptions.

use std::fmt;
use std::hash::Hash;

use crate::list::{ListChange, ObservableList};
use crate::map::{MapChange, ObservableMap};
use crate::observable::{Observable, Subscription};

/// Collects subscriptions for a logical owner (for example one document).
#[derive(Default)]
pub struct BindingScope {
    subscriptions: Vec<Subscription>,
}

impl BindingScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Keep `sub` alive until the scope is dropped or cleared.
    pub fn hold(&mut self, sub: Subscription) {
        self.subscriptions.push(sub);
    }

    /// Subscribe to value changes of `source` within this scope.
    pub fn observe<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        callback: impl Fn(&T) + Send + Sync + 'static,
    ) -> &mut Self {
        self.hold(source.subscribe(callback));
        self
    }

    /// Subscribe to structural changes of `source` within this scope.
    pub fn observe_list<T: Clone + 'static>(
        &mut self,
        source: &ObservableList<T>,
        callback: impl Fn(&ListChange<T>) + Send + Sync + 'static,
    ) -> &mut Self {
        self.hold(source.subscribe(callback));
        self
    }

    /// Subscribe to entry changes of `source` within this scope.
    pub fn observe_map<K, V>(
        &mut self,
        source: &ObservableMap<K, V>,
        callback: impl Fn(&MapChange<K, V>) + Send + Sync + 'static,
    ) -> &mut Self
    where
        K: Hash + Eq + Clone + 'static,
        V: Clone + PartialEq + 'static,
    {
        self.hold(source.subscribe(callback));
        self
    }

    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release all subscriptions now; the scope stays usable.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

impl fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingScope")
            .field("binding_count", &self.subscriptions.len())
            .finish()
    }
}
