#![forbid(unsafe_code)]

//! Observable insertion-ordered maps.
//!
//! [`ObservableMap<K, V>`] wraps an [`IndexMap`] behind a shared handle and
//! publishes a [`MapChange`] for every insert that changes an entry and for
//! every removal.
//!
//! # Invariants
//!
//! 1. Inserting a value equal to the one already stored is a no-op.
//! 2. Iteration order is insertion order; replacing a value keeps its slot,
//!    removing an entry preserves the order of the rest.
//! 3. [`ObservableMap::update`] edits an entry in place and publishes
//!    nothing. It exists for owners that mirror derived state back into the
//!    map and must not observe their own writes.
//! 4. Equality is structural: two distinct maps with the same entries in
//!    the same order compare equal. At most one map is locked at a time
//!    while comparing, so concurrent comparisons cannot deadlock each other.

use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use indexmap::IndexMap;

use crate::observable::Subscription;

/// A change published by an [`ObservableMap`].
#[derive(Debug, Clone, PartialEq)]
pub enum MapChange<K, V> {
    /// `key` now maps to `value`; `replaced` is the previous value, if any.
    Added {
        key: K,
        value: V,
        replaced: Option<V>,
    },
    /// `key` was removed; `value` is what it mapped to.
    Removed { key: K, value: V },
}

impl<K, V> MapChange<K, V> {
    /// The key the change applies to.
    #[must_use]
    pub fn key(&self) -> &K {
        match self {
            Self::Added { key, .. } | Self::Removed { key, .. } => key,
        }
    }

    #[must_use]
    pub fn was_added(&self) -> bool {
        matches!(self, Self::Added { .. })
    }
}

type MapCallback<K, V> = dyn Fn(&MapChange<K, V>) + Send + Sync;

struct MapInner<K, V> {
    entries: IndexMap<K, V>,
    subscribers: Vec<Weak<MapCallback<K, V>>>,
}

/// A shared, observable, insertion-ordered map.
pub struct ObservableMap<K, V> {
    inner: Arc<Mutex<MapInner<K, V>>>,
}

impl<K, V> Clone for ObservableMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> ObservableMap<K, V> {
    fn lock(&self) -> MutexGuard<'_, MapInner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ObservableMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.lock().entries.iter()).finish()
    }
}

impl<K: Hash + Eq + Clone, V: PartialEq + Clone> PartialEq for ObservableMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        let mine: Vec<(K, V)> = self
            .lock()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let theirs = other.lock();
        mine.len() == theirs.entries.len()
            && mine
                .iter()
                .zip(theirs.entries.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
    }
}

impl<K, V> Default for ObservableMap<K, V>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> From<IndexMap<K, V>> for ObservableMap<K, V>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    fn from(entries: IndexMap<K, V>) -> Self {
        Self::from_entries(entries)
    }
}

impl<K, V> FromIterator<(K, V)> for ObservableMap<K, V>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(iter.into_iter().collect())
    }
}

impl<K, V> ObservableMap<K, V>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::from_entries(IndexMap::new())
    }

    /// Create a map seeded with `entries`. Seeding publishes nothing.
    #[must_use]
    pub fn from_entries(entries: IndexMap<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MapInner {
                entries,
                subscribers: Vec::new(),
            })),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Clone out the value under `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().entries.get(key).cloned()
    }

    /// Keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.lock().entries.keys().cloned().collect()
    }

    /// Snapshot of every entry in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<(K, V)> {
        self.lock()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Borrow the underlying map.
    ///
    /// The map stays locked while `f` runs; touching it from `f` deadlocks.
    pub fn with<R>(&self, f: impl FnOnce(&IndexMap<K, V>) -> R) -> R {
        f(&self.lock().entries)
    }

    /// Insert `value` under `key`, returning the previous value.
    ///
    /// Publishes [`MapChange::Added`] unless `value` equals what is stored.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let (replaced, callbacks) = {
            let mut inner = self.lock();
            if inner.entries.get(&key) == Some(&value) {
                return Some(value);
            }
            let replaced = inner.entries.insert(key.clone(), value.clone());
            (replaced, live_callbacks(&mut inner))
        };
        notify(
            &callbacks,
            &MapChange::Added {
                key,
                value,
                replaced: replaced.clone(),
            },
        );
        replaced
    }

    /// Insert the value produced by `make` when `key` is absent.
    ///
    /// Returns the value now stored under `key`. The check and the insert
    /// happen under one lock; `make` must not touch this map.
    pub fn insert_if_absent(&self, key: K, make: impl FnOnce() -> V) -> V {
        let (value, callbacks) = {
            let mut inner = self.lock();
            if let Some(existing) = inner.entries.get(&key) {
                return existing.clone();
            }
            let value = make();
            inner.entries.insert(key.clone(), value.clone());
            (value, live_callbacks(&mut inner))
        };
        notify(
            &callbacks,
            &MapChange::Added {
                key,
                value: value.clone(),
                replaced: None,
            },
        );
        value
    }

    /// Remove `key`, publishing [`MapChange::Removed`] if it was present.
    pub fn remove(&self, key: &K) -> Option<V> {
        let (value, callbacks) = {
            let mut inner = self.lock();
            let value = inner.entries.shift_remove(key)?;
            (value, live_callbacks(&mut inner))
        };
        notify(
            &callbacks,
            &MapChange::Removed {
                key: key.clone(),
                value: value.clone(),
            },
        );
        Some(value)
    }

    /// Edit the value under `key` in place without publishing a change.
    ///
    /// Returns `None` when `key` is absent. `f` runs under the map's lock
    /// and must not touch this map.
    pub fn update<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let mut inner = self.lock();
        inner.entries.get_mut(key).map(f)
    }

    /// Register `callback` for every published change.
    #[must_use = "dropping the subscription detaches the callback"]
    pub fn subscribe(
        &self,
        callback: impl Fn(&MapChange<K, V>) + Send + Sync + 'static,
    ) -> Subscription {
        let strong: Arc<MapCallback<K, V>> = Arc::new(callback);
        self.lock().subscribers.push(Arc::downgrade(&strong));
        Subscription::new(strong)
    }

    /// Whether both handles refer to the same map.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

fn live_callbacks<K, V>(inner: &mut MapInner<K, V>) -> Vec<Arc<MapCallback<K, V>>> {
    inner.subscribers.retain(|weak| weak.strong_count() > 0);
    inner.subscribers.iter().filter_map(Weak::upgrade).collect()
}

fn notify<K, V>(callbacks: &[Arc<MapCallback<K, V>>], change: &MapChange<K, V>) {
    for callback in callbacks {
        callback(change);
    }
}
