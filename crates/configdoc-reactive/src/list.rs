#![forbid(unsafe_code)]

//! Observable ordered sequences.
//!
//! [`ObservableList<T>`] is a shared `Vec<T>` that reports structural
//! changes (additions and removals) to its subscribers as a [`ListChange`].
//! Reads hand out snapshots, so callers never observe a half-applied
//! mutation and subscribers may freely mutate the list they listen to.
//!
//! # Invariants
//!
//! 1. Exactly one [`ListChange`] is published per mutating call that changed
//!    the list; calls that change nothing publish nothing.
//! 2. `added` lists elements in the order they were inserted.
//! 3. Subscribers are notified in registration order, after the list has
//!    been updated and with no lock held.
//! 4. Every mutation bumps an internal version; [`ObservableList::retain`]
//!    uses it to detect writes that raced its predicate.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::observable::Subscription;

/// A structural change to an [`ObservableList`].
#[derive(Debug, Clone, PartialEq)]
pub struct ListChange<T> {
    /// Index of the first affected position.
    pub from: usize,
    /// Elements inserted by the mutation, in insertion order.
    pub added: Vec<T>,
    /// Elements removed by the mutation, in their former order.
    pub removed: Vec<T>,
}

impl<T> ListChange<T> {
    /// Whether the change inserted anything.
    #[must_use]
    pub fn was_added(&self) -> bool {
        !self.added.is_empty()
    }

    /// Whether the change removed anything.
    #[must_use]
    pub fn was_removed(&self) -> bool {
        !self.removed.is_empty()
    }
}

type ListCallback<T> = dyn Fn(&ListChange<T>) + Send + Sync;

struct ListInner<T> {
    items: Vec<T>,
    version: u64,
    subscribers: Vec<Weak<ListCallback<T>>>,
}

/// A shared, observable ordered sequence.
pub struct ObservableList<T> {
    inner: Arc<Mutex<ListInner<T>>>,
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> ObservableList<T> {
    fn lock(&self) -> MutexGuard<'_, ListInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.lock().items.iter()).finish()
    }
}

impl<T: Clone + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> ObservableList<T> {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Create a list seeded with `items`. Seeding publishes nothing.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ListInner {
                items,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Clone out the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.lock().items.get(index).cloned()
    }

    /// Snapshot of the current contents.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    /// Borrow the current contents.
    ///
    /// The list stays locked while `f` runs; touching it from `f` deadlocks.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.lock().items)
    }

    /// Append one element.
    pub fn push(&self, item: T) {
        self.extend(std::iter::once(item));
    }

    /// Append every element of `items`, publishing a single change.
    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        let added: Vec<T> = items.into_iter().collect();
        if added.is_empty() {
            return;
        }
        let (from, callbacks) = {
            let mut inner = self.lock();
            let from = inner.items.len();
            inner.items.extend(added.iter().cloned());
            inner.version += 1;
            (from, live_callbacks(&mut inner))
        };
        notify(
            &callbacks,
            &ListChange {
                from,
                added,
                removed: Vec::new(),
            },
        );
    }

    /// Insert `item` at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&self, index: usize, item: T) {
        let callbacks = {
            let mut inner = self.lock();
            inner.items.insert(index, item.clone());
            inner.version += 1;
            live_callbacks(&mut inner)
        };
        notify(
            &callbacks,
            &ListChange {
                from: index,
                added: vec![item],
                removed: Vec::new(),
            },
        );
    }

    /// Remove and return the element at `index`, if any.
    pub fn remove(&self, index: usize) -> Option<T> {
        let (removed, callbacks) = {
            let mut inner = self.lock();
            if index >= inner.items.len() {
                return None;
            }
            let removed = inner.items.remove(index);
            inner.version += 1;
            (removed, live_callbacks(&mut inner))
        };
        notify(
            &callbacks,
            &ListChange {
                from: index,
                added: Vec::new(),
                removed: vec![removed.clone()],
            },
        );
        Some(removed)
    }

    /// Remove the first element equal to `item`. Returns whether one was found.
    pub fn remove_item(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        let position = self.lock().items.iter().position(|it| it == item);
        match position {
            Some(index) => self.remove(index).is_some(),
            None => false,
        }
    }

    /// Keep only the elements matching `keep`, publishing one change for
    /// everything dropped.
    ///
    /// `keep` runs on a snapshot with the list unlocked, so it may read the
    /// list. If the list changes while `keep` runs, the pass starts over on
    /// the new contents.
    pub fn retain(&self, mut keep: impl FnMut(&T) -> bool) {
        let (from, removed, callbacks) = loop {
            let (snapshot, version) = {
                let inner = self.lock();
                (inner.items.clone(), inner.version)
            };
            let verdicts: Vec<bool> = snapshot.iter().map(&mut keep).collect();

            let mut inner = self.lock();
            if inner.version != version {
                continue;
            }
            if verdicts.iter().all(|kept| *kept) {
                return;
            }
            let mut removed = Vec::new();
            let mut from = None;
            let mut kept = Vec::with_capacity(inner.items.len());
            for (index, (item, keep_it)) in inner.items.drain(..).zip(verdicts).enumerate() {
                if keep_it {
                    kept.push(item);
                } else {
                    from.get_or_insert(index);
                    removed.push(item);
                }
            }
            inner.items = kept;
            inner.version += 1;
            break (from.unwrap_or(0), removed, live_callbacks(&mut inner));
        };
        notify(
            &callbacks,
            &ListChange {
                from,
                added: Vec::new(),
                removed,
            },
        );
    }

    /// Remove every element.
    pub fn clear(&self) {
        self.retain(|_| false);
    }

    /// Register `callback` for every structural change.
    #[must_use = "dropping the subscription detaches the callback"]
    pub fn subscribe(
        &self,
        callback: impl Fn(&ListChange<T>) + Send + Sync + 'static,
    ) -> Subscription {
        let strong: Arc<ListCallback<T>> = Arc::new(callback);
        self.lock().subscribers.push(Arc::downgrade(&strong));
        Subscription::new(strong)
    }

    /// Whether both handles refer to the same list.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

fn live_callbacks<T>(inner: &mut ListInner<T>) -> Vec<Arc<ListCallback<T>>> {
    inner.subscribers.retain(|weak| weak.strong_count() > 0);
    inner.subscribers.iter().filter_map(Weak::upgrade).collect()
}

fn notify<T>(callbacks: &[Arc<ListCallback<T>>], change: &ListChange<T>) {
    for callback in callbacks {
        callback(change);
    }
}
