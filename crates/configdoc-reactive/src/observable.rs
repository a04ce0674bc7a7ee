#![forbid(unsafe_code)]

//! Shared, version-tracked value cells with change notification.
//!
//! # Design
//!
//! [`Observable<T>`] stores its value, a version counter and the subscriber
//! list behind `Arc<Mutex<..>>`. Cloning an `Observable` yields another
//! handle to the **same** cell; [`Observable::ptr_eq`] tells handles apart
//! from equal-valued but distinct cells.
//!
//! Subscribers are stored as `Weak` callbacks. The strong side lives in the
//! [`Subscription`] returned by [`Observable::subscribe`], so dropping the
//! subscription detaches the callback. Dead entries are pruned lazily during
//! the next notification.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op.
//! 4. No lock is held while callbacks run, so a callback may read or write
//!    the observable that notified it.
//!
//! # Failure Modes
//!
//! - Callback panics: the new value is already stored and the version bumped;
//!   remaining subscribers are skipped for that cycle.
//! - A panic inside [`Observable::with`] poisons the lock; later accesses
//!   recover the inner state rather than propagating the poison.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Callback<T> = dyn Fn(&T) + Send + Sync;

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<Weak<Callback<T>>>,
}

/// A shared value cell that notifies subscribers when it changes.
pub struct Observable<T> {
    inner: Arc<Mutex<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Observable<T> {
    fn lock(&self) -> MutexGuard<'_, ObservableInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new cell holding `value` at version 0.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.lock().value.clone()
    }

    /// Access the current value by reference.
    ///
    /// The cell stays locked while `f` runs; touching it from `f` deadlocks.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock().value)
    }

    /// Replace the value, notifying subscribers if it changed.
    ///
    /// Returns `true` when the value changed.
    pub fn set(&self, value: T) -> bool {
        let callbacks = {
            let mut inner = self.lock();
            if inner.value == value {
                return false;
            }
            inner.value = value;
            inner.version += 1;
            Self::live_callbacks(&mut inner)
        };
        self.notify(&callbacks);
        true
    }

    /// Mutate the value in place, notifying subscribers if it changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    /// Register `callback` to run after every change.
    ///
    /// The callback stays attached for as long as the returned
    /// [`Subscription`] is alive.
    #[must_use = "dropping the subscription detaches the callback"]
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let strong: Arc<Callback<T>> = Arc::new(callback);
        self.lock().subscribers.push(Arc::downgrade(&strong));
        Subscription::new(strong)
    }

    /// Version counter; bumped once per effective change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock()
            .subscribers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Whether both handles refer to the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn live_callbacks(inner: &mut ObservableInner<T>) -> Vec<Arc<Callback<T>>> {
        inner.subscribers.retain(|weak| weak.strong_count() > 0);
        inner.subscribers.iter().filter_map(Weak::upgrade).collect()
    }

    fn notify(&self, callbacks: &[Arc<Callback<T>>]) {
        if callbacks.is_empty() {
            return;
        }
        let value = self.get();
        for callback in callbacks {
            callback(&value);
        }
    }
}

/// RAII guard keeping a subscriber callback alive.
///
/// Dropping the guard detaches the callback before the next notification.
/// Guards are `Send`, so they may be dropped on another thread.
pub struct Subscription {
    _guard: Box<dyn Any + Send + Sync>,
}

impl Subscription {
    pub(crate) fn new<C: ?Sized + Send + Sync + 'static>(callback: Arc<C>) -> Self {
        Self {
            _guard: Box::new(callback),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
