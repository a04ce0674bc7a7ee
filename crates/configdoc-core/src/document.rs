#![forbid(unsafe_code)]

//! The reactive document node.
//!
//! A [`DocumentProperty`] wraps one [`RawMap`] and projects it as typed,
//! observable views: one [`ScalarCell`] per scalar key and one child list
//! per list-of-maps key. Raw store and views are kept in agreement in both
//! directions:
//!
//! ```text
//!   raw write (put / data().insert)        view write (cell.set / list.push)
//!               │                                       │
//!               ▼                                       ▼
//!     on_raw_change ──► cells / child lists    write-back ──► raw store
//!               ▲                                       │
//!               └──────── skipped while silenced ◄──────┘
//! ```
//!
//! # Invariants
//!
//! 1. At most one cell and at most one child list exist per key, and once
//!    created they are never replaced: later raw writes change their
//!    contents only.
//! 2. Every registered cell and child list carries exactly one write-back
//!    listener, whichever path created it.
//! 3. Write-backs run with the document's monitor silenced, so they never
//!    re-enter the raw-to-view path of the same document.
//! 4. Only additions in the raw store are projected. Removing a key leaves
//!    its cell or list in place with its last contents.
//! 5. A key holds either a cell or a child list. [`DocumentProperty::put`]
//!    refuses values that would put the two views of a key at odds.
//!
//! # Concurrency
//!
//! Documents are `Send + Sync`: the raw store, the caches and every view are
//! behind their own locks, so a tree can be loaded on one thread and handed
//! to another, and concurrent reads and writes never tear a value. Cell and
//! list creation is atomic per key. Propagation is synchronous on the
//! writing thread and finishes before the triggering call returns.
//!
//! Suppression of write-back echoes is one counter per document. Two threads
//! mutating the same document at once may have one thread's raw write
//! skipped while the other thread's write-back is in flight, so concurrent
//! writers on one document must coordinate among themselves.
//!
//! # Failure Modes
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | `put` of a value the key's cell cannot hold | `TypeMismatch`, store untouched |
//! | `put` of a non-list onto a key with a child list | `TypeMismatch`, store untouched |
//! | `observable_list_of` with a kind the factory does not assign | `ListKindMismatch`, nothing installed |
//! | `data().insert` of a value that does not fit the key's views | value stored, views unchanged, `warn!` |

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use configdoc_reactive::{BindingScope, ListChange, MapChange, Observable, ObservableList};
use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::cell::{
    BooleanProperty, DoubleProperty, IntegerProperty, LongProperty, ObjectProperty, ScalarCell,
    StringProperty,
};
use crate::error::{DocumentError, Result};
use crate::factory::{DocumentFactory, DocumentKind};
use crate::monitor::EventMonitor;
use crate::value::{RawMap, Value, maps_in};

/// A child list together with the kind its elements were created as.
#[derive(Clone)]
struct ChildList {
    kind: DocumentKind,
    list: ObservableList<DocumentProperty>,
}

struct DocumentInner {
    kind: DocumentKind,
    config: RawMap,
    properties: Mutex<IndexMap<String, ScalarCell>>,
    documents: Mutex<IndexMap<String, ChildList>>,
    monitor: Arc<EventMonitor>,
    factory: DocumentFactory,
    scope: Mutex<BindingScope>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A node of the configuration tree.
///
/// Cloning yields another handle to the same node. Equality compares the
/// raw data, which is also how child lists identify elements to remove.
#[derive(Clone)]
pub struct DocumentProperty {
    inner: Arc<DocumentInner>,
}

impl DocumentProperty {
    /// Wrap `data` as a generic document with the default factory.
    #[must_use]
    pub fn new(data: RawMap) -> Self {
        Self::with_factory(DocumentKind::GENERIC, data, DocumentFactory::new())
    }

    /// Wrap `data` as a document of `kind`, resolving children with
    /// `factory`.
    ///
    /// `data` is shared, not copied: later writes through either handle are
    /// seen by the other.
    #[must_use]
    pub fn with_factory(kind: DocumentKind, data: RawMap, factory: DocumentFactory) -> Self {
        let doc = Self {
            inner: Arc::new(DocumentInner {
                kind,
                config: data,
                properties: Mutex::new(IndexMap::new()),
                documents: Mutex::new(IndexMap::new()),
                monitor: Arc::new(EventMonitor::new()),
                factory,
                scope: Mutex::new(BindingScope::new()),
            }),
        };

        let weak: Weak<DocumentInner> = Arc::downgrade(&doc.inner);
        lock(&doc.inner.scope).observe_map(&doc.inner.config, move |change| {
            if let Some(inner) = weak.upgrade() {
                Self { inner }.on_raw_change(change);
            }
        });
        doc
    }

    /// The kind the factory assigned to this document.
    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.inner.kind
    }

    /// The factory used to wrap child documents.
    #[must_use]
    pub fn factory(&self) -> &DocumentFactory {
        &self.inner.factory
    }

    /// The live raw store.
    ///
    /// Inserting through this handle is observed like [`put`](Self::put).
    /// Editing a nested list in place is not observed, and leaves any child
    /// list on that key out of date.
    #[must_use]
    pub fn data(&self) -> RawMap {
        self.inner.config.clone()
    }

    /// Whether both handles refer to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // -----------------------------------------------------------------------
    // Raw accessors
    // -----------------------------------------------------------------------

    /// The raw value under `key`. Never creates a view.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.config.get(&key.to_owned())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.config.contains_key(&key.to_owned())
    }

    /// Keys of the raw store in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.config.keys()
    }

    pub fn get_as_string(&self, key: &str) -> Result<Option<String>> {
        self.get_as(key, "string", |v| v.as_str().map(str::to_owned))
    }

    pub fn get_as_bool(&self, key: &str) -> Result<Option<bool>> {
        self.get_as(key, "bool", Value::as_bool)
    }

    pub fn get_as_int(&self, key: &str) -> Result<Option<i32>> {
        self.get_as(key, "int", Value::as_int)
    }

    pub fn get_as_long(&self, key: &str) -> Result<Option<i64>> {
        self.get_as(key, "long", Value::as_long)
    }

    pub fn get_as_double(&self, key: &str) -> Result<Option<f64>> {
        self.get_as(key, "double", Value::as_double)
    }

    fn get_as<T>(
        &self,
        key: &str,
        expected: &'static str,
        read: impl FnOnce(&Value) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => read(&value)
                .map(Some)
                .ok_or_else(|| DocumentError::type_mismatch(key, expected, value.type_name())),
        }
    }

    /// Write a raw value, updating the views of `key`.
    ///
    /// Fails without touching the store when `key` already has a cell that
    /// cannot hold `value` (only object cells take lists), or a child list
    /// and `value` is not a list. Returns the previous raw value.
    ///
    /// An integer is stored at the width it was written with: putting
    /// `7_i64` on a key with an `i32` cell stores `Long(7)` and sets the
    /// cell to `7`.
    pub fn put(&self, key: &str, value: impl Into<Value>) -> Result<Option<Value>> {
        let value = value.into();
        if let Some(cell) = self.cell(key) {
            if !cell.accepts(&value) {
                return Err(DocumentError::type_mismatch(
                    key,
                    cell.type_name(),
                    value.type_name(),
                ));
            }
        } else if !value.is_list() && self.has_child_list(key) {
            return Err(DocumentError::type_mismatch(key, "list", value.type_name()));
        }
        Ok(self.inner.config.insert(key.to_owned(), value))
    }

    /// Write every entry of `entries` in order, as [`put`](Self::put) does.
    ///
    /// Stops at the first rejected entry; earlier entries stay written.
    pub fn put_all<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (key, value) in entries {
            self.put(key.as_ref(), value)?;
        }
        Ok(())
    }

    /// Remove `key` from the raw store.
    ///
    /// Views already created for `key` are left as they are.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.config.remove(&key.to_owned())
    }

    // -----------------------------------------------------------------------
    // Scalar views
    // -----------------------------------------------------------------------

    /// The string cell for `key`, created on first use.
    pub fn string_property_of(&self, key: &str) -> Result<StringProperty> {
        let cell = self.property_of(key, |doc| {
            Ok(ScalarCell::String(Observable::new(
                doc.get_as_string(key)?.unwrap_or_default(),
            )))
        })?;
        match cell {
            ScalarCell::String(p) => Ok(p),
            other => Err(DocumentError::type_mismatch(key, "string", other.type_name())),
        }
    }

    /// The boolean cell for `key`, created on first use.
    pub fn boolean_property_of(&self, key: &str) -> Result<BooleanProperty> {
        let cell = self.property_of(key, |doc| {
            Ok(ScalarCell::Boolean(Observable::new(
                doc.get_as_bool(key)?.unwrap_or(false),
            )))
        })?;
        match cell {
            ScalarCell::Boolean(p) => Ok(p),
            other => Err(DocumentError::type_mismatch(key, "bool", other.type_name())),
        }
    }

    /// The `i32` cell for `key`, created on first use.
    pub fn integer_property_of(&self, key: &str) -> Result<IntegerProperty> {
        let cell = self.property_of(key, |doc| {
            Ok(ScalarCell::Integer(Observable::new(
                doc.get_as_int(key)?.unwrap_or(0),
            )))
        })?;
        match cell {
            ScalarCell::Integer(p) => Ok(p),
            other => Err(DocumentError::type_mismatch(key, "int", other.type_name())),
        }
    }

    /// The `i64` cell for `key`, created on first use.
    pub fn long_property_of(&self, key: &str) -> Result<LongProperty> {
        let cell = self.property_of(key, |doc| {
            Ok(ScalarCell::Long(Observable::new(
                doc.get_as_long(key)?.unwrap_or(0),
            )))
        })?;
        match cell {
            ScalarCell::Long(p) => Ok(p),
            other => Err(DocumentError::type_mismatch(key, "long", other.type_name())),
        }
    }

    /// The `f64` cell for `key`, created on first use.
    pub fn double_property_of(&self, key: &str) -> Result<DoubleProperty> {
        let cell = self.property_of(key, |doc| {
            Ok(ScalarCell::Double(Observable::new(
                doc.get_as_double(key)?.unwrap_or(0.0),
            )))
        })?;
        match cell {
            ScalarCell::Double(p) => Ok(p),
            other => Err(DocumentError::type_mismatch(key, "double", other.type_name())),
        }
    }

    /// The untyped cell for `key`, created on first use.
    ///
    /// Setting it to `None` removes the key from the raw store.
    pub fn object_property_of(&self, key: &str) -> Result<ObjectProperty> {
        let cell = self.property_of(key, |doc| Ok(ScalarCell::Object(Observable::new(doc.get(key)))))?;
        match cell {
            ScalarCell::Object(p) => Ok(p),
            other => Err(DocumentError::type_mismatch(key, "object", other.type_name())),
        }
    }

    /// The cached cell for `key`, if any view has been created for it.
    #[must_use]
    pub fn cell(&self, key: &str) -> Option<ScalarCell> {
        lock(&self.inner.properties).get(key).cloned()
    }

    fn property_of(
        &self,
        key: &str,
        create: impl FnOnce(&Self) -> Result<ScalarCell>,
    ) -> Result<ScalarCell> {
        if let Some(cell) = self.cell(key) {
            return Ok(cell);
        }
        let cell = create(self)?;
        Ok(self.register_cell(key, cell))
    }

    /// Wire `cell` to write back into the raw store and cache it.
    ///
    /// If another caller cached a cell for `key` first, that cell is returned
    /// and `cell` is dropped unwired.
    fn register_cell(&self, key: &str, cell: ScalarCell) -> ScalarCell {
        let config = self.inner.config.clone();
        let monitor = Arc::clone(&self.inner.monitor);
        let owned_key = key.to_owned();
        let sub = cell.subscribe_raw(move |value| {
            let _silence = monitor.silence();
            trace!(key = %owned_key, "cell write-back");
            match value {
                Some(value) => {
                    // Keep an integer stored at its written width.
                    let stored = config.get(&owned_key);
                    if !stored.is_some_and(|raw| raw.same_integer(&value)) {
                        config.insert(owned_key.clone(), value);
                    }
                }
                None => {
                    config.remove(&owned_key);
                }
            }
        });

        {
            let mut properties = lock(&self.inner.properties);
            if let Some(existing) = properties.get(key) {
                return existing.clone();
            }
            properties.insert(key.to_owned(), cell.clone());
        }
        lock(&self.inner.scope).hold(sub);
        trace!(key, kind = %self.inner.kind, cell = cell.type_name(), "cell registered");
        cell
    }

    // -----------------------------------------------------------------------
    // Child documents
    // -----------------------------------------------------------------------

    /// The child list for `key`, created on first use.
    ///
    /// A new list is seeded from the map-shaped elements already stored under
    /// `key`. The kind of a list is fixed by the factory; asking for any other
    /// kind fails, and when no list exists yet the failure leaves the
    /// document untouched.
    pub fn observable_list_of(
        &self,
        key: &str,
        kind: DocumentKind,
    ) -> Result<ObservableList<DocumentProperty>> {
        let mismatch = |found| DocumentError::ListKindMismatch {
            key: key.to_owned(),
            expected: kind,
            found,
        };
        let existing = lock(&self.inner.documents).get(key).cloned();
        let child_list = match existing {
            Some(child_list) => child_list,
            None => {
                let assigned = self.inner.factory.kind_for(key);
                if assigned != kind {
                    return Err(mismatch(assigned));
                }
                let seed = match self.get(key) {
                    Some(Value::List(items)) => self.wrap_maps(key, &items),
                    _ => Vec::new(),
                };
                self.install_list(key, seed)
            }
        };
        if child_list.kind != kind {
            return Err(mismatch(child_list.kind));
        }
        Ok(child_list.list)
    }

    fn has_child_list(&self, key: &str) -> bool {
        lock(&self.inner.documents).contains_key(key)
    }

    /// Every child list created so far, in creation order.
    #[must_use]
    pub fn children_property(&self) -> Vec<ObservableList<DocumentProperty>> {
        lock(&self.inner.documents)
            .values()
            .map(|child_list| child_list.list.clone())
            .collect()
    }

    /// Fresh documents for every map inside every list of the raw store.
    ///
    /// Recomputed on each call; the returned documents are new handles over
    /// the shared raw maps and are not the elements of any child list.
    #[must_use]
    pub fn children(&self) -> Vec<DocumentProperty> {
        let entries = self.inner.config.entries();
        entries
            .iter()
            .filter_map(|(key, value)| value.as_list().map(|items| (key, items)))
            .flat_map(|(key, items)| self.wrap_maps(key, items))
            .collect()
    }

    /// Wrap `data`, found under `key`, through the factory.
    #[must_use]
    pub fn create_document(&self, key: &str, data: RawMap) -> DocumentProperty {
        self.inner.factory.create_document(key, data)
    }

    fn wrap_maps(&self, key: &str, items: &[Value]) -> Vec<DocumentProperty> {
        maps_in(items)
            .map(|map| self.create_document(key, map.clone()))
            .collect()
    }

    /// Create, wire and cache the child list for `key`.
    ///
    /// If another caller cached a list for `key` first, that list is returned.
    fn install_list(&self, key: &str, seed: Vec<DocumentProperty>) -> ChildList {
        let _span = tracing::debug_span!("install_list", key, seeded = seed.len()).entered();

        let child_list = ChildList {
            kind: self.inner.factory.kind_for(key),
            list: ObservableList::from_vec(seed),
        };

        let config = self.inner.config.clone();
        let monitor = Arc::clone(&self.inner.monitor);
        let list = child_list.list.clone();
        let owned_key = key.to_owned();
        let sub = child_list.list.subscribe(
            move |change: &ListChange<DocumentProperty>| {
                let _silence = monitor.silence();
                trace!(
                    key = %owned_key,
                    added = change.added.len(),
                    removed = change.removed.len(),
                    "child list write-back"
                );
                let anchor = list
                    .get(change.from + change.added.len())
                    .filter(|_| change.was_added())
                    .map(|doc| doc.data());
                let applied = config.update(&owned_key, |raw| match raw {
                    Value::List(items) => {
                        apply_list_change(items, change, anchor.as_ref());
                        true
                    }
                    _ => false,
                });
                if applied != Some(true) {
                    // The raw list was removed or replaced by a scalar.
                    config.insert(owned_key.clone(), Value::List(raw_items(&list.to_vec())));
                }
            },
        );

        {
            let mut documents = lock(&self.inner.documents);
            if let Some(existing) = documents.get(key) {
                return existing.clone();
            }
            documents.insert(key.to_owned(), child_list.clone());
        }
        lock(&self.inner.scope).hold(sub);

        self.inner.monitor.run_silently(|| {
            let seeded = child_list.list.to_vec();
            self.inner
                .config
                .insert_if_absent(key.to_owned(), || Value::List(raw_items(&seeded)));
        });
        debug!(kind = %child_list.kind, "child list installed");
        child_list
    }

    // -----------------------------------------------------------------------
    // Raw -> view synchronization
    // -----------------------------------------------------------------------

    fn on_raw_change(&self, change: &MapChange<String, Value>) {
        if !self.inner.monitor.events_enabled() {
            return;
        }
        let MapChange::Added { key, value, .. } = change else {
            trace!(key = %change.key(), "raw removal ignored");
            return;
        };
        trace!(key = %key, value = value.type_name(), "raw change");
        match value {
            // A key with a cell is not a child-list key, even for lists.
            Value::List(items) if self.cell(key).is_none() => self.on_list_added(key, items),
            other => self.on_scalar_added(key, other),
        }
    }

    fn on_list_added(&self, key: &str, items: &[Value]) {
        let existing = lock(&self.inner.documents).get(key).cloned();
        let children = self.wrap_maps(key, items);
        match existing {
            None => {
                if !children.is_empty() {
                    self.install_list(key, children);
                }
            }
            Some(child_list) => {
                // The new raw list replaced the one the child list mirrors.
                // Restore the mirrored contents so the append below lands on
                // top of them.
                self.inner.monitor.run_silently(|| {
                    let current = raw_items(&child_list.list.to_vec());
                    self.inner.config.update(&key.to_owned(), |raw| {
                        *raw = Value::List(current);
                    });
                });
                child_list.list.extend(children);
            }
        }
    }

    fn on_scalar_added(&self, key: &str, value: &Value) {
        match self.cell(key) {
            Some(cell) => {
                if !cell.assign(value) {
                    warn!(
                        key,
                        cell = cell.type_name(),
                        value = value.type_name(),
                        "raw write does not fit the cell on this key; cell left unchanged"
                    );
                }
            }
            None if self.has_child_list(key) => {
                warn!(
                    key,
                    value = value.type_name(),
                    "raw write replaced the list behind a child list; child list left unchanged"
                );
            }
            None => {
                self.register_cell(key, ScalarCell::for_value(value));
            }
        }
    }
}

/// The raw maps backing `docs`, as list elements.
fn raw_items(docs: &[DocumentProperty]) -> Vec<Value> {
    docs.iter().map(|doc| Value::Map(doc.data())).collect()
}

/// Mirror one child-list change onto the raw list.
///
/// Removed documents drop their own raw map, or failing that the first raw
/// map equal to their data. Added documents go in front of `anchor` (the raw
/// map of the element that now follows them) or at the end.
fn apply_list_change(
    items: &mut Vec<Value>,
    change: &ListChange<DocumentProperty>,
    anchor: Option<&RawMap>,
) {
    for removed in &change.removed {
        let data = removed.data();
        let pos = items
            .iter()
            .position(|item| item.as_map().is_some_and(|map| map.ptr_eq(&data)))
            .or_else(|| {
                items
                    .iter()
                    .position(|item| item.as_map().is_some_and(|map| *map == data))
            });
        if let Some(pos) = pos {
            items.remove(pos);
        }
    }

    let at = anchor
        .and_then(|anchor| {
            items
                .iter()
                .position(|item| item.as_map().is_some_and(|map| map.ptr_eq(anchor)))
        })
        .unwrap_or(items.len());
    for (offset, doc) in change.added.iter().enumerate() {
        items.insert(at + offset, Value::Map(doc.data()));
    }
}

impl PartialEq for DocumentProperty {
    fn eq(&self, other: &Self) -> bool {
        self.inner.config == other.inner.config
    }
}

impl fmt::Debug for DocumentProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells = lock(&self.inner.properties).len();
        let lists = lock(&self.inner.documents).len();
        f.debug_struct("DocumentProperty")
            .field("kind", &self.inner.kind)
            .field("data", &self.inner.config)
            .field("cells", &cells)
            .field("lists", &lists)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::raw_map;

    fn table_doc() -> DocumentProperty {
        DocumentProperty::with_factory(
            DocumentKind::TABLE,
            RawMap::new(),
            DocumentFactory::project_tree(),
        )
    }

    fn column(name: &str) -> RawMap {
        raw_map([("name", name)])
    }

    #[test]
    fn put_then_property_reflects_value() {
        let doc = DocumentProperty::new(RawMap::new());
        doc.put("name", "users").unwrap();
        let name = doc.string_property_of("name").unwrap();
        assert_eq!(name.get(), "users");

        name.set("accounts".to_string());
        assert_eq!(doc.get("name"), Some(Value::from("accounts")));
    }

    #[test]
    fn raw_write_creates_wired_cell() {
        let doc = DocumentProperty::new(RawMap::new());
        doc.put("port", 5432).unwrap();

        let cell = doc.cell("port").expect("cell created by raw write");
        assert_eq!(cell.listener_count(), 1);

        let port = doc.integer_property_of("port").unwrap();
        assert!(matches!(&cell, ScalarCell::Integer(p) if p.ptr_eq(&port)));
        port.set(3306);
        assert_eq!(doc.get_as_int("port").unwrap(), Some(3306));
    }

    #[test]
    fn raw_write_reuses_cell() {
        let doc = DocumentProperty::new(RawMap::new());
        let enabled = doc.boolean_property_of("enabled").unwrap();
        assert!(!enabled.get());
        assert_eq!(doc.get("enabled"), None, "creating a cell writes nothing");

        doc.put("enabled", true).unwrap();
        assert!(enabled.get());
        assert!(doc.boolean_property_of("enabled").unwrap().ptr_eq(&enabled));
        assert_eq!(doc.cell("enabled").unwrap().listener_count(), 1);
    }

    #[test]
    fn cell_write_does_not_feed_back() {
        let doc = DocumentProperty::new(RawMap::new());
        let name = doc.string_property_of("name").unwrap();
        name.set("a".into());
        name.set("b".into());

        assert_eq!(name.version(), 2);
        assert_eq!(doc.cell("name").unwrap().listener_count(), 1);
        assert!(doc.cell("name").unwrap().ptr_eq(&ScalarCell::String(name)));
    }

    #[test]
    fn put_rejects_value_foreign_to_cell() {
        let doc = DocumentProperty::new(RawMap::new());
        let port = doc.integer_property_of("port").unwrap();
        port.set(80);

        let err = doc.put("port", "eighty").unwrap_err();
        assert_eq!(err, DocumentError::type_mismatch("port", "int", "string"));
        assert_eq!(doc.get("port"), Some(Value::Int(80)));
    }

    #[test]
    fn direct_data_insert_is_projected() {
        let doc = DocumentProperty::new(RawMap::new());
        let name = doc.string_property_of("name").unwrap();
        doc.data().insert("name".into(), Value::from("orders"));
        assert_eq!(name.get(), "orders");
    }

    #[test]
    fn direct_data_insert_of_foreign_type_leaves_cell() {
        let doc = DocumentProperty::new(RawMap::new());
        let port = doc.integer_property_of("port").unwrap();
        port.set(1);
        doc.data().insert("port".into(), Value::from("one"));
        assert_eq!(port.get(), 1);
        assert_eq!(doc.get("port"), Some(Value::from("one")));
    }

    #[test]
    fn object_cell_none_removes_key() {
        let doc = DocumentProperty::new(raw_map([("extra", 1.5)]));
        let extra = doc.object_property_of("extra").unwrap();
        assert_eq!(extra.get(), Some(Value::Double(1.5)));

        extra.set(None);
        assert!(!doc.contains_key("extra"));
    }

    #[test]
    fn accessor_on_cell_of_other_variant_fails() {
        let doc = DocumentProperty::new(RawMap::new());
        doc.put("size", 3_i64).unwrap();
        assert!(matches!(
            doc.integer_property_of("size"),
            Err(DocumentError::TypeMismatch { expected: "int", found: "long", .. })
        ));
        assert!(doc.long_property_of("size").is_ok());
    }

    #[test]
    fn get_as_reports_mismatch_and_absence() {
        let doc = DocumentProperty::new(raw_map([("name", "id")]));
        assert_eq!(doc.get_as_int("missing"), Ok(None));
        assert!(matches!(
            doc.get_as_int("name"),
            Err(DocumentError::TypeMismatch { found: "string", .. })
        ));
        assert_eq!(doc.get_as_string("name"), Ok(Some("id".to_string())));
    }

    #[test]
    fn list_put_creates_child_list() {
        let doc = table_doc();
        doc.put(
            "columns",
            Value::List(vec![Value::Map(column("id")), Value::Map(column("name"))]),
        )
        .unwrap();

        let columns = doc
            .observable_list_of("columns", DocumentKind::COLUMN)
            .unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns.get(0).unwrap().get_as_string("name"), Ok(Some("id".into())));
        assert_eq!(columns.get(1).unwrap().kind(), DocumentKind::COLUMN);
    }

    #[test]
    fn list_put_without_maps_creates_nothing() {
        let doc = table_doc();
        doc.put("tags", Value::List(vec![Value::from("a")])).unwrap();
        assert!(doc.children_property().is_empty());
        assert!(doc.cell("tags").is_none());
    }

    #[test]
    fn list_push_appends_raw_map() {
        let doc = table_doc();
        let columns = doc
            .observable_list_of("columns", DocumentKind::COLUMN)
            .unwrap();
        assert_eq!(doc.get("columns"), Some(Value::List(vec![])));

        let id = doc.create_document("columns", column("id"));
        columns.push(id.clone());
        columns.push(doc.create_document("columns", column("name")));

        assert_eq!(
            doc.get("columns"),
            Some(Value::List(vec![
                Value::Map(column("id")),
                Value::Map(column("name")),
            ]))
        );

        columns.remove_item(&id);
        assert_eq!(
            doc.get("columns"),
            Some(Value::List(vec![Value::Map(column("name"))]))
        );
    }

    #[test]
    fn list_insert_keeps_raw_order() {
        let doc = table_doc();
        let columns = doc
            .observable_list_of("columns", DocumentKind::COLUMN)
            .unwrap();
        columns.push(doc.create_document("columns", column("a")));
        columns.push(doc.create_document("columns", column("c")));
        columns.insert(1, doc.create_document("columns", column("b")));

        assert_eq!(
            doc.get("columns"),
            Some(Value::List(vec![
                Value::Map(column("a")),
                Value::Map(column("b")),
                Value::Map(column("c")),
            ]))
        );
    }

    #[test]
    fn second_list_put_appends() {
        let doc = table_doc();
        doc.put("columns", Value::List(vec![Value::Map(column("a"))]))
            .unwrap();
        let columns = doc
            .observable_list_of("columns", DocumentKind::COLUMN)
            .unwrap();

        doc.put("columns", Value::List(vec![Value::Map(column("b"))]))
            .unwrap();

        assert_eq!(columns.len(), 2);
        assert_eq!(
            doc.get("columns"),
            Some(Value::List(vec![
                Value::Map(column("a")),
                Value::Map(column("b")),
            ]))
        );
    }

    #[test]
    fn list_identity_and_kind_check() {
        let doc = table_doc();
        let a = doc
            .observable_list_of("columns", DocumentKind::COLUMN)
            .unwrap();
        let b = doc
            .observable_list_of("columns", DocumentKind::COLUMN)
            .unwrap();
        assert!(a.ptr_eq(&b));

        assert_eq!(
            doc.observable_list_of("columns", DocumentKind::TABLE).unwrap_err(),
            DocumentError::ListKindMismatch {
                key: "columns".into(),
                expected: DocumentKind::TABLE,
                found: DocumentKind::COLUMN,
            }
        );
    }

    #[test]
    fn child_edits_are_visible_in_parent_data() {
        let doc = table_doc();
        doc.put("columns", Value::List(vec![Value::Map(column("id"))]))
            .unwrap();
        let child = doc
            .observable_list_of("columns", DocumentKind::COLUMN)
            .unwrap()
            .get(0)
            .unwrap();

        child.string_property_of("name").unwrap().set("uuid".into());

        let raw = doc.get("columns").unwrap();
        let first = raw.as_list().unwrap()[0].as_map().unwrap().clone();
        assert_eq!(first.get(&"name".into()), Some(Value::from("uuid")));
    }

    #[test]
    fn children_is_recomputed() {
        let doc = table_doc();
        doc.put("columns", Value::List(vec![Value::Map(column("id"))]))
            .unwrap();
        doc.put("indexes", Value::List(vec![Value::Map(raw_map([("name", "pk")]))]))
            .unwrap();

        let first = doc.children();
        let second = doc.children();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].kind(), DocumentKind::COLUMN);
        assert_eq!(first[1].kind(), DocumentKind::INDEX);
        assert_eq!(first, second);
        assert!(!first[0].ptr_eq(&second[0]));
    }

    #[test]
    fn removal_leaves_views_in_place() {
        let doc = DocumentProperty::new(RawMap::new());
        doc.put("name", "users").unwrap();
        let name = doc.string_property_of("name").unwrap();

        assert_eq!(doc.remove("name"), Some(Value::from("users")));
        assert_eq!(doc.get("name"), None);
        assert_eq!(name.get(), "users");
        assert!(doc.string_property_of("name").unwrap().ptr_eq(&name));
    }

    #[test]
    fn list_write_after_raw_removal_restores_list() {
        let doc = table_doc();
        let columns = doc
            .observable_list_of("columns", DocumentKind::COLUMN)
            .unwrap();
        columns.push(doc.create_document("columns", column("a")));
        doc.remove("columns");

        columns.push(doc.create_document("columns", column("b")));
        assert_eq!(
            doc.get("columns"),
            Some(Value::List(vec![
                Value::Map(column("a")),
                Value::Map(column("b")),
            ]))
        );
    }

    #[test]
    fn rejected_list_kind_installs_nothing() {
        let doc = table_doc();
        let err = doc
            .observable_list_of("columns", DocumentKind::INDEX)
            .unwrap_err();
        assert_eq!(
            err,
            DocumentError::ListKindMismatch {
                key: "columns".into(),
                expected: DocumentKind::INDEX,
                found: DocumentKind::COLUMN,
            }
        );
        assert!(doc.keys().is_empty());
        assert!(doc.children_property().is_empty());

        // The right kind still works afterwards and seeds from scratch.
        doc.observable_list_of("columns", DocumentKind::COLUMN)
            .unwrap();
        assert_eq!(doc.get("columns"), Some(Value::List(vec![])));
    }

    #[test]
    fn put_list_over_scalar_cell_is_rejected() {
        let doc = DocumentProperty::new(RawMap::new());
        let port = doc.integer_property_of("port").unwrap();
        port.set(5);

        let list = Value::List(vec![Value::Map(raw_map([("a", 1)]))]);
        assert_eq!(
            doc.put("port", list).unwrap_err(),
            DocumentError::type_mismatch("port", "int", "list")
        );
        assert_eq!(doc.get("port"), Some(Value::Int(5)));
        assert_eq!(doc.get_as_int("port"), Ok(Some(5)));
        assert!(doc.children_property().is_empty());
    }

    #[test]
    fn put_scalar_over_child_list_is_rejected() {
        let doc = table_doc();
        let columns = doc
            .observable_list_of("columns", DocumentKind::COLUMN)
            .unwrap();
        columns.push(doc.create_document("columns", column("id")));

        assert_eq!(
            doc.put("columns", "none").unwrap_err(),
            DocumentError::type_mismatch("columns", "list", "string")
        );
        assert_eq!(
            doc.put("columns", Value::Map(column("x"))).unwrap_err(),
            DocumentError::type_mismatch("columns", "list", "map")
        );
        assert_eq!(doc.get("columns"), Some(Value::List(vec![Value::Map(column("id"))])));
        assert!(doc.cell("columns").is_none());
    }

    #[test]
    fn object_cell_takes_a_list() {
        let doc = table_doc();
        let extra = doc.object_property_of("extra").unwrap();
        let list = Value::List(vec![Value::Map(column("id"))]);

        doc.put("extra", list.clone()).unwrap();
        assert_eq!(extra.get(), Some(list.clone()));
        assert_eq!(doc.get("extra"), Some(list));
        assert!(doc.children_property().is_empty());
    }

    #[test]
    fn foreign_scalar_insert_keeps_child_list() {
        let doc = table_doc();
        let columns = doc
            .observable_list_of("columns", DocumentKind::COLUMN)
            .unwrap();
        doc.data().insert("columns".into(), Value::from(3));

        assert!(doc.cell("columns").is_none());
        columns.push(doc.create_document("columns", column("id")));
        assert_eq!(doc.get("columns"), Some(Value::List(vec![Value::Map(column("id"))])));
    }

    #[test]
    fn integer_width_of_put_is_kept() {
        let doc = DocumentProperty::new(RawMap::new());
        let port = doc.integer_property_of("port").unwrap();
        port.set(1);

        doc.put("port", 7_i64).unwrap();
        assert_eq!(port.get(), 7);
        assert_eq!(doc.get("port"), Some(Value::Long(7)));

        port.set(8);
        assert_eq!(doc.get("port"), Some(Value::Int(8)));

        let size = doc.long_property_of("size").unwrap();
        doc.put("size", 9).unwrap();
        assert_eq!(size.get(), 9);
        assert_eq!(doc.get("size"), Some(Value::Int(9)));
    }

    #[test]
    fn handles_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DocumentProperty>();
        assert_send_sync::<ScalarCell>();
        assert_send_sync::<ObservableList<DocumentProperty>>();
        assert_send_sync::<RawMap>();
    }

    #[test]
    fn dropping_document_detaches_from_shared_data() {
        let data = RawMap::new();
        {
            let doc = DocumentProperty::new(data.clone());
            doc.put("name", "x").unwrap();
        }
        // No live document left to project into; must not panic.
        data.insert("name".into(), Value::from("y"));
        assert_eq!(data.get(&"name".into()), Some(Value::from("y")));
    }
}
