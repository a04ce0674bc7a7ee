#![forbid(unsafe_code)]

//! Document kinds and the factory table that assigns them.
//!
//! When a nested mapping shows up in a list under some key, the owning
//! document asks its [`DocumentFactory`] which [`DocumentKind`] should wrap
//! it. The factory is shared by the whole tree, so grandchildren are
//! resolved by the same table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::document::DocumentProperty;
use crate::value::RawMap;

/// Name of the document variant a factory produced.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentKind(&'static str);

impl DocumentKind {
    pub const GENERIC: Self = Self("document");
    pub const PROJECT: Self = Self("project");
    pub const DBMS: Self = Self("dbms");
    pub const SCHEMA: Self = Self("schema");
    pub const TABLE: Self = Self("table");
    pub const COLUMN: Self = Self("column");
    pub const INDEX: Self = Self("index");
    pub const INDEX_COLUMN: Self = Self("index_column");
    pub const FOREIGN_KEY: Self = Self("foreign_key");
    pub const FOREIGN_KEY_COLUMN: Self = Self("foreign_key_column");
    pub const PRIMARY_KEY_COLUMN: Self = Self("primary_key_column");

    /// A user-defined kind.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentKind({})", self.0)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Clone)]
struct FactoryTable {
    kinds: HashMap<String, DocumentKind>,
    fallback: DocumentKind,
}

/// Key -> kind table used to wrap nested mappings.
///
/// Cloning is cheap; clones share the table until one of them is modified.
///
/// ```
/// use configdoc_core::{DocumentFactory, DocumentKind};
///
/// let factory = DocumentFactory::new()
///     .register("tables", DocumentKind::TABLE)
///     .register("columns", DocumentKind::COLUMN);
///
/// assert_eq!(factory.kind_for("tables"), DocumentKind::TABLE);
/// assert_eq!(factory.kind_for("unknown"), DocumentKind::GENERIC);
/// ```
#[derive(Clone)]
pub struct DocumentFactory {
    table: Arc<FactoryTable>,
}

impl Default for DocumentFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentFactory {
    /// A factory that wraps everything as [`DocumentKind::GENERIC`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_fallback(DocumentKind::GENERIC)
    }

    /// A factory with a custom kind for unregistered keys.
    #[must_use]
    pub fn with_fallback(fallback: DocumentKind) -> Self {
        Self {
            table: Arc::new(FactoryTable {
                kinds: HashMap::new(),
                fallback,
            }),
        }
    }

    /// The table for a project configuration tree.
    ///
    /// | Key | Kind |
    /// |-----|------|
    /// | `dbmses` | `dbms` |
    /// | `schemas` | `schema` |
    /// | `tables` | `table` |
    /// | `columns` | `column` |
    /// | `indexes` | `index` |
    /// | `indexColumns` | `index_column` |
    /// | `foreignKeys` | `foreign_key` |
    /// | `foreignKeyColumns` | `foreign_key_column` |
    /// | `primaryKeyColumns` | `primary_key_column` |
    #[must_use]
    pub fn project_tree() -> Self {
        Self::new()
            .register("dbmses", DocumentKind::DBMS)
            .register("schemas", DocumentKind::SCHEMA)
            .register("tables", DocumentKind::TABLE)
            .register("columns", DocumentKind::COLUMN)
            .register("indexes", DocumentKind::INDEX)
            .register("indexColumns", DocumentKind::INDEX_COLUMN)
            .register("foreignKeys", DocumentKind::FOREIGN_KEY)
            .register("foreignKeyColumns", DocumentKind::FOREIGN_KEY_COLUMN)
            .register("primaryKeyColumns", DocumentKind::PRIMARY_KEY_COLUMN)
    }

    /// Map `key` to `kind`, replacing any previous entry.
    #[must_use]
    pub fn register(mut self, key: impl Into<String>, kind: DocumentKind) -> Self {
        Arc::make_mut(&mut self.table).kinds.insert(key.into(), kind);
        self
    }

    /// The kind documents found under `key` are created with.
    #[must_use]
    pub fn kind_for(&self, key: &str) -> DocumentKind {
        self.table
            .kinds
            .get(key)
            .copied()
            .unwrap_or(self.table.fallback)
    }

    /// Wrap `data`, found under `key`, in a document of the mapped kind.
    ///
    /// The new document shares `data` with the caller and inherits this
    /// factory.
    #[must_use]
    pub fn create_document(&self, key: &str, data: RawMap) -> DocumentProperty {
        DocumentProperty::with_factory(self.kind_for(key), data, self.clone())
    }
}

impl fmt::Debug for DocumentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentFactory")
            .field("kinds", &self.table.kinds.len())
            .field("fallback", &self.table.fallback)
            .finish()
    }
}
