#![forbid(unsafe_code)]

//! Errors reported by document accessors.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Type mismatch | Accessor variant differs from the raw value or cached cell | `Err(TypeMismatch)`, store untouched |
//! | Kind mismatch | `observable_list_of` with a kind the factory did not produce | `Err(ListKindMismatch)` |
//! | Missing key | Key not in the store | Not an error: `Ok(None)` or a default view |
//! | Bad JSON | Malformed text or non-object root (feature `serde`) | `Err(Json)` |

use std::fmt;

use crate::factory::DocumentKind;

/// Errors from document operations.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// The value (or cached cell) under `key` is not of the requested type.
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    /// The child list under `key` holds documents of another kind.
    ListKindMismatch {
        key: String,
        expected: DocumentKind,
        found: DocumentKind,
    },
    /// A JSON document could not be loaded.
    #[cfg(feature = "serde")]
    Json(String),
}

impl DocumentError {
    pub(crate) fn type_mismatch(key: &str, expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch {
            key: key.to_owned(),
            expected,
            found,
        }
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch {
                key,
                expected,
                found,
            } => write!(f, "type mismatch on key '{key}': expected {expected}, found {found}"),
            Self::ListKindMismatch {
                key,
                expected,
                found,
            } => write!(
                f,
                "requested a list of '{expected}' documents on key '{key}', but it holds '{found}' documents"
            ),
            #[cfg(feature = "serde")]
            Self::Json(msg) => write!(f, "invalid document json: {msg}"),
        }
    }
}

impl std::error::Error for DocumentError {}

/// Result alias for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_key_and_types() {
        let err = DocumentError::type_mismatch("port", "int", "string");
        assert_eq!(
            err.to_string(),
            "type mismatch on key 'port': expected int, found string"
        );
    }

    #[test]
    fn display_list_kind_mismatch() {
        let err = DocumentError::ListKindMismatch {
            key: "columns".into(),
            expected: DocumentKind::TABLE,
            found: DocumentKind::COLUMN,
        };
        assert_eq!(
            err.to_string(),
            "requested a list of 'table' documents on key 'columns', but it holds 'column' documents"
        );
    }
}
