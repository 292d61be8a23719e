//! Error types for rowstore core.

use crate::value::IntegerKind;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Placeholder rendered instead of key values when sensitive data logging is off.
pub(crate) const REDACTED: &str = "<redacted>";

/// Errors that can occur in rowstore core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A row with the same key already exists.
    #[error("cannot add {entity_type} row: key {key} already exists")]
    DuplicateKey {
        /// Entity type whose table rejected the row.
        entity_type: String,
        /// Rendered key, or `<redacted>`.
        key: String,
    },

    /// No row exists for the key.
    #[error("{entity_type} row with key {key} not found")]
    NotFound {
        /// Entity type whose table was searched.
        entity_type: String,
        /// Rendered key, or `<redacted>`.
        key: String,
    },

    /// A value generator was requested for a column that cannot use one.
    #[error("cannot generate values for {entity_type}.{column}: {reason}")]
    InvalidGeneratorTarget {
        /// Entity type owning the column.
        entity_type: String,
        /// Column name.
        column: String,
        /// Why the column was rejected.
        reason: String,
    },

    /// The key description cannot back a table.
    #[error("invalid key shape: {message}")]
    InvalidKeyShape {
        /// Description of the problem.
        message: String,
    },

    /// A row's key columns do not hold the table's key type.
    #[error("key mismatch for {entity_type}: {message}")]
    KeyMismatch {
        /// Entity type of the row.
        entity_type: String,
        /// Description of the mismatch.
        message: String,
    },

    /// A row does not match its entity type description.
    #[error("invalid {entity_type} row: {message}")]
    InvalidRow {
        /// Entity type of the row.
        entity_type: String,
        /// Description of the problem.
        message: String,
    },

    /// The stored row changed since the caller read it.
    #[error("concurrency conflict updating {entity_type} row with key {key}")]
    ConcurrencyConflict {
        /// Entity type of the row.
        entity_type: String,
        /// Rendered key, or `<redacted>`.
        key: String,
    },

    /// The counter for an integer kind passed the kind's maximum.
    #[error("value generator for {entity_type} exhausted the {kind} range")]
    GeneratorExhausted {
        /// Entity type owning the counter.
        entity_type: String,
        /// Integer kind that overflowed.
        kind: IntegerKind,
    },

    /// The model has no entity type with this name.
    #[error("unknown entity type: {name}")]
    UnknownEntityType {
        /// Name that was looked up.
        name: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// A batch entry failed and every applied entry was restored.
    #[error("transaction rolled back at entry {index}: {source}")]
    TransactionRolledBack {
        /// Position of the failing entry in the batch.
        index: usize,
        /// The failure of that entry.
        #[source]
        source: Box<CoreError>,
    },
}

impl CoreError {
    /// Creates a duplicate key error.
    pub fn duplicate_key(entity_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            entity_type: entity_type.into(),
            key: key.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(entity_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            key: key.into(),
        }
    }

    /// Creates an invalid generator target error.
    pub fn invalid_generator_target(
        entity_type: impl Into<String>,
        column: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidGeneratorTarget {
            entity_type: entity_type.into(),
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid key shape error.
    pub fn invalid_key_shape(message: impl Into<String>) -> Self {
        Self::InvalidKeyShape {
            message: message.into(),
        }
    }

    /// Creates a key mismatch error.
    pub fn key_mismatch(entity_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::KeyMismatch {
            entity_type: entity_type.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid row error.
    pub fn invalid_row(entity_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRow {
            entity_type: entity_type.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns the underlying failure, looking through a rollback wrapper.
    #[must_use]
    pub fn root_cause(&self) -> &CoreError {
        match self {
            Self::TransactionRolledBack { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
