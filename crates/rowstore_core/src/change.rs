//! Pending changes and table snapshots.

use crate::schema::EntityType;
use crate::value::Row;
use std::sync::Arc;

/// Requested mutation of a pending change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// Insert a new row.
    Added,
    /// Replace an existing row.
    Modified,
    /// Remove an existing row.
    Deleted,
}

/// One entry of a batch passed to
/// [`Store::execute_transaction`](crate::Store::execute_transaction).
#[derive(Debug, Clone)]
pub struct PendingChange {
    /// Entity type of the row.
    pub entity_type: Arc<EntityType>,
    /// What to do with the row.
    pub state: EntryState,
    /// Current column values.
    pub values: Row,
    /// Values as last read, for the concurrency token check on updates.
    pub original_values: Option<Row>,
    /// Index of another entry in the same batch that maps onto the same
    /// physical row.
    pub shared_identity: Option<usize>,
}

impl PendingChange {
    /// An insert of `values`.
    pub fn added(entity_type: &Arc<EntityType>, values: Row) -> Self {
        Self::new(entity_type, EntryState::Added, values)
    }

    /// An update to `values`.
    pub fn modified(entity_type: &Arc<EntityType>, values: Row) -> Self {
        Self::new(entity_type, EntryState::Modified, values)
    }

    /// A delete of the row keyed like `values`.
    pub fn deleted(entity_type: &Arc<EntityType>, values: Row) -> Self {
        Self::new(entity_type, EntryState::Deleted, values)
    }

    fn new(entity_type: &Arc<EntityType>, state: EntryState, values: Row) -> Self {
        Self {
            entity_type: Arc::clone(entity_type),
            state,
            values,
            original_values: None,
            shared_identity: None,
        }
    }

    /// Attaches the values the caller last read.
    #[must_use]
    pub fn with_original(mut self, original: Row) -> Self {
        self.original_values = Some(original);
        self
    }

    /// Links the entry to its table-splitting partner at `index`.
    #[must_use]
    pub fn with_shared_identity(mut self, index: usize) -> Self {
        self.shared_identity = Some(index);
        self
    }
}

/// Rows of one concrete entity type at one point in time.
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    /// The concrete entity type.
    pub entity_type: Arc<EntityType>,
    /// Rows in key order.
    pub rows: Vec<Row>,
}
