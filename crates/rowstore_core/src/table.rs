//! Keyed tables.
//!
//! A [`KeyedTable`] stores the rows of one physical table in a `BTreeMap`
//! keyed by the extracted primary key, so snapshots come back in key order.
//! The store only talks to tables through the object-safe [`Table`] trait;
//! the [`TableFactory`](crate::TableFactory) picks the key type.

use crate::error::{CoreError, CoreResult};
use crate::key::{KeyShape, KeyValue};
use crate::schema::EntityType;
use crate::value::{IntegerKind, Row, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Operations the store performs on a table, independent of the key type.
///
/// Every mutating method takes the entity type of the row being written,
/// since several entity types may share one physical table.
pub trait Table: Send + Sync + fmt::Debug {
    /// Entity type the table was created for.
    fn entity_type(&self) -> &Arc<EntityType>;

    /// Key shape the table is specialized to.
    fn key_shape(&self) -> &KeyShape;

    /// Inserts a new row. Fails with `DuplicateKey` if the key is present.
    fn create(&mut self, entity_type: &EntityType, row: Row) -> CoreResult<()>;

    /// Replaces the row with the same key, returning the previous row.
    ///
    /// When `original` is given, every concurrency token of the stored row
    /// must match it under the column comparer.
    fn update(
        &mut self,
        entity_type: &EntityType,
        row: Row,
        original: Option<&Row>,
    ) -> CoreResult<Row>;

    /// Removes the row with the key of `row`, returning it.
    fn delete(&mut self, entity_type: &EntityType, row: &Row) -> CoreResult<Row>;

    /// Removes the row with the key of `row` if there is one.
    fn remove_if_present(&mut self, entity_type: &EntityType, row: &Row)
        -> CoreResult<Option<Row>>;

    /// Inserts or replaces the row, returning the previous row if any.
    fn upsert(&mut self, entity_type: &EntityType, row: Row) -> CoreResult<Option<Row>>;

    /// Point-in-time copy of all rows in key order.
    fn snapshot_rows(&self) -> Vec<Row>;

    /// Allocates the next surrogate value for `kind`.
    fn allocate_next_integer(&mut self, kind: IntegerKind) -> CoreResult<Value>;

    /// Number of rows.
    fn len(&self) -> usize;

    /// Returns true if the table holds no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A table keyed by `K`.
pub struct KeyedTable<K: KeyValue> {
    entity_type: Arc<EntityType>,
    key_shape: KeyShape,
    rows: BTreeMap<K, Row>,
    /// Next value per integer kind, indexed by [`IntegerKind::index`].
    counters: [u128; 8],
    sensitive_data_logging: bool,
}

impl<K: KeyValue> KeyedTable<K> {
    /// Creates an empty table for `entity_type`.
    pub fn new(
        entity_type: Arc<EntityType>,
        key_shape: KeyShape,
        sensitive_data_logging: bool,
    ) -> Self {
        Self {
            entity_type,
            key_shape,
            rows: BTreeMap::new(),
            counters: [1; 8],
            sensitive_data_logging,
        }
    }

    /// Returns the row stored under `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&Row> {
        self.rows.get(key)
    }

    /// Returns true if a row is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.rows.contains_key(key)
    }

    /// Iterates keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.rows.keys()
    }

    fn key_of(&self, entity_type: &EntityType, row: &Row) -> CoreResult<K> {
        K::extract(row, entity_type.key_columns())
            .map_err(|message| CoreError::key_mismatch(entity_type.name(), message))
    }

    fn render_key(&self, entity_type: &EntityType, row: &Row) -> String {
        entity_type.render_key(row, self.sensitive_data_logging)
    }

    /// Moves counters past any integer key value stored explicitly.
    /// Counters never move backwards.
    fn observe_key(&mut self, entity_type: &EntityType, row: &Row) {
        for &index in entity_type.key_columns() {
            let Some(value) = row.get(index) else { continue };
            let (Some(kind), Some(n)) = (value.integer_kind(), value.as_i128()) else {
                continue;
            };
            if let Ok(n) = u128::try_from(n) {
                let slot = &mut self.counters[kind.index()];
                *slot = (*slot).max(n + 1);
            }
        }
    }
}

impl<K: KeyValue> fmt::Debug for KeyedTable<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedTable")
            .field("entity_type", &self.entity_type.name())
            .field("key_shape", &self.key_shape)
            .field("rows", &self.rows.len())
            .finish()
    }
}

impl<K: KeyValue> Table for KeyedTable<K> {
    fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    fn key_shape(&self) -> &KeyShape {
        &self.key_shape
    }

    fn create(&mut self, entity_type: &EntityType, row: Row) -> CoreResult<()> {
        let key = self.key_of(entity_type, &row)?;
        if self.rows.contains_key(&key) {
            return Err(CoreError::duplicate_key(
                entity_type.name(),
                self.render_key(entity_type, &row),
            ));
        }
        self.observe_key(entity_type, &row);
        self.rows.insert(key, row);
        Ok(())
    }

    fn update(
        &mut self,
        entity_type: &EntityType,
        row: Row,
        original: Option<&Row>,
    ) -> CoreResult<Row> {
        let key = self.key_of(entity_type, &row)?;
        let rendered = self.render_key(entity_type, &row);
        let Some(stored) = self.rows.get_mut(&key) else {
            return Err(CoreError::not_found(entity_type.name(), rendered));
        };
        if let Some(original) = original {
            if !entity_type.concurrency_tokens_match(stored, original) {
                return Err(CoreError::ConcurrencyConflict {
                    entity_type: entity_type.name().to_string(),
                    key: rendered,
                });
            }
        }
        Ok(std::mem::replace(stored, row))
    }

    fn delete(&mut self, entity_type: &EntityType, row: &Row) -> CoreResult<Row> {
        let key = self.key_of(entity_type, row)?;
        self.rows
            .remove(&key)
            .ok_or_else(|| CoreError::not_found(entity_type.name(), self.render_key(entity_type, row)))
    }

    fn remove_if_present(
        &mut self,
        entity_type: &EntityType,
        row: &Row,
    ) -> CoreResult<Option<Row>> {
        let key = self.key_of(entity_type, row)?;
        Ok(self.rows.remove(&key))
    }

    fn upsert(&mut self, entity_type: &EntityType, row: Row) -> CoreResult<Option<Row>> {
        let key = self.key_of(entity_type, &row)?;
        self.observe_key(entity_type, &row);
        Ok(self.rows.insert(key, row))
    }

    fn snapshot_rows(&self) -> Vec<Row> {
        self.rows.values().cloned().collect()
    }

    fn allocate_next_integer(&mut self, kind: IntegerKind) -> CoreResult<Value> {
        let slot = &mut self.counters[kind.index()];
        let value = u64::try_from(*slot)
            .ok()
            .and_then(|n| kind.value(n))
            .ok_or_else(|| CoreError::GeneratorExhausted {
                entity_type: self.entity_type.name().to_string(),
                kind,
            })?;
        *slot += 1;
        Ok(value)
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}
