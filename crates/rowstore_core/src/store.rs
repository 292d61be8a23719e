//! The in-memory store.
//!
//! A [`Store`] owns one table per physical table name and serializes every
//! operation on them behind a single mutex. Batches are all-or-nothing: an
//! undo log of applied entries is replayed in reverse when an entry fails.

use crate::change::{EntryState, PendingChange, TableSnapshot};
use crate::error::{CoreError, CoreResult};
use crate::factory::TableFactory;
use crate::schema::{EntityType, Model};
use crate::stats::StoreStats;
use crate::table::Table;
use crate::value::{IntegerKind, Row, Value};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Root in-memory database for one store name.
#[derive(Debug)]
pub struct Store {
    name: String,
    table_factory: Arc<TableFactory>,
    inner: Mutex<StoreInner>,
    stats: StoreStats,
}

#[derive(Debug, Default)]
struct StoreInner {
    tables: HashMap<String, Box<dyn Table>>,
    seeded: bool,
}

#[derive(Debug)]
enum UndoAction {
    Remove(Row),
    Restore(Row),
}

#[derive(Debug)]
struct Undo {
    table: String,
    entity_type: Arc<EntityType>,
    action: UndoAction,
}

#[derive(Debug, Default)]
struct Batch {
    undo: Vec<Undo>,
    pre_deleted: HashSet<(usize, usize)>,
    inserted: u64,
    updated: u64,
    deleted: u64,
}

impl Batch {
    fn rows_affected(&self) -> usize {
        usize::try_from(self.inserted + self.updated + self.deleted).unwrap_or(usize::MAX)
    }

    fn record(&mut self, table: &str, entity_type: &Arc<EntityType>, action: UndoAction) {
        self.undo.push(Undo {
            table: table.to_string(),
            entity_type: Arc::clone(entity_type),
            action,
        });
    }

    fn count(&mut self, state: EntryState) {
        match state {
            EntryState::Added => self.inserted += 1,
            EntryState::Modified => self.updated += 1,
            EntryState::Deleted => self.deleted += 1,
        }
    }
}

impl StoreInner {
    fn table_mut(
        &mut self,
        factory: &TableFactory,
        stats: &StoreStats,
        entity_type: &Arc<EntityType>,
    ) -> CoreResult<&mut dyn Table> {
        let table_name = entity_type.table_name();
        let table = match self.tables.entry(table_name.to_string()) {
            Entry::Occupied(entry) => {
                let table = entry.into_mut();
                if !Arc::ptr_eq(table.entity_type(), entity_type) {
                    let owner = table.entity_type();
                    if owner.key_columns() != entity_type.key_columns()
                        || *table.key_shape() != entity_type.key_shape()?
                    {
                        return Err(CoreError::key_mismatch(
                            entity_type.name(),
                            format!(
                                "shares table {table_name} with {} but declares a different key",
                                owner.name()
                            ),
                        ));
                    }
                }
                table
            }
            Entry::Vacant(entry) => {
                let table = factory.create(entity_type)?;
                stats.record_tables_created(1);
                entry.insert(table)
            }
        };
        Ok(&mut **table)
    }

    fn execute(
        &mut self,
        factory: &TableFactory,
        stats: &StoreStats,
        entries: &[PendingChange],
    ) -> CoreResult<Batch> {
        let mut batch = Batch::default();
        for (index, entry) in entries.iter().enumerate() {
            if let Err(source) = self.apply(factory, stats, entries, index, entry, &mut batch) {
                self.roll_back(batch.undo);
                return Err(CoreError::TransactionRolledBack {
                    index,
                    source: Box::new(source),
                });
            }
        }
        Ok(batch)
    }

    fn apply(
        &mut self,
        factory: &TableFactory,
        stats: &StoreStats,
        entries: &[PendingChange],
        index: usize,
        entry: &PendingChange,
        batch: &mut Batch,
    ) -> CoreResult<()> {
        let entity_type = &entry.entity_type;
        if entity_type.is_abstract() {
            return Err(CoreError::invalid_operation(format!(
                "{} is abstract and cannot hold rows",
                entity_type.name()
            )));
        }
        entity_type.validate_row(&entry.values)?;

        let table_name = entity_type.table_name();
        let table = self.table_mut(factory, stats, entity_type)?;

        if let Some(partner) = entry.shared_identity {
            if partner >= entries.len() || partner == index {
                return Err(CoreError::invalid_operation(format!(
                    "entry {index} names entry {partner} as its shared identity"
                )));
            }
            // The partner's pre-delete removes the physical row.
            if entry.state == EntryState::Deleted {
                return Ok(());
            }
            if batch.pre_deleted.insert((index.min(partner), index.max(partner))) {
                if let Some(previous) = table.remove_if_present(entity_type, &entry.values)? {
                    batch.record(table_name, entity_type, UndoAction::Restore(previous));
                }
            }
            let action = match table.upsert(entity_type, entry.values.clone())? {
                Some(previous) => UndoAction::Restore(previous),
                None => UndoAction::Remove(entry.values.clone()),
            };
            batch.record(table_name, entity_type, action);
            batch.count(entry.state);
            return Ok(());
        }

        let action = match entry.state {
            EntryState::Added => {
                table.create(entity_type, entry.values.clone())?;
                UndoAction::Remove(entry.values.clone())
            }
            EntryState::Modified => UndoAction::Restore(table.update(
                entity_type,
                entry.values.clone(),
                entry.original_values.as_ref(),
            )?),
            EntryState::Deleted => UndoAction::Restore(table.delete(entity_type, &entry.values)?),
        };
        batch.record(table_name, entity_type, action);
        batch.count(entry.state);
        Ok(())
    }

    fn roll_back(&mut self, undo: Vec<Undo>) {
        for step in undo.into_iter().rev() {
            let Some(table) = self.tables.get_mut(&step.table) else {
                continue;
            };
            let result = match step.action {
                UndoAction::Remove(row) => table.remove_if_present(&step.entity_type, &row).map(drop),
                UndoAction::Restore(row) => table.upsert(&step.entity_type, row).map(drop),
            };
            if let Err(err) = result {
                warn!(table = %step.table, error = %err, "failed to undo batch entry");
            }
        }
    }
}

impl Store {
    /// Creates an empty store.
    pub fn new(name: impl Into<String>, table_factory: Arc<TableFactory>) -> Self {
        let name = name.into();
        debug!(store = %name, "created store");
        Self {
            name,
            table_factory,
            inner: Mutex::new(StoreInner::default()),
            stats: StoreStats::new(),
        }
    }

    /// Store name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Factory the store builds its tables with.
    #[must_use]
    pub fn table_factory(&self) -> &Arc<TableFactory> {
        &self.table_factory
    }

    /// Store statistics.
    #[must_use]
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Number of tables created so far.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.inner.lock().tables.len()
    }

    /// Runs `f` on the table backing `entity_type`, creating it if needed.
    ///
    /// The store lock is held while `f` runs.
    pub fn with_table<R>(
        &self,
        entity_type: &Arc<EntityType>,
        f: impl FnOnce(&mut dyn Table) -> R,
    ) -> CoreResult<R> {
        let mut inner = self.inner.lock();
        let table = inner.table_mut(&self.table_factory, &self.stats, entity_type)?;
        Ok(f(table))
    }

    /// Allocates the next surrogate value of `kind` on the table of `entity_type`.
    pub fn allocate_next_integer(
        &self,
        entity_type: &Arc<EntityType>,
        kind: IntegerKind,
    ) -> CoreResult<Value> {
        let value = self.with_table(entity_type, |table| table.allocate_next_integer(kind))??;
        self.stats.record_value_generated();
        Ok(value)
    }

    /// Applies `entries` in order and returns the number of affected rows.
    ///
    /// If any entry fails, every entry already applied is undone and the
    /// error is wrapped in [`CoreError::TransactionRolledBack`].
    pub fn execute_transaction(&self, entries: &[PendingChange]) -> CoreResult<usize> {
        let result = {
            let mut inner = self.inner.lock();
            inner.execute(&self.table_factory, &self.stats, entries)
        };
        match result {
            Ok(batch) => {
                let rows_affected = batch.rows_affected();
                self.stats
                    .record_commit(batch.inserted, batch.updated, batch.deleted);
                info!(store = %self.name, rows_affected, "changes saved");
                Ok(rows_affected)
            }
            Err(err) => {
                self.stats.record_rollback();
                warn!(store = %self.name, error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }

    /// Returns the rows of `entity_type` and of every concrete type derived
    /// from it, taken at one point in time.
    ///
    /// A physical table shared by several of those types is reported once,
    /// under the first type in declaration order.
    pub fn get_snapshots(&self, model: &Model, entity_type: &str) -> CoreResult<Vec<TableSnapshot>> {
        let types = model.concrete_types_in_hierarchy(entity_type)?;
        let snapshots = {
            let mut inner = self.inner.lock();
            let mut seen = HashSet::new();
            let mut snapshots = Vec::with_capacity(types.len());
            for concrete in types {
                if !seen.insert(concrete.table_name().to_string()) {
                    continue;
                }
                let rows = inner
                    .table_mut(&self.table_factory, &self.stats, &concrete)?
                    .snapshot_rows();
                snapshots.push(TableSnapshot {
                    entity_type: concrete,
                    rows,
                });
            }
            snapshots
        };
        self.stats.record_snapshot();
        Ok(snapshots)
    }

    /// Seeds every concrete type's seed rows as one batch.
    ///
    /// Seeding happens once after creation and once after each
    /// [`clear`](Self::clear). Always returns true.
    pub fn ensure_created(&self, model: &Model) -> CoreResult<bool> {
        let seeded = {
            let mut inner = self.inner.lock();
            if inner.seeded {
                None
            } else {
                let entries: Vec<PendingChange> = model
                    .entity_types()
                    .filter(|t| !t.is_abstract())
                    .flat_map(|t| {
                        t.seed_data()
                            .iter()
                            .map(move |row| PendingChange::added(t, row.clone()))
                    })
                    .collect();
                let result = inner.execute(&self.table_factory, &self.stats, &entries);
                inner.seeded = result.is_ok();
                Some(result)
            }
        };
        match seeded {
            Some(Ok(batch)) => {
                self.stats.record_commit(batch.inserted, 0, 0);
                debug!(store = %self.name, rows = batch.inserted, "seeded store");
            }
            Some(Err(err)) => {
                self.stats.record_rollback();
                warn!(store = %self.name, error = %err, "seeding rolled back");
                return Err(err);
            }
            None => {}
        }
        Ok(true)
    }

    /// Drops every table.
    ///
    /// Returns false if the store held no tables.
    pub fn clear(&self) -> bool {
        let cleared = {
            let mut inner = self.inner.lock();
            inner.seeded = false;
            if inner.tables.is_empty() {
                false
            } else {
                inner.tables.clear();
                true
            }
        };
        if cleared {
            self.stats.record_clear();
            debug!(store = %self.name, "cleared store");
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::schema::{Column, ColumnType};

    fn product() -> Arc<EntityType> {
        Arc::new(
            EntityType::builder("Product")
                .column(Column::new("id", ColumnType::Integer(IntegerKind::I32)).store_generated())
                .column(Column::new("name", ColumnType::Text))
                .key(&["id"])
                .build()
                .unwrap(),
        )
    }

    fn store() -> Store {
        Store::new("test", Arc::new(TableFactory::new(true)))
    }

    fn rows(store: &Store, et: &Arc<EntityType>) -> Vec<Row> {
        store.with_table(et, |t| t.snapshot_rows()).unwrap()
    }

    #[test]
    fn batch_returns_rows_affected() {
        let et = product();
        let s = store();
        let n = s
            .execute_transaction(&[
                PendingChange::added(&et, row![2i32, "B"]),
                PendingChange::added(&et, row![1i32, "A"]),
            ])
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(rows(&s, &et), vec![row![1i32, "A"], row![2i32, "B"]]);

        let n = s
            .execute_transaction(&[
                PendingChange::modified(&et, row![1i32, "A2"]),
                PendingChange::deleted(&et, row![2i32, "B"]),
            ])
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(rows(&s, &et), vec![row![1i32, "A2"]]);

        let stats = s.stats().snapshot();
        assert_eq!(stats.transactions_committed, 2);
        assert_eq!(stats.rows_inserted, 2);
        assert_eq!(stats.rows_updated, 1);
        assert_eq!(stats.rows_deleted, 1);
    }

    #[test]
    fn failed_batch_is_rolled_back() {
        let et = product();
        let s = store();
        s.execute_transaction(&[PendingChange::added(&et, row![1i32, "A"])])
            .unwrap();

        let err = s
            .execute_transaction(&[
                PendingChange::added(&et, row![2i32, "B"]),
                PendingChange::modified(&et, row![1i32, "A2"]),
                PendingChange::deleted(&et, row![1i32, "A2"]),
                PendingChange::added(&et, row![2i32, "dup"]),
            ])
            .unwrap_err();
        assert!(matches!(err, CoreError::TransactionRolledBack { index: 3, .. }));
        assert!(matches!(err.root_cause(), CoreError::DuplicateKey { .. }));
        assert_eq!(rows(&s, &et), vec![row![1i32, "A"]]);
        assert_eq!(s.stats().transactions_rolled_back(), 1);
    }

    #[test]
    fn invalid_rows_and_partners_are_rejected() {
        let et = product();
        let s = store();
        let err = s
            .execute_transaction(&[PendingChange::added(&et, row![1i32])])
            .unwrap_err();
        assert!(matches!(err.root_cause(), CoreError::InvalidRow { .. }));

        let err = s
            .execute_transaction(&[
                PendingChange::added(&et, row![1i32, "A"]).with_shared_identity(5)
            ])
            .unwrap_err();
        assert!(matches!(err.root_cause(), CoreError::InvalidOperation { .. }));
    }

    #[test]
    fn shared_identity_pair_leaves_one_row() {
        let cols = |b: crate::schema::EntityTypeBuilder| {
            b.column(Column::new("id", ColumnType::Integer(IntegerKind::I32)))
                .column(Column::new("name", ColumnType::Text))
                .key(&["id"])
                .table("Orders")
                .build()
                .unwrap()
        };
        let order = Arc::new(cols(EntityType::builder("Order")));
        let details = Arc::new(cols(EntityType::builder("OrderDetails")));
        let s = store();

        let n = s
            .execute_transaction(&[
                PendingChange::added(&order, row![1i32, "A"]).with_shared_identity(1),
                PendingChange::modified(&details, row![1i32, "B"]).with_shared_identity(0),
            ])
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(rows(&s, &order), vec![row![1i32, "B"]]);
        assert_eq!(s.table_count(), 1);

        let n = s
            .execute_transaction(&[
                PendingChange::deleted(&order, row![1i32, "B"]).with_shared_identity(1),
                PendingChange::deleted(&details, row![1i32, "B"]),
            ])
            .unwrap();
        assert_eq!(n, 1);
        assert!(rows(&s, &order).is_empty());
    }

    #[test]
    fn allocation_survives_deletes() {
        let et = product();
        let s = store();
        for expected in 1..=3 {
            let v = s.allocate_next_integer(&et, IntegerKind::I32).unwrap();
            assert_eq!(v, Value::I32(expected));
            s.execute_transaction(&[PendingChange::added(&et, row![v, "x"])])
                .unwrap();
        }
        s.execute_transaction(&[PendingChange::deleted(&et, row![2i32, "x"])])
            .unwrap();
        assert_eq!(
            s.allocate_next_integer(&et, IntegerKind::I32).unwrap(),
            Value::I32(4)
        );
        assert_eq!(s.stats().values_generated(), 4);
    }

    #[test]
    fn clear_twice() {
        let et = product();
        let s = store();
        assert!(!s.clear());
        s.execute_transaction(&[PendingChange::added(&et, row![1i32, "A"])])
            .unwrap();
        assert!(s.clear());
        assert!(!s.clear());
        assert_eq!(s.table_count(), 0);
    }

    #[test]
    fn ensure_created_seeds_once() {
        let seeded = EntityType::builder("Product")
            .column(Column::new("id", ColumnType::Integer(IntegerKind::I32)))
            .column(Column::new("name", ColumnType::Text))
            .key(&["id"])
            .seed(row![1i32, "Seed"])
            .build()
            .unwrap();
        let model = Model::new(vec![seeded]).unwrap();
        let et = Arc::clone(model.entity_type("Product").unwrap());
        let s = store();

        assert!(s.ensure_created(&model).unwrap());
        assert!(s.ensure_created(&model).unwrap());
        assert_eq!(rows(&s, &et).len(), 1);

        assert!(s.clear());
        assert!(s.ensure_created(&model).unwrap());
        assert_eq!(rows(&s, &et), vec![row![1i32, "Seed"]]);
    }
    #[test]
    fn failed_seeding_counts_as_rollback() {
        let seeded = EntityType::builder("Product")
            .column(Column::new("id", ColumnType::Integer(IntegerKind::I32)))
            .column(Column::new("name", ColumnType::Text))
            .key(&["id"])
            .seed(row![1i32, "Seed"])
            .build()
            .unwrap();
        let model = Model::new(vec![seeded]).unwrap();
        let et = Arc::clone(model.entity_type("Product").unwrap());
        let s = store();
        s.execute_transaction(&[PendingChange::added(&et, row![1i32, "Taken"])])
            .unwrap();

        let err = s.ensure_created(&model).unwrap_err();
        assert!(matches!(err.root_cause(), CoreError::DuplicateKey { .. }));
        assert_eq!(s.stats().transactions_rolled_back(), 1);
        assert_eq!(rows(&s, &et), vec![row![1i32, "Taken"]]);

        // Seeding is retried on the next call.
        s.execute_transaction(&[PendingChange::deleted(&et, row![1i32, "Taken"])])
            .unwrap();
        assert!(s.ensure_created(&model).unwrap());
        assert_eq!(rows(&s, &et), vec![row![1i32, "Seed"]]);
    }
}

