//! Database facade.

use crate::cache::StoreCache;
use crate::change::{PendingChange, TableSnapshot};
use crate::config::Config;
use crate::error::CoreResult;
use crate::factory::TableFactory;
use crate::schema::{EntityType, Model};
use crate::stats::StatsSnapshot;
use crate::store::Store;
use crate::value::Row;
use crate::valuegen::{ValueGenerator, ValueGeneratorSelector};
use std::sync::Arc;
use tracing::debug;

/// A model bound to a named store.
///
/// `Database` is the entry point for the data-access layer:
/// - saving batches of pending changes
/// - reading snapshots of an entity type and its derived types
/// - creating and deleting the database
/// - obtaining key generators
///
/// ```rust,ignore
/// let db = Database::open_standalone(Config::default(), model)?;
/// db.ensure_created()?;
/// let ids = db.value_generator("Product", "id")?;
/// db.save_changes(&[PendingChange::added(&product, row![ids.next()?, "Widget"])])?;
/// let rows = db.rows("Product")?;
/// ```
#[derive(Debug)]
pub struct Database {
    config: Config,
    model: Model,
    store: Arc<Store>,
    generators: ValueGeneratorSelector,
}

impl Database {
    /// Binds `model` to the store named in `config`, taken from `cache`.
    ///
    /// Key rendering in errors follows the store's table factory, not
    /// `config.sensitive_data_logging`; a mismatch is logged at debug level.
    pub fn open(config: Config, model: Model, cache: &StoreCache) -> CoreResult<Self> {
        config.validate()?;
        let store = cache.get_store(&config.store_name);
        let effective = store.table_factory().sensitive_data_logging();
        if effective != config.sensitive_data_logging {
            debug!(
                store = %config.store_name,
                requested = config.sensitive_data_logging,
                effective,
                "sensitive data logging follows the store's factory"
            );
        }
        debug!(store = %config.store_name, entity_types = model.entity_types().count(), "opened database");
        Ok(Self {
            generators: ValueGeneratorSelector::new(Arc::clone(&store)),
            config,
            model,
            store,
        })
    }

    /// Opens with a cache built from `config`.
    ///
    /// With a [`DatabaseRoot`](crate::DatabaseRoot) in `config`, databases
    /// opened with the same root and store name share one store.
    pub fn open_standalone(config: Config, model: Model) -> CoreResult<Self> {
        let factory = Arc::new(TableFactory::new(config.sensitive_data_logging));
        let cache = match &config.database_root {
            Some(root) => StoreCache::with_root(factory, root),
            None => StoreCache::new(factory),
        };
        Self::open(config, model, &cache)
    }

    /// Configuration the database was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether keys appear in error messages for this database's store.
    #[must_use]
    pub fn sensitive_data_logging(&self) -> bool {
        self.store.table_factory().sensitive_data_logging()
    }

    /// The model.
    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Looks up an entity type of the model.
    pub fn entity_type(&self, name: &str) -> CoreResult<Arc<EntityType>> {
        self.model.entity_type(name).map(Arc::clone)
    }

    /// Applies a batch and returns the number of affected rows.
    pub fn save_changes(&self, entries: &[PendingChange]) -> CoreResult<usize> {
        self.store.execute_transaction(entries)
    }

    /// Snapshots of `entity_type` and every concrete type derived from it.
    pub fn query(&self, entity_type: &str) -> CoreResult<Vec<TableSnapshot>> {
        self.store.get_snapshots(&self.model, entity_type)
    }

    /// All rows of `entity_type` and its derived types, one snapshot after another.
    pub fn rows(&self, entity_type: &str) -> CoreResult<Vec<Row>> {
        Ok(self
            .query(entity_type)?
            .into_iter()
            .flat_map(|snapshot| snapshot.rows)
            .collect())
    }

    /// Seeds the store on first use. Always returns true.
    pub fn ensure_created(&self) -> CoreResult<bool> {
        self.store.ensure_created(&self.model)
    }

    /// Drops every table. Returns false if there was nothing to drop.
    pub fn ensure_deleted(&self) -> bool {
        self.store.clear()
    }

    /// In-memory stores are always reachable.
    #[must_use]
    pub fn can_connect(&self) -> bool {
        true
    }

    /// Returns a key generator for `column` of `entity_type`.
    pub fn value_generator(
        &self,
        entity_type: &str,
        column: &str,
    ) -> CoreResult<Box<dyn ValueGenerator>> {
        let entity_type = self.model.entity_type(entity_type)?;
        self.generators.select(entity_type, column)
    }

    /// Returns a snapshot of the store counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.store.stats().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DatabaseRoot;
    use crate::error::CoreError;
    use crate::row;
    use crate::schema::{Column, ColumnType};
    use crate::value::{IntegerKind, Value};

    fn model() -> Model {
        Model::new(vec![EntityType::builder("Product")
            .column(Column::new("id", ColumnType::Integer(IntegerKind::I32)).store_generated())
            .column(Column::new("name", ColumnType::Text))
            .key(&["id"])
            .build()
            .unwrap()])
        .unwrap()
    }

    #[test]
    fn save_and_query() {
        let db = Database::open_standalone(Config::default(), model()).unwrap();
        assert!(db.can_connect());
        assert!(db.ensure_created().unwrap());
        assert!(db.rows("Product").unwrap().is_empty());

        let product = db.entity_type("Product").unwrap();
        let ids = db.value_generator("Product", "id").unwrap();
        let id = ids.next().unwrap();
        assert_eq!(id, Value::I32(1));
        let n = db
            .save_changes(&[PendingChange::added(&product, row![id, "xxx"])])
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(db.rows("Product").unwrap(), vec![row![1i32, "xxx"]]);
        assert_eq!(db.stats().rows_inserted, 1);

        assert!(db.ensure_deleted());
        assert!(!db.ensure_deleted());
    }

    #[test]
    fn shared_root_shares_store() {
        let root = DatabaseRoot::new();
        let config = Config::new().store_name("shop").database_root(root);
        let a = Database::open_standalone(config.clone(), model()).unwrap();
        let b = Database::open_standalone(config, model()).unwrap();
        assert!(Arc::ptr_eq(a.store(), b.store()));
    }

    #[test]
    fn key_rendering_follows_the_cache_factory() {
        let cache = StoreCache::new(Arc::new(TableFactory::new(false)));
        let config = Config::new().store_name("redacted").sensitive_data_logging(true);
        let db = Database::open(config, model(), &cache).unwrap();
        assert!(db.config().sensitive_data_logging);
        assert!(!db.sensitive_data_logging());

        let product = db.entity_type("Product").unwrap();
        let entry = PendingChange::added(&product, row![1i32, "a"]);
        db.save_changes(&[entry.clone()]).unwrap();
        let err = db.save_changes(&[entry]).unwrap_err();
        assert!(err.to_string().contains("<redacted>"));
    }

    #[test]
    fn unknown_entity_type() {
        let db = Database::open_standalone(Config::default(), model()).unwrap();
        assert!(matches!(
            db.query("Nope"),
            Err(CoreError::UnknownEntityType { .. })
        ));
        assert!(db.value_generator("Product", "name").is_err());
    }

    #[test]
    fn empty_store_name_is_rejected() {
        let result = Database::open_standalone(Config::new().store_name(""), model());
        assert!(result.is_err());
    }
}
