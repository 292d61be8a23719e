//! Process-wide store registry.

use crate::factory::TableFactory;
use crate::store::Store;
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};

/// Store name used when no name is configured.
pub const LEGACY_SHARED_NAME: &str = "___Shared_Database___";

type StoreMap = DashMap<String, Arc<Store>>;

/// Shared container that keeps stores alive across store caches.
///
/// Clones refer to the same container. The name map inside it is created
/// on first use, so every cache built from the same root sees the same
/// stores no matter which one touched it first.
#[derive(Debug, Clone, Default)]
pub struct DatabaseRoot {
    instance: Arc<OnceLock<Arc<StoreMap>>>,
}

impl DatabaseRoot {
    /// Creates an empty root.
    pub fn new() -> Self {
        Self::default()
    }

    fn stores(&self) -> Arc<StoreMap> {
        Arc::clone(self.instance.get_or_init(|| Arc::new(DashMap::new())))
    }
}

/// Maps store names to stores.
///
/// ```rust,ignore
/// let root = DatabaseRoot::new();
/// let a = StoreCache::with_root(Arc::clone(&factory), &root);
/// let b = StoreCache::with_root(factory, &root);
/// assert!(Arc::ptr_eq(&a.get_store("db"), &b.get_store("db")));
/// ```
#[derive(Debug)]
pub struct StoreCache {
    table_factory: Arc<TableFactory>,
    stores: Arc<StoreMap>,
}

impl StoreCache {
    /// Creates a cache with its own private name map.
    pub fn new(table_factory: Arc<TableFactory>) -> Self {
        Self {
            table_factory,
            stores: Arc::new(DashMap::new()),
        }
    }

    /// Creates a cache whose name map lives in `root`.
    ///
    /// Stores are created with the factory of whichever cache asks for a
    /// name first.
    pub fn with_root(table_factory: Arc<TableFactory>, root: &DatabaseRoot) -> Self {
        Self {
            table_factory,
            stores: root.stores(),
        }
    }

    /// Returns the store called `name`, creating it on first request.
    ///
    /// Concurrent first requests for one name all receive the same store.
    pub fn get_store(&self, name: &str) -> Arc<Store> {
        if let Some(store) = self.stores.get(name) {
            return Arc::clone(store.value());
        }
        let store = self
            .stores
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Store::new(name, Arc::clone(&self.table_factory))));
        Arc::clone(store.value())
    }

    /// Returns the store registered under [`LEGACY_SHARED_NAME`].
    pub fn default_store(&self) -> Arc<Store> {
        self.get_store(LEGACY_SHARED_NAME)
    }

    /// Number of stores in the cache.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Returns true if no store has been requested yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}
