//! # rowstore core
//!
//! Embedded in-memory keyed storage engine.
//!
//! This crate provides:
//! - Keyed tables specialized by primary key type
//! - A table factory that picks the key type from the entity description
//! - Stores that apply batches of pending changes all-or-nothing
//! - A process-wide store cache with an optional shared root
//! - Per-table integer key generators

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod change;
mod config;
mod database;
mod error;
mod factory;
mod key;
mod schema;
mod stats;
mod store;
mod table;
mod value;
mod valuegen;

pub use cache::{DatabaseRoot, StoreCache, LEGACY_SHARED_NAME};
pub use change::{EntryState, PendingChange, TableSnapshot};
pub use config::Config;
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use factory::{TableConstructor, TableFactory};
pub use key::{CompositeKey, KeyShape, KeyType, KeyValue, ScalarKey};
pub use schema::{Column, ColumnType, EntityType, EntityTypeBuilder, Model, ValueComparer};
pub use stats::{StatsSnapshot, StoreStats};
pub use store::Store;
pub use table::{KeyedTable, Table};
pub use value::{IntegerKind, Row, Value};
pub use valuegen::{GeneratedInteger, IntegerValueGenerator, ValueGenerator, ValueGeneratorSelector};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
