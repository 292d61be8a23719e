//! Benchmark utilities.

use rowstore_core::{
    row, Column, ColumnType, Config, Database, EntityType, IntegerKind, Model, PendingChange, Row,
};
use std::sync::Arc;
use uuid::Uuid;

/// Entity type used by the benchmarks.
pub const ITEM: &str = "Item";

/// `Item { id: i64 (generated), name: text, payload: bytes }`.
pub fn item_model() -> Model {
    let item = EntityType::builder(ITEM)
        .column(Column::new("id", ColumnType::Integer(IntegerKind::I64)).store_generated())
        .column(Column::new("name", ColumnType::Text))
        .column(Column::new("payload", ColumnType::Bytes))
        .key(&["id"])
        .build()
        .expect("valid item type");
    Model::new(vec![item]).expect("valid item model")
}

/// Opens the item model on a fresh store.
pub fn open_db() -> Database {
    let config = Config::new().store_name(format!("bench-{}", Uuid::new_v4()));
    Database::open_standalone(config, item_model()).expect("open bench database")
}

/// An item row with a payload of `payload_size` bytes.
pub fn item_row(id: i64, payload_size: usize) -> Row {
    row![id, format!("item-{id}"), vec![0xABu8; payload_size]]
}

/// `Added` entries for ids `first..first + count`.
pub fn insert_batch(
    item: &Arc<EntityType>,
    first: i64,
    count: usize,
    payload_size: usize,
) -> Vec<PendingChange> {
    (first..)
        .take(count)
        .map(|id| PendingChange::added(item, item_row(id, payload_size)))
        .collect()
}
