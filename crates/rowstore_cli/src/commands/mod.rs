//! CLI command implementations.

pub mod demo;
pub mod stress;

use rowstore_core::{Column, ColumnType, CoreResult, EntityType, IntegerKind, Model, StatsSnapshot};
use serde::Serialize;

/// Entity type used by the commands.
pub const PRODUCT: &str = "Product";

/// `Product { id: i32 (generated), name: text }`.
pub fn products_model() -> CoreResult<Model> {
    let product = EntityType::builder(PRODUCT)
        .column(Column::new("id", ColumnType::Integer(IntegerKind::I32)).store_generated())
        .column(Column::new("name", ColumnType::Text))
        .key(&["id"])
        .build()?;
    Model::new(vec![product])
}

/// Store counters as printed by the commands.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    /// Committed batches.
    pub transactions_committed: u64,
    /// Rolled back batches.
    pub transactions_rolled_back: u64,
    /// Rows inserted.
    pub rows_inserted: u64,
    /// Rows updated.
    pub rows_updated: u64,
    /// Rows deleted.
    pub rows_deleted: u64,
    /// Generated key values.
    pub values_generated: u64,
}

impl From<StatsSnapshot> for StatsReport {
    fn from(s: StatsSnapshot) -> Self {
        Self {
            transactions_committed: s.transactions_committed,
            transactions_rolled_back: s.transactions_rolled_back,
            rows_inserted: s.rows_inserted,
            rows_updated: s.rows_updated,
            rows_deleted: s.rows_deleted,
            values_generated: s.values_generated,
        }
    }
}

impl StatsReport {
    /// Prints the counters as indented text.
    pub fn print_text(&self) {
        println!("Stats:");
        println!("  Committed: {}", self.transactions_committed);
        println!("  Rolled back: {}", self.transactions_rolled_back);
        println!(
            "  Rows inserted/updated/deleted: {}/{}/{}",
            self.rows_inserted, self.rows_updated, self.rows_deleted
        );
        println!("  Values generated: {}", self.values_generated);
    }
}
