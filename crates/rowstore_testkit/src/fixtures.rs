//! Sample models and database helpers.

use rowstore_core::{
    row, Column, ColumnType, Config, Database, EntityType, EntityTypeBuilder, IntegerKind, Model,
    PendingChange, Row,
};
use std::sync::Arc;
use uuid::Uuid;

/// Entity type name used by [`products_model`].
pub const PRODUCT: &str = "Product";

fn product_type() -> EntityTypeBuilder {
    EntityType::builder(PRODUCT)
        .column(Column::new("id", ColumnType::Integer(IntegerKind::I32)).store_generated())
        .column(Column::new("name", ColumnType::Text))
        .key(&["id"])
}

/// `Product { id: i32 (generated), name: text }`.
pub fn products_model() -> Model {
    Model::new(vec![product_type().build().expect("valid product type")])
        .expect("valid products model")
}

/// [`products_model`] with two seed rows.
pub fn seeded_products_model() -> Model {
    let product = product_type()
        .seed(product_row(1, "Seed 1"))
        .seed(product_row(2, "Seed 2"))
        .build()
        .expect("valid seeded product type");
    Model::new(vec![product]).expect("valid seeded model")
}

/// Abstract `Animal` with `Cat`, `Dog` and `Puppy: Dog`, each in its own table.
pub fn animals_model() -> Model {
    let animal = |b: EntityTypeBuilder| {
        b.column(Column::new("id", ColumnType::Integer(IntegerKind::I64)))
            .column(Column::new("name", ColumnType::Text))
            .key(&["id"])
            .build()
            .expect("valid animal type")
    };
    Model::new(vec![
        animal(EntityType::builder("Animal").abstract_type()),
        animal(EntityType::builder("Cat").base("Animal")),
        animal(EntityType::builder("Dog").base("Animal")),
        animal(EntityType::builder("Puppy").base("Dog")),
    ])
    .expect("valid animals model")
}

/// `Order` and `OrderDetails` split over one `Orders` table.
pub fn orders_model() -> Model {
    let split = |b: EntityTypeBuilder| {
        b.column(Column::new("id", ColumnType::Integer(IntegerKind::I32)))
            .column(Column::new("status", ColumnType::Text))
            .key(&["id"])
            .table("Orders")
            .build()
            .expect("valid order type")
    };
    Model::new(vec![
        split(EntityType::builder("Order")),
        split(EntityType::builder("OrderDetails")),
    ])
    .expect("valid orders model")
}

/// `OrderLine { order: uuid, line: u16, sku: text, photo: bytes? }` keyed by `(order, line)`.
pub fn order_lines_model() -> Model {
    let line = EntityType::builder("OrderLine")
        .column(Column::new("order", ColumnType::Uuid))
        .column(Column::new("line", ColumnType::Integer(IntegerKind::U16)))
        .column(Column::new("sku", ColumnType::Text))
        .column(Column::new("photo", ColumnType::Bytes).nullable().concurrency_token())
        .key(&["order", "line"])
        .build()
        .expect("valid order line type");
    Model::new(vec![line]).expect("valid order lines model")
}

/// A product row.
pub fn product_row(id: i32, name: &str) -> Row {
    row![id, name]
}

/// An order line row.
pub fn order_line_row(order: Uuid, line: u16, sku: &str, photo: Option<Vec<u8>>) -> Row {
    row![order, line, sku, photo]
}

/// One `Added` entry per row.
pub fn insert_batch(entity_type: &Arc<EntityType>, rows: Vec<Row>) -> Vec<PendingChange> {
    rows.into_iter()
        .map(|r| PendingChange::added(entity_type, r))
        .collect()
}

/// Opens `model` on a fresh, uniquely named store with a private cache.
pub fn memory_db(model: Model) -> Database {
    let config = Config::new()
        .store_name(format!("test-{}", Uuid::new_v4()))
        .sensitive_data_logging(true);
    Database::open_standalone(config, model).expect("Failed to open in-memory database")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_build() {
        assert_eq!(products_model().entity_types().count(), 1);
        assert_eq!(animals_model().entity_types().count(), 4);
        assert_eq!(orders_model().entity_types().count(), 2);
        assert_eq!(
            order_lines_model()
                .entity_type("OrderLine")
                .unwrap()
                .key_shape()
                .unwrap()
                .arity(),
            2
        );
    }

    #[test]
    fn memory_dbs_are_isolated() {
        let a = memory_db(products_model());
        let b = memory_db(products_model());
        assert!(!Arc::ptr_eq(a.store(), b.store()));
    }
}
