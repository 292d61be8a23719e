//! Demo command implementation.

use super::{products_model, StatsReport, PRODUCT};
use rowstore_core::{row, Config, Database, PendingChange, Row, Value};
use serde::Serialize;

/// One product as printed.
#[derive(Debug, Serialize)]
pub struct ProductView {
    /// Product id.
    pub id: i32,
    /// Product name.
    pub name: String,
}

impl ProductView {
    fn from_row(row: &Row) -> Option<Self> {
        match (row.get(0)?, row.get(1)?) {
            (Value::I32(id), Value::Text(name)) => Some(Self {
                id: *id,
                name: name.clone(),
            }),
            _ => None,
        }
    }
}

/// Demo run result.
#[derive(Debug, Serialize)]
pub struct DemoResult {
    /// Store the demo ran against.
    pub store: String,
    /// Products before the insert.
    pub before: Vec<ProductView>,
    /// Rows affected by the save.
    pub rows_affected: usize,
    /// Products after the insert.
    pub after: Vec<ProductView>,
    /// Store counters.
    pub stats: StatsReport,
}

fn list(db: &Database) -> Result<Vec<ProductView>, Box<dyn std::error::Error>> {
    Ok(db
        .rows(PRODUCT)?
        .iter()
        .filter_map(ProductView::from_row)
        .collect())
}

/// Runs the demo command.
pub fn run(
    store: &str,
    name: &str,
    sensitive: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::new()
        .store_name(store)
        .sensitive_data_logging(sensitive);
    let db = Database::open_standalone(config, products_model()?)?;
    db.ensure_created()?;

    let product = db.entity_type(PRODUCT)?;
    let before = list(&db)?;

    let id = db.value_generator(PRODUCT, "id")?.next()?;
    let rows_affected = db.save_changes(&[PendingChange::added(&product, row![id, name])])?;

    let result = DemoResult {
        store: store.to_string(),
        before,
        rows_affected,
        after: list(&db)?,
        stats: db.stats().into(),
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => print_text_output(&result),
    }

    Ok(())
}

fn print_text_output(result: &DemoResult) {
    println!("Store: {}", result.store);
    println!();
    print_products("Before", &result.before);
    println!();
    println!("Saved {} row(s)", result.rows_affected);
    println!();
    print_products("After", &result.after);
    println!();
    result.stats.print_text();
}

fn print_products(title: &str, products: &[ProductView]) {
    println!("{title}: {} product(s)", products.len());
    for p in products {
        println!("  {:>4}  {}", p.id, p.name);
    }
}
