//! Stress command implementation.

use super::{products_model, StatsReport, PRODUCT};
use rowstore_core::{row, Config, Database, PendingChange};
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::warn;

/// Stress run result.
#[derive(Debug, Serialize)]
pub struct StressResult {
    /// Worker threads.
    pub threads: usize,
    /// Successful inserts.
    pub inserted: usize,
    /// Failed inserts.
    pub failed: usize,
    /// Rows in the table afterwards.
    pub rows: usize,
    /// Wall time in milliseconds.
    pub elapsed_ms: u128,
    /// Store counters.
    pub stats: StatsReport,
}

/// Runs the stress command.
pub fn run(
    store: &str,
    threads: usize,
    ops: usize,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(Database::open_standalone(
        Config::new().store_name(store),
        products_model()?,
    )?);
    let product = db.entity_type(PRODUCT)?;
    let start = Instant::now();

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let db = Arc::clone(&db);
            let product = Arc::clone(&product);
            thread::spawn(move || {
                let mut inserted = 0usize;
                let ids = match db.value_generator(PRODUCT, "id") {
                    Ok(ids) => ids,
                    Err(err) => {
                        warn!(thread = t, error = %err, "no generator");
                        return (0, ops);
                    }
                };
                for i in 0..ops {
                    let result = ids.next().and_then(|id| {
                        let name = format!("t{t}-{i}");
                        db.save_changes(&[PendingChange::added(&product, row![id, name])])
                    });
                    match result {
                        Ok(_) => inserted += 1,
                        Err(err) => warn!(thread = t, error = %err, "insert failed"),
                    }
                }
                (inserted, ops - inserted)
            })
        })
        .collect();

    let mut inserted = 0;
    let mut failed = 0;
    for handle in handles {
        let (ok, err) = handle.join().map_err(|_| "worker thread panicked")?;
        inserted += ok;
        failed += err;
    }

    let result = StressResult {
        threads,
        inserted,
        failed,
        rows: db.rows(PRODUCT)?.len(),
        elapsed_ms: start.elapsed().as_millis(),
        stats: db.stats().into(),
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("Threads: {}", result.threads);
            println!("Inserted: {}", result.inserted);
            println!("Failed: {}", result.failed);
            println!("Rows: {}", result.rows);
            println!("Elapsed: {} ms", result.elapsed_ms);
            result.stats.print_text();
        }
    }

    Ok(())
}
