//! Stress helpers for rowstore.
//!
//! These run many threads against one store and report how many operations
//! succeeded.

use crate::fixtures::{product_row, PRODUCT};
use rowstore_core::{Database, PendingChange, Store, StoreCache, Value};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone, Serialize)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform across all threads.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
        }
    }
}

fn run_threads<F>(threads: usize, work: F) -> (usize, usize)
where
    F: Fn(usize, &AtomicUsize, &AtomicUsize) + Send + Sync + 'static,
{
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let work = Arc::new(work);

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let work = Arc::clone(&work);
            thread::spawn(move || work(t, &successful, &failed))
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    (
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
    )
}

/// Inserts products with generated ids from several threads at once.
///
/// `db` must be opened on a products model.
pub fn stress_concurrent_inserts(db: Arc<Database>, config: &StressConfig) -> StressTestResult {
    let ops_per_thread = config.operations / config.threads.max(1);
    let start = Instant::now();

    let (successful, failed) = run_threads(config.threads, move |t, successful, failed| {
        let product = db.entity_type(PRODUCT).expect("products model");
        let ids = db.value_generator(PRODUCT, "id").expect("integer id column");
        for i in 0..ops_per_thread {
            let result = ids.next().and_then(|id| {
                let Value::I32(id) = id else {
                    unreachable!("product ids are i32");
                };
                let name = format!("t{t}-{i}");
                db.save_changes(&[PendingChange::added(&product, product_row(id, &name))])
            });
            match result {
                Ok(_) => successful.fetch_add(1, Ordering::Relaxed),
                Err(_) => failed.fetch_add(1, Ordering::Relaxed),
            };
        }
    });

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Rewrites every row in one batch while readers take snapshots.
///
/// A snapshot whose rows do not all carry the same name saw a partial batch
/// and counts as a failure.
pub fn stress_readers_and_writers(
    db: Arc<Database>,
    config: &StressConfig,
    rows: i32,
) -> StressTestResult {
    let product = db.entity_type(PRODUCT).expect("products model");
    let seed: Vec<PendingChange> = (1..=rows)
        .map(|id| PendingChange::added(&product, product_row(id, "v0")))
        .collect();
    db.save_changes(&seed).expect("seed rows");

    let ops_per_thread = config.operations / config.threads.max(1);
    let start = Instant::now();

    let (successful, failed) = run_threads(config.threads, move |t, successful, failed| {
        for i in 0..ops_per_thread {
            let ok = if t % 2 == 0 {
                let name = format!("v{t}-{i}");
                let batch: Vec<PendingChange> = (1..=rows)
                    .map(|id| PendingChange::modified(&product, product_row(id, &name)))
                    .collect();
                db.save_changes(&batch).is_ok()
            } else {
                match db.rows(PRODUCT) {
                    Ok(snapshot) => {
                        snapshot.len() == usize::try_from(rows).unwrap_or(0)
                            && snapshot.windows(2).all(|w| w[0][1] == w[1][1])
                    }
                    Err(_) => false,
                }
            };
            if ok {
                successful.fetch_add(1, Ordering::Relaxed);
            } else {
                failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Asks `cache` for the same store name from `threads` threads at once and
/// returns every store handed out.
pub fn stress_cache_first_access(cache: Arc<StoreCache>, name: &str, threads: usize) -> Vec<Arc<Store>> {
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            let name = name.to_string();
            thread::spawn(move || {
                barrier.wait();
                cache.get_store(&name)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{memory_db, products_model};
    use rowstore_core::TableFactory;
    use std::collections::HashSet;

    #[test]
    fn test_concurrent_inserts() {
        let db = Arc::new(memory_db(products_model()));
        let config = StressConfig {
            operations: 2_000,
            threads: 8,
        };

        let result = stress_concurrent_inserts(Arc::clone(&db), &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.successful_ops, 2_000);

        let ids: HashSet<Value> = db
            .rows(PRODUCT)
            .unwrap()
            .into_iter()
            .map(|r| r[0].clone())
            .collect();
        assert_eq!(ids.len(), 2_000);
    }

    #[test]
    fn test_readers_never_see_partial_batches() {
        let db = Arc::new(memory_db(products_model()));
        let config = StressConfig {
            operations: 1_000,
            threads: 4,
        };

        let result = stress_readers_and_writers(db, &config, 16);
        assert_eq!(result.failed_ops, 0);
    }

    #[test]
    fn test_cache_first_access() {
        let cache = Arc::new(StoreCache::new(Arc::new(TableFactory::new(false))));
        let stores = stress_cache_first_access(Arc::clone(&cache), "race", 16);
        assert!(stores.iter().all(|s| Arc::ptr_eq(s, &stores[0])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn result_serializes() {
        let result = StressTestResult::new(3, 1, Duration::from_millis(10));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["total_ops"], 4);
    }
}
