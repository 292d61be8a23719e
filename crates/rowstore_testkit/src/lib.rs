//! # rowstore testkit
//!
//! Test utilities for rowstore.
//!
//! This crate provides:
//! - Sample models and row/batch builders
//! - Property-based test generators using proptest
//! - Concurrency stress helpers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rowstore_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_database() {
//!     let db = memory_db(products_model());
//!     let product = db.entity_type(PRODUCT).unwrap();
//!     db.save_changes(&insert_batch(&product, vec![product_row(1, "A")])).unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
