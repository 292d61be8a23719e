//! Benchmark utilities for rowstore.

#![warn(missing_docs)]

pub mod utils;
