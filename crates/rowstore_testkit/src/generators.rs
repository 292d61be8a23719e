//! Property-based test generators using proptest.

use proptest::prelude::*;
use rowstore_core::IntegerKind;

/// Strategy for generating store names.
pub fn store_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,31}").expect("Invalid regex")
}

/// Strategy for generating product names.
pub fn product_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z ]{1,16}").expect("Invalid regex")
}

/// Strategy for picking an integer kind.
pub fn integer_kind_strategy() -> impl Strategy<Value = IntegerKind> {
    prop::sample::select(IntegerKind::ALL.to_vec())
}

/// A single change against the products table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductOp {
    /// Insert a product.
    Insert {
        /// Product id
        id: i32,
        /// Product name
        name: String,
    },
    /// Rename a product.
    Update {
        /// Product id
        id: i32,
        /// New name
        name: String,
    },
    /// Delete a product.
    Delete {
        /// Product id
        id: i32,
    },
}

impl ProductOp {
    /// Id the operation targets.
    #[must_use]
    pub fn id(&self) -> i32 {
        match self {
            Self::Insert { id, .. } | Self::Update { id, .. } | Self::Delete { id } => *id,
        }
    }
}

/// Strategy for generating product operations over ids `1..=max_id`.
pub fn product_op_strategy(max_id: i32) -> impl Strategy<Value = ProductOp> {
    let id = 1..=max_id;
    prop_oneof![
        3 => (id.clone(), product_name_strategy())
            .prop_map(|(id, name)| ProductOp::Insert { id, name }),
        2 => (id.clone(), product_name_strategy())
            .prop_map(|(id, name)| ProductOp::Update { id, name }),
        1 => id.prop_map(|id| ProductOp::Delete { id }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn product_op_sequence_strategy(
    max_id: i32,
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<ProductOp>> {
    prop::collection::vec(product_op_strategy(max_id), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{insert_batch, memory_db, product_row, products_model, PRODUCT};
    use rowstore_core::{CoreError, PendingChange, Row, Value};
    use std::collections::BTreeMap;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn store_name_is_valid(name in store_name_strategy()) {
            let first = name.chars().next();
            prop_assert!(first.is_some_and(|c| c.is_ascii_alphabetic()));
        }

        #[test]
        fn store_agrees_with_map(ops in product_op_sequence_strategy(8, 1, 48)) {
            let db = memory_db(products_model());
            let product = db.entity_type(PRODUCT).unwrap();
            let mut model: BTreeMap<i32, String> = BTreeMap::new();

            for op in ops {
                let (entry, expected_ok) = match &op {
                    ProductOp::Insert { id, name } => (
                        PendingChange::added(&product, product_row(*id, name)),
                        !model.contains_key(id),
                    ),
                    ProductOp::Update { id, name } => (
                        PendingChange::modified(&product, product_row(*id, name)),
                        model.contains_key(id),
                    ),
                    ProductOp::Delete { id } => (
                        PendingChange::deleted(&product, product_row(*id, "")),
                        model.contains_key(id),
                    ),
                };
                let result = db.save_changes(&[entry]);
                prop_assert_eq!(result.is_ok(), expected_ok, "{:?}", op);
                match (op, result) {
                    (ProductOp::Insert { id, name } | ProductOp::Update { id, name }, Ok(_)) => {
                        model.insert(id, name);
                    }
                    (ProductOp::Delete { id }, Ok(_)) => {
                        model.remove(&id);
                    }
                    (_, Err(err)) => {
                        prop_assert!(
                            matches!(
                                err.root_cause(),
                                CoreError::DuplicateKey { .. } | CoreError::NotFound { .. }
                            ),
                            "unexpected error: {:?}",
                            err
                        );
                    }
                }
            }

            let expected: Vec<Row> = model
                .iter()
                .map(|(id, name)| product_row(*id, name))
                .collect();
            prop_assert_eq!(db.rows(PRODUCT).unwrap(), expected);
        }

        #[test]
        fn snapshot_is_in_key_order(ids in prop::collection::btree_set(any::<i32>(), 0..32)) {
            let db = memory_db(products_model());
            let product = db.entity_type(PRODUCT).unwrap();
            let mut shuffled: Vec<i32> = ids.iter().copied().collect();
            shuffled.reverse();
            let rows = shuffled.iter().map(|id| product_row(*id, "p")).collect();
            db.save_changes(&insert_batch(&product, rows)).unwrap();

            let stored: Vec<i32> = db
                .rows(PRODUCT)
                .unwrap()
                .iter()
                .map(|r| match r[0] {
                    Value::I32(id) => id,
                    _ => unreachable!(),
                })
                .collect();
            prop_assert_eq!(stored, ids.into_iter().collect::<Vec<_>>());
        }

        #[test]
        fn allocation_is_strictly_increasing(kind in integer_kind_strategy(), n in 1usize..64) {
            let db = memory_db(products_model());
            let product = db.entity_type(PRODUCT).unwrap();
            let mut last = 0i128;
            for _ in 0..n {
                let value = db.store().allocate_next_integer(&product, kind).unwrap();
                prop_assert_eq!(value.integer_kind(), Some(kind));
                let current = value.as_i128().unwrap();
                prop_assert!(current > last);
                last = current;
            }
        }
    }
}
