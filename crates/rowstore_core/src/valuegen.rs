//! Store-generated integer keys.
//!
//! Each table keeps one monotonic counter per integer kind. Values start at
//! 1 and are never handed out twice, even after the row holding them is
//! deleted or the batch using them is rolled back.

use crate::error::{CoreError, CoreResult};
use crate::schema::{ColumnType, EntityType};
use crate::store::Store;
use crate::value::{IntegerKind, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A primitive integer type a generator can produce.
pub trait GeneratedInteger: Copy + Send + Sync + fmt::Debug + 'static {
    /// Kind of the counter backing this type.
    const KIND: IntegerKind;

    /// Unwraps a value of this type.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_generated_integer {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl GeneratedInteger for $ty {
                const KIND: IntegerKind = IntegerKind::$variant;

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(n) => Some(*n),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_generated_integer! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
}

/// Type-erased generator returned by [`ValueGeneratorSelector`].
pub trait ValueGenerator: Send + Sync + fmt::Debug {
    /// Allocates the next value.
    fn next(&self) -> CoreResult<Value>;

    /// Integer kind produced.
    fn kind(&self) -> IntegerKind;
}

/// Allocates values of `T` from the table of one entity type.
#[derive(Debug)]
pub struct IntegerValueGenerator<T: GeneratedInteger> {
    store: Arc<Store>,
    entity_type: Arc<EntityType>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: GeneratedInteger> IntegerValueGenerator<T> {
    /// Creates a generator bound to the table of `entity_type` in `store`.
    pub fn new(store: Arc<Store>, entity_type: Arc<EntityType>) -> Self {
        Self {
            store,
            entity_type,
            _marker: PhantomData,
        }
    }

    /// Allocates the next value.
    pub fn next_value(&self) -> CoreResult<T> {
        let value = self.store.allocate_next_integer(&self.entity_type, T::KIND)?;
        T::from_value(&value).ok_or_else(|| {
            CoreError::invalid_operation(format!(
                "counter for {} returned {} instead of {}",
                self.entity_type.name(),
                value.type_name(),
                T::KIND
            ))
        })
    }
}

impl<T: GeneratedInteger> ValueGenerator for IntegerValueGenerator<T> {
    fn next(&self) -> CoreResult<Value> {
        self.store.allocate_next_integer(&self.entity_type, T::KIND)
    }

    fn kind(&self) -> IntegerKind {
        T::KIND
    }
}

/// Picks the generator matching a column's integer kind.
#[derive(Debug, Clone)]
pub struct ValueGeneratorSelector {
    store: Arc<Store>,
}

impl ValueGeneratorSelector {
    /// Creates a selector for generators bound to `store`.
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Returns a generator for `column` of `entity_type`.
    ///
    /// Fails with `InvalidGeneratorTarget` if the column does not exist or
    /// is not an integer column.
    pub fn select(
        &self,
        entity_type: &Arc<EntityType>,
        column: &str,
    ) -> CoreResult<Box<dyn ValueGenerator>> {
        let declared = entity_type.column(column).ok_or_else(|| {
            CoreError::invalid_generator_target(entity_type.name(), column, "no such column")
        })?;
        let ColumnType::Integer(kind) = declared.column_type() else {
            return Err(CoreError::invalid_generator_target(
                entity_type.name(),
                column,
                format!("{} is not an integer type", declared.column_type()),
            ));
        };

        let store = Arc::clone(&self.store);
        let entity_type = Arc::clone(entity_type);
        let generator: Box<dyn ValueGenerator> = match kind {
            IntegerKind::I8 => Box::new(IntegerValueGenerator::<i8>::new(store, entity_type)),
            IntegerKind::I16 => Box::new(IntegerValueGenerator::<i16>::new(store, entity_type)),
            IntegerKind::I32 => Box::new(IntegerValueGenerator::<i32>::new(store, entity_type)),
            IntegerKind::I64 => Box::new(IntegerValueGenerator::<i64>::new(store, entity_type)),
            IntegerKind::U8 => Box::new(IntegerValueGenerator::<u8>::new(store, entity_type)),
            IntegerKind::U16 => Box::new(IntegerValueGenerator::<u16>::new(store, entity_type)),
            IntegerKind::U32 => Box::new(IntegerValueGenerator::<u32>::new(store, entity_type)),
            IntegerKind::U64 => Box::new(IntegerValueGenerator::<u64>::new(store, entity_type)),
        };
        Ok(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::TableFactory;
    use crate::schema::Column;

    fn setup() -> (Arc<Store>, Arc<EntityType>) {
        let store = Arc::new(Store::new("gen", Arc::new(TableFactory::new(false))));
        let et = EntityType::builder("Item")
            .column(Column::new("id", ColumnType::Integer(IntegerKind::I64)).store_generated())
            .column(Column::new("seq", ColumnType::Integer(IntegerKind::U8)))
            .column(Column::new("name", ColumnType::Text))
            .key(&["id"])
            .build()
            .unwrap();
        (store, Arc::new(et))
    }

    #[test]
    fn typed_generator_counts_from_one() {
        let (store, et) = setup();
        let generator = IntegerValueGenerator::<i64>::new(store, et);
        assert_eq!(generator.next_value().unwrap(), 1);
        assert_eq!(generator.next_value().unwrap(), 2);
    }

    #[test]
    fn selector_matches_column_kind() {
        let (store, et) = setup();
        let selector = ValueGeneratorSelector::new(Arc::clone(&store));

        let id = selector.select(&et, "id").unwrap();
        assert_eq!(id.kind(), IntegerKind::I64);
        assert_eq!(id.next().unwrap(), Value::I64(1));

        let seq = selector.select(&et, "seq").unwrap();
        assert_eq!(seq.next().unwrap(), Value::U8(1));
        assert_eq!(id.next().unwrap(), Value::I64(2));
    }

    #[test]
    fn selector_rejects_non_integer_columns() {
        let (store, et) = setup();
        let selector = ValueGeneratorSelector::new(store);
        assert!(matches!(
            selector.select(&et, "name"),
            Err(CoreError::InvalidGeneratorTarget { .. })
        ));
        assert!(matches!(
            selector.select(&et, "missing"),
            Err(CoreError::InvalidGeneratorTarget { .. })
        ));
    }

    #[test]
    fn u8_generator_exhausts() {
        let (store, et) = setup();
        let generator = IntegerValueGenerator::<u8>::new(store, et);
        for expected in 1..=u8::MAX {
            assert_eq!(generator.next_value().unwrap(), expected);
        }
        assert!(matches!(
            generator.next_value(),
            Err(CoreError::GeneratorExhausted { .. })
        ));
    }
}
