//! Table construction by key shape.

use crate::error::CoreResult;
use crate::key::{CompositeKey, KeyShape, KeyType, KeyValue};
use crate::schema::EntityType;
use crate::table::{KeyedTable, Table};
use crate::value::IntegerKind;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Builds an empty table for an entity type.
pub type TableConstructor = fn(Arc<EntityType>, KeyShape, bool) -> Box<dyn Table>;

fn construct<K: KeyValue>(
    entity_type: Arc<EntityType>,
    key_shape: KeyShape,
    sensitive_data_logging: bool,
) -> Box<dyn Table> {
    Box::new(KeyedTable::<K>::new(
        entity_type,
        key_shape,
        sensitive_data_logging,
    ))
}

fn specialize(shape: &KeyShape) -> CoreResult<TableConstructor> {
    shape.validate()?;
    let ctor: TableConstructor = match shape {
        KeyShape::Single(KeyType::Integer(kind)) => match kind {
            IntegerKind::I8 => construct::<i8>,
            IntegerKind::I16 => construct::<i16>,
            IntegerKind::I32 => construct::<i32>,
            IntegerKind::I64 => construct::<i64>,
            IntegerKind::U8 => construct::<u8>,
            IntegerKind::U16 => construct::<u16>,
            IntegerKind::U32 => construct::<u32>,
            IntegerKind::U64 => construct::<u64>,
        },
        KeyShape::Single(KeyType::Text) => construct::<String>,
        KeyShape::Single(KeyType::Bytes) => construct::<Vec<u8>>,
        KeyShape::Single(KeyType::Uuid) => construct::<Uuid>,
        KeyShape::Composite(_) => construct::<CompositeKey>,
    };
    Ok(ctor)
}

/// Creates keyed tables specialized to an entity type's key.
///
/// The constructor chosen for each key shape is memoized, so repeated
/// requests for the same shape skip the selection step.
#[derive(Debug, Default)]
pub struct TableFactory {
    sensitive_data_logging: bool,
    constructors: DashMap<KeyShape, TableConstructor>,
}

impl TableFactory {
    /// Creates a factory.
    ///
    /// With `sensitive_data_logging` off, key values in table errors are
    /// rendered as `<redacted>`.
    pub fn new(sensitive_data_logging: bool) -> Self {
        Self {
            sensitive_data_logging,
            constructors: DashMap::new(),
        }
    }

    /// Whether tables built by this factory render key values in errors.
    #[must_use]
    pub fn sensitive_data_logging(&self) -> bool {
        self.sensitive_data_logging
    }

    /// Returns the memoized constructor for `shape`.
    pub fn constructor(&self, shape: &KeyShape) -> CoreResult<TableConstructor> {
        if let Some(ctor) = self.constructors.get(shape) {
            return Ok(*ctor);
        }
        let ctor = *self
            .constructors
            .entry(shape.clone())
            .or_try_insert_with(|| specialize(shape))?;
        Ok(ctor)
    }

    /// Creates an empty table for `entity_type`.
    pub fn create(&self, entity_type: &Arc<EntityType>) -> CoreResult<Box<dyn Table>> {
        let shape = entity_type.key_shape()?;
        let ctor = self.constructor(&shape)?;
        debug!(
            entity_type = entity_type.name(),
            table = entity_type.table_name(),
            key = %shape,
            "created table"
        );
        Ok(ctor(Arc::clone(entity_type), shape, self.sensitive_data_logging))
    }

    /// Number of memoized key shapes.
    #[must_use]
    pub fn memoized_shapes(&self) -> usize {
        self.constructors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::row;
    use crate::schema::{Column, ColumnType};

    fn entity(name: &str, columns: &[(&str, ColumnType)], key: &[&str]) -> Arc<EntityType> {
        let builder = columns
            .iter()
            .fold(EntityType::builder(name), |b, (n, t)| b.column(Column::new(*n, *t)));
        Arc::new(builder.key(key).build().unwrap())
    }

    #[test]
    fn specializes_each_key_type() {
        let factory = TableFactory::new(false);
        let cases = [
            (ColumnType::Text, row!["k", 1i32]),
            (ColumnType::Bytes, row![vec![1u8], 1i32]),
            (ColumnType::Uuid, row![Uuid::nil(), 1i32]),
            (ColumnType::Integer(IntegerKind::U64), row![5u64, 1i32]),
        ];
        for (key_type, r) in cases {
            let et = entity(
                "T",
                &[("k", key_type), ("v", ColumnType::Integer(IntegerKind::I32))],
                &["k"],
            );
            let mut table = factory.create(&et).unwrap();
            table.create(&et, r).unwrap();
            assert_eq!(table.len(), 1);
        }
        assert_eq!(factory.memoized_shapes(), 4);
    }

    #[test]
    fn composite_keys_use_composite_table() {
        let factory = TableFactory::new(false);
        let et = entity(
            "OrderLine",
            &[("order", ColumnType::Uuid), ("line", ColumnType::Integer(IntegerKind::U16))],
            &["order", "line"],
        );
        let mut table = factory.create(&et).unwrap();
        let order = Uuid::new_v4();
        table.create(&et, row![order, 1u16]).unwrap();
        table.create(&et, row![order, 2u16]).unwrap();
        assert!(matches!(
            table.create(&et, row![order, 1u16]),
            Err(CoreError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn memoizes_constructors() {
        let factory = TableFactory::new(false);
        let a = entity("A", &[("id", ColumnType::Integer(IntegerKind::I32))], &["id"]);
        let b = entity("B", &[("id", ColumnType::Integer(IntegerKind::I32))], &["id"]);
        factory.create(&a).unwrap();
        factory.create(&b).unwrap();
        assert_eq!(factory.memoized_shapes(), 1);
    }

    #[test]
    fn rejects_unsupported_shapes() {
        let factory = TableFactory::new(false);
        let flag = entity("Flag", &[("on", ColumnType::Bool)], &["on"]);
        assert!(matches!(factory.create(&flag), Err(CoreError::InvalidKeyShape { .. })));
        assert!(factory
            .constructor(&KeyShape::Composite(vec![KeyType::Text]))
            .is_err());
        assert_eq!(factory.memoized_shapes(), 0);
    }
}
