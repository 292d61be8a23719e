//! Primary key types and key extraction.

use crate::error::{CoreError, CoreResult};
use crate::value::{IntegerKind, Row, Value};
use std::fmt;
use std::hash::Hash;
use uuid::Uuid;

/// A primary key value that can index a [`KeyedTable`](crate::KeyedTable).
///
/// Keys must be:
/// - Orderable, so snapshots come back in key order
/// - Hashable, so they can be memoized and compared cheaply
/// - Extractable from the key columns of a [`Row`]
pub trait KeyValue: Clone + Eq + Ord + Hash + fmt::Debug + Send + Sync + 'static {
    /// Builds the key from the `key_columns` of `row`.
    ///
    /// Returns a description of the mismatch if the columns do not hold this
    /// key type.
    fn extract(row: &Row, key_columns: &[usize]) -> Result<Self, String>;
}

fn single_column<'a>(row: &'a Row, key_columns: &[usize]) -> Result<&'a Value, String> {
    match key_columns {
        [index] => row
            .get(*index)
            .ok_or_else(|| format!("key column {index} is out of range")),
        _ => Err(format!(
            "expected a single key column, got {}",
            key_columns.len()
        )),
    }
}

macro_rules! impl_scalar_key {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl KeyValue for $ty {
                fn extract(row: &Row, key_columns: &[usize]) -> Result<Self, String> {
                    match single_column(row, key_columns)? {
                        Value::$variant(v) => Ok(<$ty as Clone>::clone(v)),
                        other => Err(format!(
                            "expected {} key, got {}",
                            stringify!($ty),
                            other.type_name()
                        )),
                    }
                }
            }
        )*
    };
}

impl_scalar_key! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    String => Text,
    Vec<u8> => Bytes,
    Uuid => Uuid,
}

/// One component of a composite key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarKey {
    /// Integer component, widened.
    Integer(i128),
    /// Text component.
    Text(String),
    /// Byte string component.
    Bytes(Vec<u8>),
    /// GUID component.
    Uuid(Uuid),
}

impl ScalarKey {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(Self::Text(s.clone())),
            Value::Bytes(b) => Some(Self::Bytes(b.clone())),
            Value::Uuid(u) => Some(Self::Uuid(*u)),
            other => other.as_i128().map(Self::Integer),
        }
    }
}

/// A key made of two or more columns, ordered component by component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeKey(pub Vec<ScalarKey>);

impl KeyValue for CompositeKey {
    fn extract(row: &Row, key_columns: &[usize]) -> Result<Self, String> {
        if key_columns.len() < 2 {
            return Err(format!(
                "composite key needs at least two columns, got {}",
                key_columns.len()
            ));
        }
        key_columns
            .iter()
            .map(|&index| {
                let value = row
                    .get(index)
                    .ok_or_else(|| format!("key column {index} is out of range"))?;
                ScalarKey::from_value(value)
                    .ok_or_else(|| format!("{} cannot be a key component", value.type_name()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// Underlying type of one key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// Integer key of a given width.
    Integer(IntegerKind),
    /// Text key.
    Text,
    /// Byte string key.
    Bytes,
    /// GUID key.
    Uuid,
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(kind) => write!(f, "{kind}"),
            Self::Text => f.write_str("text"),
            Self::Bytes => f.write_str("bytes"),
            Self::Uuid => f.write_str("uuid"),
        }
    }
}

/// Describes the primary key of an entity type.
///
/// The table factory picks a [`KeyValue`] implementation from the shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyShape {
    /// One key column.
    Single(KeyType),
    /// Two or more key columns.
    Composite(Vec<KeyType>),
}

impl KeyShape {
    /// Number of key columns.
    #[must_use]
    pub fn arity(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Composite(parts) => parts.len(),
        }
    }

    /// Rejects shapes no table can be built for.
    pub fn validate(&self) -> CoreResult<()> {
        match self {
            Self::Composite(parts) if parts.len() < 2 => Err(CoreError::invalid_key_shape(
                format!("composite key needs at least two columns, got {}", parts.len()),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for KeyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(key_type) => write!(f, "{key_type}"),
            Self::Composite(parts) => {
                f.write_str("(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{part}")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn scalar_extract() {
        let r = row![7i32, "A"];
        assert_eq!(i32::extract(&r, &[0]), Ok(7));
        assert_eq!(String::extract(&r, &[1]), Ok("A".to_string()));
        assert!(i64::extract(&r, &[0]).is_err());
        assert!(i32::extract(&r, &[4]).is_err());
        assert!(i32::extract(&r, &[0, 1]).is_err());
    }

    #[test]
    fn composite_extract_orders_by_component() {
        let a = CompositeKey::extract(&row![1u8, "b"], &[0, 1]).unwrap();
        let b = CompositeKey::extract(&row![1u8, "c"], &[0, 1]).unwrap();
        let c = CompositeKey::extract(&row![2u8, "a"], &[0, 1]).unwrap();
        assert!(a < b && b < c);
        assert!(CompositeKey::extract(&row![1u8], &[0]).is_err());
        assert!(CompositeKey::extract(&row![true, 1u8], &[0, 1]).is_err());
    }

    #[test]
    fn shape_validation() {
        assert!(KeyShape::Single(KeyType::Text).validate().is_ok());
        assert!(KeyShape::Composite(vec![KeyType::Uuid]).validate().is_err());
        let pair = KeyShape::Composite(vec![KeyType::Uuid, KeyType::Integer(IntegerKind::I16)]);
        assert!(pair.validate().is_ok());
        assert_eq!(pair.arity(), 2);
        assert_eq!(pair.to_string(), "(uuid, i16)");
    }
}
