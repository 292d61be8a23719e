//! Read-only description of entity types.
//!
//! The schema is supplied by the caller and never mutated by the store.
//! It tells the store, for each entity type:
//! - the column layout and which columns form the primary key
//! - how column values compare (see [`ValueComparer`])
//! - where the type sits in an inheritance hierarchy
//! - which physical table it maps to, and its seed rows

use crate::error::{CoreError, CoreResult, REDACTED};
use crate::key::{KeyShape, KeyType};
use crate::value::{IntegerKind, Row, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Compares two column values for equality.
pub type ValueComparer = fn(&Value, &Value) -> bool;

fn structural_eq(a: &Value, b: &Value) -> bool {
    a == b
}

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Boolean column.
    Bool,
    /// Integer column of a given width.
    Integer(IntegerKind),
    /// UTF-8 text column.
    Text,
    /// Byte sequence column.
    Bytes,
    /// GUID column.
    Uuid,
}

impl ColumnType {
    /// Returns true if a non-null `value` belongs to this column type.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool, Value::Bool(_))
            | (Self::Text, Value::Text(_))
            | (Self::Bytes, Value::Bytes(_))
            | (Self::Uuid, Value::Uuid(_)) => true,
            (Self::Integer(kind), v) => v.integer_kind() == Some(kind),
            _ => false,
        }
    }

    /// The key type a column of this type contributes, if it can be a key.
    #[must_use]
    pub fn key_type(self) -> Option<KeyType> {
        match self {
            Self::Bool => None,
            Self::Integer(kind) => Some(KeyType::Integer(kind)),
            Self::Text => Some(KeyType::Text),
            Self::Bytes => Some(KeyType::Bytes),
            Self::Uuid => Some(KeyType::Uuid),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Integer(kind) => write!(f, "{kind}"),
            Self::Text => f.write_str("text"),
            Self::Bytes => f.write_str("bytes"),
            Self::Uuid => f.write_str("uuid"),
        }
    }
}

/// A column of an entity type.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    nullable: bool,
    store_generated: bool,
    concurrency_token: bool,
    comparer: ValueComparer,
}

impl Column {
    /// Creates a non-nullable column compared by structural equality.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            store_generated: false,
            concurrency_token: false,
            comparer: structural_eq,
        }
    }

    /// Allows null values.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Marks the column as filled by the store's value generator.
    #[must_use]
    pub fn store_generated(mut self) -> Self {
        self.store_generated = true;
        self
    }

    /// Marks the column as checked against original values on update.
    #[must_use]
    pub fn concurrency_token(mut self) -> Self {
        self.concurrency_token = true;
        self
    }

    /// Replaces the equality used when comparing values of this column.
    #[must_use]
    pub fn with_comparer(mut self, comparer: ValueComparer) -> Self {
        self.comparer = comparer;
        self
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Whether nulls are allowed.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether the store generates values for this column.
    #[must_use]
    pub fn is_store_generated(&self) -> bool {
        self.store_generated
    }

    /// Whether the column is a concurrency token.
    #[must_use]
    pub fn is_concurrency_token(&self) -> bool {
        self.concurrency_token
    }

    /// Compares two values with the column's declared comparer.
    #[must_use]
    pub fn values_equal(&self, a: &Value, b: &Value) -> bool {
        (self.comparer)(a, b)
    }
}

/// Description of one logical entity type.
#[derive(Debug, Clone)]
pub struct EntityType {
    name: String,
    columns: Vec<Column>,
    key: Vec<usize>,
    base: Option<String>,
    is_abstract: bool,
    table: Option<String>,
    seed: Vec<Row>,
}

impl EntityType {
    /// Starts describing an entity type.
    pub fn builder(name: impl Into<String>) -> EntityTypeBuilder {
        EntityTypeBuilder {
            name: name.into(),
            columns: Vec::new(),
            key: Vec::new(),
            base: None,
            is_abstract: false,
            table: None,
            seed: Vec::new(),
        }
    }

    /// Entity type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in row order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column by name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Positions of the primary key columns.
    #[must_use]
    pub fn key_columns(&self) -> &[usize] {
        &self.key
    }

    /// Name of the base type, if any.
    #[must_use]
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Whether the type can have rows of its own.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Name of the physical table backing the type.
    ///
    /// Types that split one table declare the same table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.name)
    }

    /// Rows to insert when the database is first created.
    #[must_use]
    pub fn seed_data(&self) -> &[Row] {
        &self.seed
    }

    /// Shape of the primary key.
    pub fn key_shape(&self) -> CoreResult<KeyShape> {
        let mut parts = Vec::with_capacity(self.key.len());
        for &index in &self.key {
            let column = &self.columns[index];
            if column.nullable {
                return Err(CoreError::invalid_key_shape(format!(
                    "{}.{} is nullable and cannot be part of the key",
                    self.name, column.name
                )));
            }
            let key_type = column.column_type.key_type().ok_or_else(|| {
                CoreError::invalid_key_shape(format!(
                    "{}.{} has type {} which cannot be a key",
                    self.name, column.name, column.column_type
                ))
            })?;
            parts.push(key_type);
        }
        let shape = match parts.len() {
            0 => {
                return Err(CoreError::invalid_key_shape(format!(
                    "{} has no key columns",
                    self.name
                )))
            }
            1 => KeyShape::Single(parts[0]),
            _ => KeyShape::Composite(parts),
        };
        Ok(shape)
    }

    /// Checks arity, nullability and column types of a row.
    pub fn validate_row(&self, row: &Row) -> CoreResult<()> {
        if row.len() != self.columns.len() {
            return Err(CoreError::invalid_row(
                &self.name,
                format!("expected {} columns, got {}", self.columns.len(), row.len()),
            ));
        }
        for (column, value) in self.columns.iter().zip(row.values()) {
            if value.is_null() {
                if !column.nullable {
                    return Err(CoreError::invalid_row(
                        &self.name,
                        format!("column {} is not nullable", column.name),
                    ));
                }
            } else if !column.column_type.accepts(value) {
                return Err(CoreError::invalid_row(
                    &self.name,
                    format!(
                        "column {} expects {}, got {}",
                        column.name,
                        column.column_type,
                        value.type_name()
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Returns true if every concurrency token of `current` equals `original`.
    #[must_use]
    pub fn concurrency_tokens_match(&self, current: &Row, original: &Row) -> bool {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.concurrency_token)
            .all(|(i, c)| match (current.get(i), original.get(i)) {
                (Some(a), Some(b)) => c.values_equal(a, b),
                _ => false,
            })
    }

    /// Renders the key of `row` for messages, honouring sensitive logging.
    #[must_use]
    pub fn render_key(&self, row: &Row, sensitive: bool) -> String {
        if !sensitive {
            return REDACTED.to_string();
        }
        let parts: Vec<String> = self
            .key
            .iter()
            .map(|&i| row.get(i).map_or_else(|| "?".to_string(), Value::to_string))
            .collect();
        if parts.len() == 1 {
            parts.into_iter().next().unwrap_or_default()
        } else {
            format!("({})", parts.join(", "))
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Builder for [`EntityType`].
#[derive(Debug)]
pub struct EntityTypeBuilder {
    name: String,
    columns: Vec<Column>,
    key: Vec<String>,
    base: Option<String>,
    is_abstract: bool,
    table: Option<String>,
    seed: Vec<Row>,
}

impl EntityTypeBuilder {
    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the primary key columns by name, in key order.
    #[must_use]
    pub fn key(mut self, columns: &[&str]) -> Self {
        self.key = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Derives the type from `base`.
    #[must_use]
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Marks the type abstract.
    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Maps the type onto a named physical table.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Adds a seed row.
    #[must_use]
    pub fn seed(mut self, row: Row) -> Self {
        self.seed.push(row);
        self
    }

    /// Validates and builds the entity type.
    pub fn build(self) -> CoreResult<EntityType> {
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(CoreError::invalid_operation(format!(
                    "{} declares column {} twice",
                    self.name, column.name
                )));
            }
        }

        let mut key = Vec::with_capacity(self.key.len());
        for name in &self.key {
            let index = self
                .columns
                .iter()
                .position(|c| &c.name == name)
                .ok_or_else(|| {
                    CoreError::invalid_key_shape(format!(
                        "{} key column {} does not exist",
                        self.name, name
                    ))
                })?;
            key.push(index);
        }

        let entity_type = EntityType {
            name: self.name,
            columns: self.columns,
            key,
            base: self.base,
            is_abstract: self.is_abstract,
            table: self.table,
            seed: self.seed,
        };
        for row in &entity_type.seed {
            entity_type.validate_row(row)?;
        }
        Ok(entity_type)
    }
}

/// The set of entity types a store is used with.
#[derive(Debug, Clone, Default)]
pub struct Model {
    types: Vec<Arc<EntityType>>,
    by_name: HashMap<String, usize>,
}

impl Model {
    /// Builds a model, checking names are unique and bases resolve.
    pub fn new(types: Vec<EntityType>) -> CoreResult<Self> {
        let mut by_name = HashMap::with_capacity(types.len());
        for (i, entity_type) in types.iter().enumerate() {
            if by_name.insert(entity_type.name.clone(), i).is_some() {
                return Err(CoreError::invalid_operation(format!(
                    "entity type {} declared twice",
                    entity_type.name
                )));
            }
        }

        let model = Self {
            types: types.into_iter().map(Arc::new).collect(),
            by_name,
        };

        for entity_type in &model.types {
            let mut steps = 0;
            let mut current = entity_type.base();
            while let Some(base) = current {
                let parent = model.entity_type(base)?;
                steps += 1;
                if steps > model.types.len() {
                    return Err(CoreError::invalid_operation(format!(
                        "inheritance cycle through {}",
                        entity_type.name
                    )));
                }
                current = parent.base();
            }
        }
        Ok(model)
    }

    /// Looks up an entity type by name.
    pub fn entity_type(&self, name: &str) -> CoreResult<&Arc<EntityType>> {
        self.by_name
            .get(name)
            .map(|&i| &self.types[i])
            .ok_or_else(|| CoreError::UnknownEntityType {
                name: name.to_string(),
            })
    }

    /// All entity types in declaration order.
    pub fn entity_types(&self) -> impl Iterator<Item = &Arc<EntityType>> {
        self.types.iter()
    }

    /// Returns the type and its transitive derived types that can hold rows.
    ///
    /// Types are returned in declaration order.
    pub fn concrete_types_in_hierarchy(&self, name: &str) -> CoreResult<Vec<Arc<EntityType>>> {
        self.entity_type(name)?;
        Ok(self
            .types
            .iter()
            .filter(|t| !t.is_abstract && self.derives_from(t, name))
            .cloned()
            .collect())
    }

    fn derives_from(&self, entity_type: &EntityType, ancestor: &str) -> bool {
        let mut current = Some(entity_type);
        while let Some(t) = current {
            if t.name == ancestor {
                return true;
            }
            current = t.base().and_then(|b| self.entity_type(b).ok()).map(|arc| &**arc);
        }
        false
    }
}
