use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use super::schema::EntityKind;

/// A stored row keyed by column name, including `id`
pub type Row = Map<String, Value>;

/// Errors from a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    Config(&'static str),

    #[error("Unknown column '{column}' on {kind}")]
    UnknownColumn { kind: EntityKind, column: String },

    #[error("Invalid value for {kind}.{column}: {value}")]
    InvalidValue { kind: EntityKind, column: String, value: Value },

    #[error("Constraint violated on {kind}: {message}")]
    Constraint { kind: EntityKind, message: String },

    #[error("Duplicate value on {kind}: {detail}")]
    Duplicate { kind: EntityKind, detail: String },

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    #[error("Unexpected row format from {0}")]
    Decode(EntityKind),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Conjunction of column equality clauses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    clauses: Vec<(String, Value)>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((column.into(), value.into()));
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.clauses.push((column.into(), value.into()));
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.clauses
            .iter()
            .all(|(column, value)| row.get(column) == Some(value))
    }
}

/// Row-level persistence used by every handler.
///
/// Each method is a single statement against one table; the backend is the
/// only arbiter of concurrent writes.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_by_id(&self, kind: EntityKind, id: i64) -> Result<Option<Row>, StoreError>;

    /// All rows matching the condition, ordered by id
    async fn find_all(&self, kind: EntityKind, condition: &Condition) -> Result<Vec<Row>, StoreError>;

    /// Insert a row and return it as stored, with its assigned id
    async fn insert(&self, kind: EntityKind, values: Row) -> Result<Row, StoreError>;

    /// Apply the given column values to one row and return the stored result
    async fn update(&self, kind: EntityKind, id: i64, changes: Row) -> Result<Row, StoreError>;

    /// Returns false when no row had that id
    async fn delete(&self, kind: EntityKind, id: i64) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Read the surrogate id of a stored row
pub fn row_id(kind: EntityKind, row: &Row) -> Result<i64, StoreError> {
    row.get(super::schema::ID_COLUMN)
        .and_then(Value::as_i64)
        .ok_or(StoreError::Decode(kind))
}
