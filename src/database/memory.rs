use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use tokio::sync::RwLock;

use super::schema::{ColumnType, EntityKind, ID_COLUMN};
use super::store::{Condition, Row, Store, StoreError};

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Row>,
}

/// In-process store used by the test suite and `--store memory`.
///
/// Mirrors what the PostgreSQL schema enforces: known columns only, typed
/// values, NOT NULL columns and ON DELETE CASCADE foreign keys.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<EntityKind, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_value(kind: EntityKind, column: &str, value: &Value) -> Result<(), StoreError> {
        let def = kind.column(column).ok_or_else(|| StoreError::UnknownColumn {
            kind,
            column: column.to_string(),
        })?;

        if value.is_null() {
            if def.nullable {
                return Ok(());
            }
            return Err(StoreError::Constraint {
                kind,
                message: format!("null value in column \"{}\" violates not-null constraint", column),
            });
        }

        let ok = match def.ty {
            ColumnType::Integer => value.as_i64().is_some(),
            ColumnType::Text => value.is_string(),
            ColumnType::Date => value
                .as_str()
                .map(|s| s.parse::<NaiveDate>().is_ok())
                .unwrap_or(false),
        };

        if ok {
            Ok(())
        } else {
            Err(StoreError::InvalidValue {
                kind,
                column: column.to_string(),
                value: value.clone(),
            })
        }
    }

    /// Reject `candidate` if a unique column already holds its value in another row
    fn check_unique(kind: EntityKind, table: &Table, id: Option<i64>, candidate: &Row) -> Result<(), StoreError> {
        for column in kind.columns().iter().filter(|c| c.unique) {
            let Some(value) = candidate.get(column.name).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = table
                .rows
                .iter()
                .any(|(other, r)| Some(*other) != id && r.get(column.name) == Some(value));
            if taken {
                return Err(StoreError::Duplicate {
                    kind,
                    detail: format!("{} already exists", column.name),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_by_id(&self, kind: EntityKind, id: i64) -> Result<Option<Row>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.get(&kind).and_then(|t| t.rows.get(&id)).cloned())
    }

    async fn find_all(&self, kind: EntityKind, condition: &Condition) -> Result<Vec<Row>, StoreError> {
        for (column, _) in condition.clauses() {
            if column != ID_COLUMN && kind.column(column).is_none() {
                return Err(StoreError::UnknownColumn { kind, column: column.clone() });
            }
        }

        let tables = self.tables.read().await;
        Ok(tables
            .get(&kind)
            .map(|t| t.rows.values().filter(|r| condition.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, kind: EntityKind, values: Row) -> Result<Row, StoreError> {
        let mut row = Row::new();
        for column in kind.columns() {
            let value = values.get(column.name).cloned().unwrap_or(Value::Null);
            Self::check_value(kind, column.name, &value)?;
            row.insert(column.name.to_string(), value);
        }
        if let Some(extra) = values.keys().find(|k| kind.column(k).is_none()) {
            return Err(StoreError::UnknownColumn { kind, column: extra.clone() });
        }

        let mut tables = self.tables.write().await;
        let table = tables.entry(kind).or_default();
        Self::check_unique(kind, table, None, &row)?;
        table.next_id += 1;
        let id = table.next_id;
        row.insert(ID_COLUMN.to_string(), Value::from(id));
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, kind: EntityKind, id: i64, changes: Row) -> Result<Row, StoreError> {
        for (column, value) in &changes {
            Self::check_value(kind, column, value)?;
        }

        let mut tables = self.tables.write().await;
        let table = tables.get_mut(&kind).ok_or(StoreError::NotFound { kind, id })?;
        Self::check_unique(kind, table, Some(id), &changes)?;
        let row = table.rows.get_mut(&id).ok_or(StoreError::NotFound { kind, id })?;
        for (column, value) in changes {
            row.insert(column, value);
        }
        Ok(row.clone())
    }

    async fn delete(&self, kind: EntityKind, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let removed = tables
            .get_mut(&kind)
            .map(|t| t.rows.remove(&id).is_some())
            .unwrap_or(false);
        if !removed {
            return Ok(false);
        }

        // Cascade through referencing tables, depth first
        let mut pending = vec![(kind, id)];
        while let Some((parent, parent_id)) = pending.pop() {
            for (child, column) in parent.referenced_by() {
                if let Some(table) = tables.get_mut(&child) {
                    let doomed: Vec<i64> = table
                        .rows
                        .iter()
                        .filter(|(_, r)| r.get(column).and_then(Value::as_i64) == Some(parent_id))
                        .map(|(child_id, _)| *child_id)
                        .collect();
                    for child_id in doomed {
                        table.rows.remove(&child_id);
                        pending.push((child, child_id));
                    }
                }
            }
        }
        Ok(true)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
