use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use sqlx::{
    postgres::{PgArguments, PgPoolOptions},
    query::Query,
    PgPool, Postgres, Row as _,
};
use tracing::info;

use super::schema::{ColumnType, EntityKind, ID_COLUMN};
use super::store::{Condition, Row, Store, StoreError};
use crate::config::DatabaseConfig;

/// PostgreSQL backend. Rows travel as `row_to_json` objects so every table
/// shares one code path regardless of its columns.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

/// A bind parameter resolved against its column type
#[derive(Debug, Clone, PartialEq)]
enum Param {
    Int(Option<i64>),
    Text(Option<String>),
    Date(Option<NaiveDate>),
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config.url.as_deref().ok_or(StoreError::Config("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected to database: {}", redact_url(url));
        Ok(Self { pool })
    }

    fn param(kind: EntityKind, column: &str, value: &Value) -> Result<Param, StoreError> {
        let ty = if column == ID_COLUMN {
            ColumnType::Integer
        } else {
            kind.column(column)
                .ok_or_else(|| StoreError::UnknownColumn { kind, column: column.to_string() })?
                .ty
        };

        let invalid = || StoreError::InvalidValue {
            kind,
            column: column.to_string(),
            value: value.clone(),
        };

        if value.is_null() {
            return Ok(match ty {
                ColumnType::Integer => Param::Int(None),
                ColumnType::Text => Param::Text(None),
                ColumnType::Date => Param::Date(None),
            });
        }

        match ty {
            ColumnType::Integer => value.as_i64().map(|i| Param::Int(Some(i))).ok_or_else(invalid),
            ColumnType::Text => value
                .as_str()
                .map(|s| Param::Text(Some(s.to_string())))
                .ok_or_else(invalid),
            ColumnType::Date => value
                .as_str()
                .and_then(|s| s.parse::<NaiveDate>().ok())
                .map(|d| Param::Date(Some(d)))
                .ok_or_else(invalid),
        }
    }

    fn params<'a>(
        kind: EntityKind,
        pairs: impl IntoIterator<Item = (&'a String, &'a Value)>,
    ) -> Result<Vec<(String, Param)>, StoreError> {
        pairs
            .into_iter()
            .map(|(column, value)| Ok((column.clone(), Self::param(kind, column, value)?)))
            .collect()
    }

    async fn fetch_rows(
        &self,
        kind: EntityKind,
        sql: &str,
        params: Vec<Param>,
    ) -> Result<Vec<Row>, StoreError> {
        let mut q = sqlx::query(sql);
        for p in params {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(&self.pool).await.map_err(|e| classify(kind, e))?;
        rows.iter()
            .map(|r| {
                let v: Value = r.try_get("row")?;
                match v {
                    Value::Object(map) => Ok(map),
                    _ => Err(StoreError::Decode(kind)),
                }
            })
            .collect()
    }

    async fn fetch_row(
        &self,
        kind: EntityKind,
        sql: &str,
        params: Vec<Param>,
    ) -> Result<Option<Row>, StoreError> {
        Ok(self.fetch_rows(kind, sql, params).await?.into_iter().next())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_by_id(&self, kind: EntityKind, id: i64) -> Result<Option<Row>, StoreError> {
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM {} WHERE id = $1) t",
            quote_identifier(kind.table())
        );
        self.fetch_row(kind, &sql, vec![Param::Int(Some(id))]).await
    }

    async fn find_all(&self, kind: EntityKind, condition: &Condition) -> Result<Vec<Row>, StoreError> {
        let params = Self::params(kind, condition.clauses().iter().map(|(c, v)| (c, v)))?;
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM {}{} ORDER BY id) t",
            quote_identifier(kind.table()),
            where_clause(&params)
        );
        self.fetch_rows(kind, &sql, params.into_iter().map(|(_, p)| p).collect())
            .await
    }

    async fn insert(&self, kind: EntityKind, values: Row) -> Result<Row, StoreError> {
        let params = Self::params(kind, values.iter())?;
        let sql = insert_sql(kind.table(), &params);
        self.fetch_row(kind, &sql, params.into_iter().map(|(_, p)| p).collect())
            .await?
            .ok_or(StoreError::Decode(kind))
    }

    async fn update(&self, kind: EntityKind, id: i64, changes: Row) -> Result<Row, StoreError> {
        let params = Self::params(kind, changes.iter())?;
        let sql = update_sql(kind.table(), &params);
        let mut binds: Vec<Param> = params.into_iter().map(|(_, p)| p).collect();
        binds.push(Param::Int(Some(id)));
        self.fetch_row(kind, &sql, binds)
            .await?
            .ok_or(StoreError::NotFound { kind, id })
    }

    async fn delete(&self, kind: EntityKind, id: i64) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", quote_identifier(kind.table()));
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn bind_param<'q>(q: Query<'q, Postgres, PgArguments>, p: Param) -> Query<'q, Postgres, PgArguments> {
    match p {
        Param::Int(v) => q.bind(v),
        Param::Text(v) => q.bind(v),
        Param::Date(v) => q.bind(v),
    }
}

/// Unique violations become `Duplicate` so callers can answer 409
fn classify(kind: EntityKind, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Duplicate {
                kind,
                detail: db.constraint().unwrap_or("unique constraint").to_string(),
            };
        }
    }
    StoreError::Sqlx(err)
}

/// Quote SQL identifier to prevent injection; also keeps camelCase names intact
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn where_clause(params: &[(String, Param)]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let clauses: Vec<String> = params
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{} = ${}", quote_identifier(column), i + 1))
        .collect();
    format!(" WHERE {}", clauses.join(" AND "))
}

fn insert_sql(table: &str, params: &[(String, Param)]) -> String {
    let insert = if params.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", quote_identifier(table))
    } else {
        let columns: Vec<String> = params.iter().map(|(c, _)| quote_identifier(c)).collect();
        let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("${}", i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(table),
            columns.join(", "),
            placeholders.join(", ")
        )
    };
    format!("WITH t AS ({} RETURNING *) SELECT row_to_json(t) AS row FROM t", insert)
}

fn update_sql(table: &str, params: &[(String, Param)]) -> String {
    let assignments: Vec<String> = params
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{} = ${}", quote_identifier(column), i + 1))
        .collect();
    format!(
        "WITH t AS (UPDATE {} SET {} WHERE id = ${} RETURNING *) SELECT row_to_json(t) AS row FROM t",
        quote_identifier(table),
        assignments.join(", "),
        params.len() + 1
    )
}

/// Hide the password component of a connection string for logging
fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.into()
        }
        Err(_) => "<unparseable database url>".to_string(),
    }
}
