//! Typed views over stored rows plus the request bodies each resource accepts.

pub mod date_record;
pub mod element;
pub mod element_int;
pub mod record;
pub mod user;
pub mod variable;

pub use date_record::DateRecord;
pub use element::Element;
pub use element_int::ElementInt;
pub use record::Record;
pub use user::User;
pub use variable::Variable;

use std::fmt;
use std::str::FromStr;

use serde::{de, de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::database::{EntityKind, Row};
use crate::types::Field;

/// A CRUD-exposed entity: its table descriptor and the typed bodies the
/// generic handlers accept for it.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    /// POST body; every column optional so missing fields reach validation
    type Create: DeserializeOwned + Send;
    /// PATCH body built from [`Field`]s
    type Patch: DeserializeOwned + Send;
    /// List query parameters
    type Filter: DeserializeOwned + Send;

    /// Submitted create values by column name, null where not supplied
    fn create_params(body: &Self::Create) -> Row;

    fn patch_fields(body: &Self::Patch) -> Vec<(&'static str, Field<Value>)>;

    /// Foreign-key equality filters present in the query
    fn filter_params(_query: &Self::Filter) -> Vec<(&'static str, i64)> {
        Vec::new()
    }
}

/// Query type for resources without list filters
#[derive(Debug, Default, Deserialize)]
pub struct NoFilter {}

pub(crate) fn row_of<const N: usize>(pairs: [(&str, Value); N]) -> Row {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

pub(crate) fn opt<T: Clone + Into<Value>>(value: &Option<T>) -> Value {
    value.clone().map(Into::into).unwrap_or(Value::Null)
}

/// `?VariableId=` means no filter rather than a parse failure
pub(crate) fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(de::Error::custom),
    }
}

/// Decode a stored row into its typed entity
pub fn from_row<R: DeserializeOwned>(kind: EntityKind, row: Row) -> Result<R, crate::database::StoreError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| {
        tracing::error!("Failed to decode {} row: {}", kind, e);
        crate::database::StoreError::Decode(kind)
    })
}
