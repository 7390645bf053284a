use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{row_of, NoFilter, Resource};
use crate::database::{EntityKind, Row};
use crate::types::Field;

/// A calendar day that Records are logged against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRecord {
    pub id: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewDateRecord {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateRecordPatch {
    #[serde(default)]
    pub date: Field<NaiveDate>,
}

// Dates are stored and compared as ISO-8601 strings (YYYY-MM-DD)
fn date_value(date: NaiveDate) -> Value {
    Value::String(date.format("%Y-%m-%d").to_string())
}

impl Resource for DateRecord {
    const KIND: EntityKind = EntityKind::DateRecord;

    type Create = NewDateRecord;
    type Patch = DateRecordPatch;
    type Filter = NoFilter;

    fn create_params(body: &NewDateRecord) -> Row {
        row_of([("date", body.date.map(date_value).unwrap_or(Value::Null))])
    }

    fn patch_fields(body: &DateRecordPatch) -> Vec<(&'static str, Field<Value>)> {
        vec![("date", body.date.clone().map(date_value))]
    }
}
