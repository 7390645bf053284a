use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{empty_string_as_none, opt, row_of, Resource};
use crate::database::{EntityKind, Row};
use crate::types::Field;

/// One recorded value of a Variable on a DateRecord
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub record: i64,
    #[serde(rename = "VariableId")]
    pub variable_id: i64,
    #[serde(rename = "DateRecordId")]
    pub date_record_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewRecord {
    pub record: Option<i64>,
    #[serde(rename = "VariableId")]
    pub variable_id: Option<i64>,
    #[serde(rename = "DateRecordId")]
    pub date_record_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordPatch {
    #[serde(default)]
    pub record: Field<i64>,
    #[serde(default, rename = "VariableId")]
    pub variable_id: Field<i64>,
    #[serde(default, rename = "DateRecordId")]
    pub date_record_id: Field<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordFilter {
    #[serde(default, rename = "VariableId", deserialize_with = "empty_string_as_none")]
    pub variable_id: Option<i64>,
    #[serde(default, rename = "DateRecordId", deserialize_with = "empty_string_as_none")]
    pub date_record_id: Option<i64>,
}

impl Resource for Record {
    const KIND: EntityKind = EntityKind::Record;

    type Create = NewRecord;
    type Patch = RecordPatch;
    type Filter = RecordFilter;

    fn create_params(body: &NewRecord) -> Row {
        row_of([
            ("record", opt(&body.record)),
            ("VariableId", opt(&body.variable_id)),
            ("DateRecordId", opt(&body.date_record_id)),
        ])
    }

    fn patch_fields(body: &RecordPatch) -> Vec<(&'static str, Field<Value>)> {
        vec![
            ("record", body.record.to_json()),
            ("VariableId", body.variable_id.to_json()),
            ("DateRecordId", body.date_record_id.to_json()),
        ]
    }

    fn filter_params(query: &RecordFilter) -> Vec<(&'static str, i64)> {
        [("VariableId", query.variable_id), ("DateRecordId", query.date_record_id)]
            .into_iter()
            .filter_map(|(column, id)| id.map(|id| (column, id)))
            .collect()
    }
}
