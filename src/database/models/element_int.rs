use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{empty_string_as_none, opt, row_of, Resource};
use crate::database::{EntityKind, Row};
use crate::types::Field;

/// Integer value attached to an Element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInt {
    pub id: i64,
    pub record: i64,
    #[serde(rename = "ElementId")]
    pub element_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewElementInt {
    pub record: Option<i64>,
    #[serde(rename = "ElementId")]
    pub element_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ElementIntPatch {
    #[serde(default)]
    pub record: Field<i64>,
    #[serde(default, rename = "ElementId")]
    pub element_id: Field<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ElementIntFilter {
    #[serde(default, rename = "ElementId", deserialize_with = "empty_string_as_none")]
    pub element_id: Option<i64>,
}

impl Resource for ElementInt {
    const KIND: EntityKind = EntityKind::ElementInt;

    type Create = NewElementInt;
    type Patch = ElementIntPatch;
    type Filter = ElementIntFilter;

    fn create_params(body: &NewElementInt) -> Row {
        row_of([("record", opt(&body.record)), ("ElementId", opt(&body.element_id))])
    }

    fn patch_fields(body: &ElementIntPatch) -> Vec<(&'static str, Field<Value>)> {
        vec![("record", body.record.to_json()), ("ElementId", body.element_id.to_json())]
    }

    fn filter_params(query: &ElementIntFilter) -> Vec<(&'static str, i64)> {
        query.element_id.map(|id| ("ElementId", id)).into_iter().collect()
    }
}
