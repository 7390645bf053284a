use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{opt, row_of, NoFilter, Resource};
use crate::database::{EntityKind, Row};
use crate::types::Field;

/// Named parent of a series of ElementInt values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewElement {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ElementPatch {
    #[serde(default)]
    pub name: Field<String>,
}

impl Resource for Element {
    const KIND: EntityKind = EntityKind::Element;

    type Create = NewElement;
    type Patch = ElementPatch;
    type Filter = NoFilter;

    fn create_params(body: &NewElement) -> Row {
        row_of([("name", opt(&body.name))])
    }

    fn patch_fields(body: &ElementPatch) -> Vec<(&'static str, Field<Value>)> {
        vec![("name", body.name.to_json())]
    }
}
