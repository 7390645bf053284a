use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{opt, row_of, NoFilter, Resource};
use crate::database::{EntityKind, Row};
use crate::types::Field;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewVariable {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VariablePatch {
    #[serde(default)]
    pub name: Field<String>,
}

impl Resource for Variable {
    const KIND: EntityKind = EntityKind::Variable;

    type Create = NewVariable;
    type Patch = VariablePatch;
    type Filter = NoFilter;

    fn create_params(body: &NewVariable) -> Row {
        row_of([("name", opt(&body.name))])
    }

    fn patch_fields(body: &VariablePatch) -> Vec<(&'static str, Field<Value>)> {
        vec![("name", body.name.to_json())]
    }
}
