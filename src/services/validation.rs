use std::collections::BTreeMap;

use serde_json::Value;

use crate::database::Row;
use crate::error::ApiError;

/// Which required fields a request left missing or empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Machine-readable reason
    pub reason: &'static str,
    pub fields: Vec<String>,
}

impl ValidationFailure {
    pub const MISSING_REQUIRED: &'static str = "missing_required_fields";
}

impl From<ValidationFailure> for ApiError {
    fn from(failure: ValidationFailure) -> Self {
        let field_errors: BTreeMap<String, String> = failure
            .fields
            .iter()
            .map(|f| (f.clone(), "This field is required".to_string()))
            .collect();
        ApiError::validation_error(
            format!("{}: {}", failure.reason, failure.fields.join(", ")),
            Some(field_errors),
        )
    }
}

/// Absent, null and blank strings all count as not supplied; zero does not
fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Check `params` for every name in `required`, in declaration order
pub fn get_validation_error<'a>(
    params: &Row,
    required: impl IntoIterator<Item = &'a str>,
) -> Option<ValidationFailure> {
    let fields: Vec<String> = required
        .into_iter()
        .filter(|name| is_empty(params.get(*name)))
        .map(str::to_string)
        .collect();

    if fields.is_empty() {
        None
    } else {
        Some(ValidationFailure {
            reason: ValidationFailure::MISSING_REQUIRED,
            fields,
        })
    }
}
