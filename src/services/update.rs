use serde_json::Value;

use crate::database::{row_id, EntityKind, Row, Store, StoreError};
use crate::types::Field;

/// Stage every supplied field whose value differs from `target`
fn staged_changes(target: &Row, fields: &[(&str, Field<Value>)]) -> Row {
    fields
        .iter()
        .filter_map(|(column, field)| match field {
            Field::Absent => None,
            Field::Null => Some((*column, Value::Null)),
            Field::Value(v) => Some((*column, v.clone())),
        })
        .filter(|(column, incoming)| target.get(*column).unwrap_or(&Value::Null) != incoming)
        .map(|(column, incoming)| (column.to_string(), incoming))
        .collect()
}

/// Apply the differing fields to `target` in one write.
///
/// Returns `true` when nothing differed, in which case the store is not
/// touched. Otherwise `target` is replaced by the row as stored.
pub async fn update_for_each(
    store: &dyn Store,
    kind: EntityKind,
    target: &mut Row,
    fields: &[(&str, Field<Value>)],
) -> Result<bool, StoreError> {
    let changes = staged_changes(target, fields);
    if changes.is_empty() {
        return Ok(true);
    }

    let id = row_id(kind, target)?;
    tracing::debug!("Updating {} {}: {:?}", kind, id, changes.keys().collect::<Vec<_>>());
    *target = store.update(kind, id, changes).await?;
    Ok(false)
}
