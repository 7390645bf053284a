use crate::database::{EntityKind, Row, Store, StoreError};
use crate::error::ApiError;

/// Point lookup: the row if `id` exists in `kind`'s table
pub async fn find_existing(store: &dyn Store, kind: EntityKind, id: i64) -> Result<Option<Row>, StoreError> {
    store.find_by_id(kind, id).await
}

/// Like [`find_existing`] but a miss is a 404 carrying `label`, which
/// names the path or field that failed.
pub async fn require_existing(
    store: &dyn Store,
    kind: EntityKind,
    id: i64,
    label: &str,
) -> Result<Row, ApiError> {
    find_existing(store, kind, id)
        .await?
        .ok_or_else(|| ApiError::not_found(label.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn miss_is_not_found_with_label() {
        let store = MemoryStore::new();
        let err = require_existing(&store, EntityKind::Variable, 7, "POST /records VariableId 7 not found")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "POST /records VariableId 7 not found");
    }

    #[tokio::test]
    async fn hit_returns_row() {
        let store = MemoryStore::new();
        let mut values = Row::new();
        values.insert("name".into(), json!("mood"));
        store.insert(EntityKind::Variable, values).await.unwrap();

        let row = require_existing(&store, EntityKind::Variable, 1, "unused").await.unwrap();
        assert_eq!(row["name"], json!("mood"));
        assert!(find_existing(&store, EntityKind::Element, 1).await.unwrap().is_none());
    }
}
