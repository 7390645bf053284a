mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::Session;

/// A Variable and a DateRecord to hang records off
async fn parents(session: &Session) -> Result<(i64, i64)> {
    let variable = session.create("/variables", json!({ "name": "steps" })).await?;
    let date = session.create("/dateRecords", json!({ "date": "2024-03-01" })).await?;
    Ok((
        variable["id"].as_i64().unwrap_or_default(),
        date["id"].as_i64().unwrap_or_default(),
    ))
}

#[tokio::test]
async fn record_lifecycle() -> Result<()> {
    let session = common::login().await?;
    let (variable_id, date_id) = parents(&session).await?;

    let created = session
        .create(
            "/records",
            json!({ "record": 5, "VariableId": variable_id, "DateRecordId": date_id }),
        )
        .await?;
    assert_eq!(created["record"], 5);
    assert_eq!(created["VariableId"], variable_id);
    assert_eq!(created["DateRecordId"], date_id);
    let path = format!("/records/{}", created["id"]);

    // Same value: nothing to write
    let res = session.patch(&path, &json!({ "record": 5 })).await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = session.patch(&path, &json!({ "record": 9 })).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["record"], 9);
    assert_eq!(body["data"]["VariableId"], variable_id);

    let res = session.get(&path).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["ok"], true);
    assert_eq!(body["data"]["record"], 9);

    let res = session.delete(&path).await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(session.get(&path).await?.status(), StatusCode::NOT_FOUND);
    assert_eq!(session.delete(&path).await?.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn create_validates_required_fields() -> Result<()> {
    let session = common::login().await?;
    let (variable_id, _) = parents(&session).await?;

    let res = session
        .post("/records", &json!({ "record": 5, "VariableId": variable_id }))
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["ok"], false);
    assert!(body["message"].as_str().unwrap_or_default().contains("DateRecordId"));
    assert!(body["field_errors"].get("DateRecordId").is_some());
    assert!(body["field_errors"].get("record").is_none());

    Ok(())
}

#[tokio::test]
async fn zero_is_a_valid_record() -> Result<()> {
    let session = common::login().await?;
    let (variable_id, date_id) = parents(&session).await?;

    let created = session
        .create(
            "/records",
            json!({ "record": 0, "VariableId": variable_id, "DateRecordId": date_id }),
        )
        .await?;
    assert_eq!(created["record"], 0);

    Ok(())
}

#[tokio::test]
async fn create_with_unknown_parent_is_not_found() -> Result<()> {
    let session = common::login().await?;
    let (variable_id, _) = parents(&session).await?;

    let res = session
        .post(
            "/records",
            &json!({ "record": 1, "VariableId": variable_id, "DateRecordId": 999_999 }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await?;
    assert!(body["message"].as_str().unwrap_or_default().contains("DateRecordId"));

    Ok(())
}

#[tokio::test]
async fn patch_rejects_nulls_and_empty_bodies() -> Result<()> {
    let session = common::login().await?;
    let (variable_id, date_id) = parents(&session).await?;
    let created = session
        .create(
            "/records",
            json!({ "record": 3, "VariableId": variable_id, "DateRecordId": date_id }),
        )
        .await?;
    let path = format!("/records/{}", created["id"]);

    let res = session.patch(&path, &json!({ "VariableId": null })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["message"].as_str().unwrap_or_default().contains("Not Null"));

    let res = session.patch(&path, &json!({})).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("At least one content is required"));

    let res = session.patch(&path, &json!({ "DateRecordId": 999_999 })).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = session.patch("/records/999999", &json!({ "record": 1 })).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Nothing above changed the record
    let body: Value = session.get(&path).await?.json().await?;
    assert_eq!(body["data"]["record"], 3);
    assert_eq!(body["data"]["VariableId"], variable_id);

    Ok(())
}

#[tokio::test]
async fn malformed_input_is_bad_request() -> Result<()> {
    let session = common::login().await?;

    let res = session
        .client
        .post(session.server.url("/records"))
        .header(reqwest::header::COOKIE, &session.cookie)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "INVALID_JSON");

    let res = session.post("/records", &json!({ "record": "five" })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert_eq!(session.get("/records/abc").await?.status(), StatusCode::BAD_REQUEST);
    assert_eq!(session.get("/records?VariableId=abc").await?.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn list_filters_by_parent() -> Result<()> {
    let session = common::login().await?;
    let (variable_id, date_id) = parents(&session).await?;
    let (other_variable, _) = parents(&session).await?;

    for record in [1, 2] {
        session
            .create(
                "/records",
                json!({ "record": record, "VariableId": variable_id, "DateRecordId": date_id }),
            )
            .await?;
    }

    let res = session.get(&format!("/records?VariableId={}", variable_id)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let records = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r["VariableId"] == variable_id));
    assert!(records[0]["id"].as_i64() < records[1]["id"].as_i64());

    // Both filters together, empty values ignored
    let res = session
        .get(&format!("/records?VariableId={}&DateRecordId={}", variable_id, date_id))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = session
        .get(&format!("/records?VariableId={}&DateRecordId=", variable_id))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = session.get(&format!("/records?VariableId={}", other_variable)).await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = session.get("/records?VariableId=999999").await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn patch_moves_record_to_another_parent() -> Result<()> {
    let session = common::login().await?;
    let (variable_id, date_id) = parents(&session).await?;
    let (other_variable, _) = parents(&session).await?;

    let created = session
        .create(
            "/records",
            json!({ "record": 5, "VariableId": variable_id, "DateRecordId": date_id }),
        )
        .await?;
    let path = format!("/records/{}", created["id"]);

    let res = session.patch(&path, &json!({ "VariableId": other_variable })).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["VariableId"], other_variable);
    assert_eq!(body["data"]["record"], 5);
    assert_eq!(body["data"]["DateRecordId"], date_id);

    let res = session.get(&format!("/records?VariableId={}", variable_id)).await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    Ok(())
}

#[tokio::test]
async fn rejected_create_writes_nothing() -> Result<()> {
    let session = common::login().await?;
    let (variable_id, _) = parents(&session).await?;

    let res = session
        .post(
            "/records",
            &json!({ "record": 1, "VariableId": variable_id, "DateRecordId": 999_999 }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = session.get(&format!("/records?VariableId={}", variable_id)).await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(session.get("/records").await?.status(), StatusCode::NO_CONTENT);

    Ok(())
}

#[tokio::test]
async fn patch_checks_existence_before_body() -> Result<()> {
    let session = common::login().await?;

    let res = session
        .client
        .patch(session.server.url("/records/999999"))
        .header(reqwest::header::COOKIE, &session.cookie)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}
