mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn health_and_root_are_public() -> Result<()> {
    let server = common::TestServer::start().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["ok"], true);
    assert_eq!(body["data"]["status"], "ok");

    let res = client.get(server.url("/")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["name"], "Tally API");

    Ok(())
}

#[tokio::test]
async fn join_then_login_sets_http_only_cookie() -> Result<()> {
    let server = common::TestServer::start().await?;
    let client = reqwest::Client::new();
    let user = common::unique_user("join");

    let res = client.post(server.url("/auth/join")).json(&user).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["email"], user["email"]);
    assert!(body["data"].get("password").is_none(), "password leaked: {}", body);

    let res = client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": user["email"], "password": user["password"] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let set_cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(set_cookie.starts_with("tally.sid="), "unexpected cookie: {}", set_cookie);
    assert!(set_cookie.contains("HttpOnly"));

    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    let server = common::TestServer::start().await?;
    let client = reqwest::Client::new();
    let user = common::unique_user("dup");

    let res = client.post(server.url("/auth/join")).json(&user).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client.post(server.url("/auth/join")).json(&user).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await?;
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], "CONFLICT");

    Ok(())
}

#[tokio::test]
async fn join_requires_every_field() -> Result<()> {
    let server = common::TestServer::start().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/auth/join"))
        .json(&json!({ "email": "half@example.com", "nick": "" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["field_errors"].get("nick").is_some(), "{}", body);
    assert!(body["field_errors"].get("password").is_some(), "{}", body);

    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    let server = common::TestServer::start().await?;
    let client = reqwest::Client::new();
    let user = common::unique_user("wrong");

    client.post(server.url("/auth/join")).json(&user).send().await?;

    let res = client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": user["email"], "password": "not it" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().get(header::SET_COOKIE).is_none());

    Ok(())
}

#[tokio::test]
async fn resources_require_a_session() -> Result<()> {
    let server = common::TestServer::start().await?;
    let client = reqwest::Client::new();

    for path in ["/records", "/variables", "/dateRecords", "/elements", "/elementInts", "/auth/me"] {
        let res = client.get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "GET {}", path);
    }

    let res = client
        .get(server.url("/records"))
        .header(header::COOKIE, "tally.sid=not-a-token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["ok"], false);

    Ok(())
}

#[tokio::test]
async fn me_and_logout() -> Result<()> {
    let session = common::login().await?;

    let res = session.get("/auth/me").await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert!(body["data"]["email"].as_str().unwrap_or_default().starts_with("user-"));

    let res = session.post("/auth/logout", &json!({})).await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let cleared = common::cookie_pair(&res).unwrap_or_default();
    assert_eq!(cleared, "tally.sid=");

    Ok(())
}

#[tokio::test]
async fn bearer_token_is_accepted() -> Result<()> {
    let session = common::login().await?;
    let token = session.cookie.trim_start_matches("tally.sid=").to_string();

    let res = session
        .client
        .get(session.server.url("/auth/me"))
        .bearer_auth(token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn server_stops_when_dropped() -> Result<()> {
    let server = common::TestServer::start().await?;
    let health = server.url("/health");
    drop(server);

    let client = reqwest::Client::new();
    assert!(client.get(&health).send().await.is_err());

    Ok(())
}
