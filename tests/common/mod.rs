#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{header, Client, Response, StatusCode};
use serde_json::{json, Value};

static USER_SEQ: AtomicU32 = AtomicU32::new(0);

/// A `tally-api` process on its own port, killed when dropped
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let server = Self::spawn()?;
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Memory store keeps the suite independent of any database
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tally-api"));
        cmd.args(["--host", "127.0.0.1", "--port", &port.to_string(), "--store", "memory"])
            .env("APP_ENV", "development")
            .env("SECURITY_ENABLE_CORS", "false")
            .env("PASSWORD_HASH_COST", "4")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Fresh credentials per call
pub fn unique_user(prefix: &str) -> Value {
    let n = USER_SEQ.fetch_add(1, Ordering::SeqCst);
    let email = format!("{}-{}-{}@example.com", prefix, std::process::id(), n);
    json!({ "email": email, "nick": format!("{}{}", prefix, n), "password": "correct horse" })
}

/// Client that carries one logged-in session cookie on every request
pub struct Session {
    pub client: Client,
    pub cookie: String,
    pub server: TestServer,
}

impl Session {
    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self
            .client
            .get(self.server.url(path))
            .header(header::COOKIE, &self.cookie)
            .send()
            .await?)
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Response> {
        Ok(self
            .client
            .post(self.server.url(path))
            .header(header::COOKIE, &self.cookie)
            .json(body)
            .send()
            .await?)
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<Response> {
        Ok(self
            .client
            .patch(self.server.url(path))
            .header(header::COOKIE, &self.cookie)
            .json(body)
            .send()
            .await?)
    }

    pub async fn delete(&self, path: &str) -> Result<Response> {
        Ok(self
            .client
            .delete(self.server.url(path))
            .header(header::COOKIE, &self.cookie)
            .send()
            .await?)
    }

    /// POST and return the created entity's `data`
    pub async fn create(&self, path: &str, body: Value) -> Result<Value> {
        let res = self.post(path, &body).await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "POST {} -> {}", path, res.status());
        let body: Value = res.json().await?;
        Ok(body["data"].clone())
    }
}

/// `name=value` part of a `Set-Cookie` header
pub fn cookie_pair(res: &Response) -> Option<String> {
    res.headers()
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(|s| s.trim().to_string())
}

/// Start a server, join with fresh credentials and log in
pub async fn login() -> Result<Session> {
    let server = TestServer::start().await?;
    let client = Client::new();
    let user = unique_user("user");

    let res = client.post(server.url("/auth/join")).json(&user).send().await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "join failed: {}", res.status());

    let res = client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": user["email"], "password": user["password"] }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
    let cookie = cookie_pair(&res).context("login did not set a session cookie")?;

    Ok(Session { client, cookie, server })
}
