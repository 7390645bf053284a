use serde::{Deserialize, Serialize};

/// Account row; the password hash never leaves the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub nick: String,
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinRequest {
    pub email: Option<String>,
    pub nick: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}
