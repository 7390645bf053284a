//! Uniform JSON envelope around every response body.

use serde_json::{json, Value};

/// `{"ok": true, "data": payload}`
pub fn success(data: Value) -> Value {
    json!({
        "ok": true,
        "data": data
    })
}

/// `{"ok": false, "message": message}`
pub fn failure(message: impl Into<String>) -> Value {
    json!({
        "ok": false,
        "message": message.into()
    })
}
