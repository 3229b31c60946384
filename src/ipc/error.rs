use serde_json::json;

use crate::calc::CoreError;
use crate::store::StoreError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn core_err(id: &str, e: &CoreError) -> serde_json::Value {
    err(id, e.code(), e.to_string(), e.details())
}

pub fn store_err(id: &str, e: &StoreError) -> serde_json::Value {
    if let StoreError::Backend(inner) = e {
        tracing::error!(request_id = id, error = %format!("{inner:#}"), "record store failure");
    }
    err(id, e.code(), format!("{e:#}"), None)
}
