use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::store::RecordStore;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn store<'a>(state: &'a AppState, req: &Request) -> Result<&'a dyn RecordStore, serde_json::Value> {
    state
        .store
        .as_deref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn store_mut<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<&'a mut (dyn RecordStore + 'static), serde_json::Value> {
    match state.store.as_deref_mut() {
        Some(s) => Ok(s),
        None => Err(err(&req.id, "no_workspace", "select a workspace first", None)),
    }
}
