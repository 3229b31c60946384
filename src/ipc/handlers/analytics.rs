use crate::calc::{self, CoreError};
use crate::ipc::error::{core_err, ok, store_err};
use crate::ipc::helpers::{required_str, store};
use crate::ipc::types::{AppState, Request};
use crate::trend;
use serde_json::json;

fn handle_analytics_class_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let records = match store.scan_all() {
        Ok(v) => v,
        Err(e) => return store_err(&req.id, &e),
    };
    match calc::compute_class_statistics(&records, &state.config.subjects) {
        Ok(stats) => ok(&req.id, json!(stats)),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_analytics_student_predict(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let record = match store.find_by_id(&student_id) {
        Ok(Some(v)) => v,
        Ok(None) => {
            return core_err(&req.id, &CoreError::NotFound(format!("student {}", student_id)))
        }
        Err(e) => return store_err(&req.id, &e),
    };
    let history = match store.percentage_history(&student_id) {
        Ok(v) => v,
        Err(e) => return store_err(&req.id, &e),
    };

    match trend::predict_next(&history) {
        Ok(prediction) => ok(
            &req.id,
            json!({
                "student": { "id": record.id, "name": record.name },
                "history": history,
                "prediction": prediction,
            }),
        ),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.class.stats" => Some(handle_analytics_class_stats(state, req)),
        "analytics.student.predict" => Some(handle_analytics_student_predict(state, req)),
        _ => None,
    }
}
