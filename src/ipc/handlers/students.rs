use crate::calc::CoreError;
use crate::ipc::error::{core_err, err, ok, store_err};
use crate::ipc::helpers::{required_str, store, store_mut};
use crate::ipc::types::{AppState, Request};
use crate::record::{registration_from_params, StudentRecord, SubjectScores};
use serde_json::json;

fn scores_json(record: &StudentRecord) -> serde_json::Value {
    let mut out = serde_json::Map::new();
    for (subject, score) in record.scores.iter() {
        out.insert(subject.to_string(), json!(score));
    }
    serde_json::Value::Object(out)
}

fn handle_students_register(state: &mut AppState, req: &Request) -> serde_json::Value {
    let record = match registration_from_params(
        &req.params,
        &state.config.subjects,
        state.hasher.as_ref(),
    ) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(request_id = %req.id, error = %e, "registration rejected");
            return core_err(&req.id, &e);
        }
    };
    let store = match store_mut(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(e) = store.insert(&record) {
        tracing::warn!(student_id = %record.id, error = %e, "registration not stored");
        return store_err(&req.id, &e);
    }
    tracing::info!(student_id = %record.id, percentage = record.percentage(), "student registered");
    ok(&req.id, json!({ "student": record.summary() }))
}

fn handle_students_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match store.find_by_id(&student_id) {
        Ok(Some(record)) => ok(
            &req.id,
            json!({ "student": record.summary(), "scores": scores_json(&record) }),
        ),
        Ok(None) => core_err(&req.id, &CoreError::NotFound(format!("student {}", student_id))),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match store.scan_all() {
        Ok(records) => {
            let students: Vec<_> = records.iter().map(StudentRecord::summary).collect();
            ok(&req.id, json!({ "students": students }))
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_assessments_record(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let scores = match SubjectScores::parse(&state.config.subjects, req.params.get("scores")) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(student_id = %student_id, error = %e, "assessment rejected");
            return core_err(&req.id, &e);
        }
    };
    let store = match store_mut(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match store.append_snapshot(&student_id, &scores) {
        Ok(snapshot) => {
            let percentage = snapshot.percentage();
            ok(
                &req.id,
                json!({
                    "studentId": student_id,
                    "seq": snapshot.seq,
                    "recordedAt": snapshot.recorded_at,
                    "percentage": percentage,
                    "grade": crate::calc::classify(percentage),
                }),
            )
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_auth_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(password) = req.params.get("password").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing password", None);
    };
    let store = match store(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let record = match store.find_by_id(&student_id) {
        Ok(v) => v,
        Err(e) => return store_err(&req.id, &e),
    };
    match record {
        Some(r) if state.hasher.verify(password, &r.password_hash) => {
            tracing::info!(student_id = %r.id, "login succeeded");
            ok(&req.id, json!({ "student": r.summary() }))
        }
        _ => {
            tracing::warn!(student_id = %student_id, "login failed");
            err(&req.id, "invalid_credentials", "Invalid credentials", None)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.register" => Some(handle_students_register(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.list" => Some(handle_students_list(state, req)),
        "assessments.record" => Some(handle_assessments_record(state, req)),
        "auth.login" => Some(handle_auth_login(state, req)),
        _ => None,
    }
}
