use crate::calc::CoreError;
use crate::ipc::error::{core_err, err, ok, store_err};
use crate::ipc::helpers::{required_str, store};
use crate::ipc::types::{AppState, Request};
use crate::record::StudentRecord;
use crate::report::{self, EmailDraftSink, JsonFileSink, ReportSink};
use serde_json::json;

const EMAIL_FROM: &str = "reports@studentd.local";

fn load_record(state: &AppState, req: &Request) -> Result<StudentRecord, serde_json::Value> {
    let store = store(state, req)?;
    let student_id = required_str(req, "studentId")?;
    match store.find_by_id(&student_id) {
        Ok(Some(v)) => Ok(v),
        Ok(None) => Err(core_err(
            &req.id,
            &CoreError::NotFound(format!("student {}", student_id)),
        )),
        Err(e) => Err(store_err(&req.id, &e)),
    }
}

fn handle_reports_student_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    let record = match load_record(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "report": report::assemble(&record, &state.config.subjects) }),
    )
}

fn handle_reports_render(state: &mut AppState, req: &Request) -> serde_json::Value {
    let record = match load_record(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(workspace) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let sink_name = req
        .params
        .get("sink")
        .and_then(|v| v.as_str())
        .unwrap_or("json");
    let sink: Box<dyn ReportSink> = match sink_name {
        "json" => Box::new(JsonFileSink {
            dir: workspace.join("reports"),
        }),
        "email" => Box::new(EmailDraftSink {
            dir: workspace.join("outbox"),
            from: EMAIL_FROM.to_string(),
        }),
        other => {
            return err(
                &req.id,
                "bad_params",
                format!("unknown sink: {}", other),
                Some(json!({ "allowed": ["json", "email"] })),
            )
        }
    };

    let payload = report::assemble(&record, &state.config.subjects);
    let receipt = report::deliver(sink.as_ref(), &payload);
    if receipt.ok {
        ok(&req.id, json!({ "receipt": receipt }))
    } else {
        err(
            &req.id,
            "render_failed",
            receipt.message.clone().unwrap_or_default(),
            Some(json!({ "receipt": receipt })),
        )
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.studentModel" => Some(handle_reports_student_model(state, req)),
        "reports.render" => Some(handle_reports_render(state, req)),
        _ => None,
    }
}
