mod test_support;

use serde_json::json;
use std::io::{BufRead, Write};
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("studentd-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health.get("version").and_then(|v| v.as_str()).is_some());
    assert!(health.get("workspacePath").map(|v| v.is_null()).unwrap_or(false));
    assert_eq!(
        health
            .get("subjects")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(6)
    );

    let (code, _) = request_err(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(code, "no_workspace");

    let graded = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "grades.classify",
        json!({ "percentage": 39.99 }),
    );
    assert_eq!(graded.get("grade").and_then(|v| v.as_str()), Some("F"));

    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "grades.classify",
        json!({ "percentage": "ninety" }),
    );
    assert_eq!(code, "bad_params");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "6", "students.list", json!({}));
    assert_eq!(
        listed.get("students").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(0)
    );

    let (code, _) = request_err(&mut stdin, &mut reader, "7", "students.delete", json!({}));
    assert_eq!(code, "not_implemented");

    // A malformed line gets a bad_json reply and the loop keeps going.
    writeln!(stdin, "{{not json").expect("write bad line");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read bad_json reply");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse reply");
    assert_eq!(
        value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("bad_json")
    );
    let _ = request_ok(&mut stdin, &mut reader, "8", "health", json!({}));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn in_memory_workspace_serves_requests_without_files() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "inMemory": true }),
    );
    assert_eq!(selected.get("inMemory").and_then(|v| v.as_bool()), Some(true));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.register",
        test_support::register_params("M1", "Mem Student", [60, 60, 60, 60, 60, 60]),
    );
    let listed = request_ok(&mut stdin, &mut reader, "3", "students.list", json!({}));
    assert_eq!(
        listed.get("students").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(1)
    );

    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "reports.render",
        json!({ "studentId": "M1", "sink": "json" }),
    );
    assert_eq!(code, "no_workspace");
}
