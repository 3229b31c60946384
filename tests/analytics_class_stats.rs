mod test_support;

use serde_json::json;
use test_support::{register_params, request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn class_stats_on_empty_workspace_reports_no_data() {
    let workspace = temp_dir("studentd-stats-empty");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let (code, error) = request_err(&mut stdin, &mut reader, "2", "analytics.class.stats", json!({}));
    assert_eq!(code, "empty_dataset");
    assert_eq!(
        error.get("message").and_then(|v| v.as_str()),
        Some("No student data available")
    );
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn class_stats_topper_weakest_and_distribution() {
    let workspace = temp_dir("studentd-stats");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.register",
        register_params("TOP", "Top Student", [90, 90, 90, 90, 90, 90]),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.register",
        register_params("LOW", "Low Student", [40, 40, 40, 40, 40, 40]),
    );

    let stats = request_ok(&mut stdin, &mut reader, "4", "analytics.class.stats", json!({}));
    assert_eq!(stats.get("totalStudents").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(stats.get("classAverage").and_then(|v| v.as_f64()), Some(65.0));
    assert_eq!(
        stats
            .get("topper")
            .and_then(|t| t.get("id"))
            .and_then(|v| v.as_str()),
        Some("TOP")
    );
    assert_eq!(
        stats
            .get("weakest")
            .and_then(|t| t.get("id"))
            .and_then(|v| v.as_str()),
        Some("LOW")
    );

    let subjects: Vec<String> = stats
        .get("subjectAverages")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
        .iter()
        .filter_map(|s| s.get("subject").and_then(|v| v.as_str()).map(|s| s.to_string()))
        .collect();
    assert_eq!(
        subjects,
        vec!["Machine Learning", "UHV", "DMGT", "DBMS", "OT", "ES"]
    );

    let distribution = stats
        .get("gradeDistribution")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    let labels: Vec<&str> = distribution
        .iter()
        .filter_map(|g| g.get("grade").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(labels, vec!["A+", "A", "B+", "B", "C", "D", "F"]);
    let total: u64 = distribution
        .iter()
        .filter_map(|g| g.get("count").and_then(|v| v.as_u64()))
        .sum();
    assert_eq!(total, 2);
    assert_eq!(distribution[0].get("count").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(distribution[5].get("count").and_then(|v| v.as_u64()), Some(1));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn configured_subject_list_drives_statistics() {
    let workspace = temp_dir("studentd-stats-subjects");
    let (_child, mut stdin, mut reader) =
        test_support::spawn_sidecar_with_env(&[("STUDENTD_SUBJECTS", "Physics, Chemistry")]);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    for (i, (id, p, c)) in [("P1", 40, 80), ("P2", 60, 100)].iter().enumerate() {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("r{}", i),
            "students.register",
            json!({
                "id": id, "name": id, "password": "pw", "email": "", "phone": "",
                "scores": { "Physics": p, "Chemistry": c }
            }),
        );
    }
    let stats = request_ok(&mut stdin, &mut reader, "3", "analytics.class.stats", json!({}));
    assert_eq!(
        stats
            .get("hardestSubject")
            .and_then(|s| s.get("subject"))
            .and_then(|v| v.as_str()),
        Some("Physics")
    );
    assert_eq!(
        stats
            .get("easiestSubject")
            .and_then(|s| s.get("average"))
            .and_then(|v| v.as_f64()),
        Some(90.0)
    );
    assert_eq!(stats.get("classAverage").and_then(|v| v.as_f64()), Some(70.0));

    let _ = std::fs::remove_dir_all(workspace);
}
