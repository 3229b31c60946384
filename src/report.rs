use crate::calc::Grade;
use crate::config::Subjects;
use crate::record::StudentRecord;
use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRow {
    pub subject: String,
    pub score: u8,
}

/// Immutable payload handed to rendering sinks.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub percentage: f64,
    pub grade: Grade,
    pub subjects: Vec<SubjectRow>,
}

pub fn assemble(record: &StudentRecord, subjects: &Subjects) -> StudentReport {
    StudentReport {
        id: record.id.clone(),
        name: record.name.clone(),
        email: record.email.clone(),
        phone: record.phone.clone(),
        percentage: record.percentage(),
        grade: record.grade(),
        subjects: subjects
            .iter()
            .map(|s| SubjectRow {
                subject: s.to_string(),
                score: record.scores.get(s).unwrap_or(0),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SinkReceipt {
    pub sink: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub trait ReportSink {
    fn name(&self) -> &'static str;
    fn render(&self, report: &StudentReport) -> anyhow::Result<PathBuf>;
}

/// Runs a sink and folds its outcome into a receipt. Failures are reported,
/// not retried.
pub fn deliver(sink: &dyn ReportSink, report: &StudentReport) -> SinkReceipt {
    match sink.render(report) {
        Ok(path) => {
            tracing::info!(sink = sink.name(), student_id = %report.id, path = %path.display(), "report rendered");
            SinkReceipt {
                sink: sink.name().to_string(),
                ok: true,
                location: Some(path.to_string_lossy().to_string()),
                message: None,
            }
        }
        Err(e) => {
            tracing::warn!(sink = sink.name(), student_id = %report.id, error = %format!("{e:#}"), "report sink failed");
            SinkReceipt {
                sink: sink.name().to_string(),
                ok: false,
                location: None,
                message: Some(format!("{e:#}")),
            }
        }
    }
}

/// Percent-encodes every byte outside `[A-Za-z0-9_-]` so distinct ids
/// always map to distinct file names.
fn safe_file_stem(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for b in id.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

fn write_file(dir: &Path, file_name: &str, contents: &str) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.to_string_lossy()))?;
    let path = dir.join(file_name);
    std::fs::write(&path, contents)
        .with_context(|| format!("failed to write {}", path.to_string_lossy()))?;
    Ok(path)
}

/// Writes the report as pretty JSON to `<dir>/Report_<id>.json`.
pub struct JsonFileSink {
    pub dir: PathBuf,
}

impl ReportSink for JsonFileSink {
    fn name(&self) -> &'static str {
        "json"
    }

    fn render(&self, report: &StudentReport) -> anyhow::Result<PathBuf> {
        let body = serde_json::to_string_pretty(report).context("failed to serialize report")?;
        write_file(
            &self.dir,
            &format!("Report_{}.json", safe_file_stem(&report.id)),
            &body,
        )
    }
}

/// Composes the parent notification message into an outbox file. Delivery
/// is left to whatever picks up the outbox.
pub struct EmailDraftSink {
    pub dir: PathBuf,
    pub from: String,
}

impl EmailDraftSink {
    pub fn compose(&self, report: &StudentReport) -> String {
        let mut out = String::new();
        out.push_str(&format!("From: {}\n", self.from));
        out.push_str(&format!("To: {}\n", report.email));
        out.push_str(&format!("Subject: Academic Report for {}\n\n", report.name));
        out.push_str("Dear Parent/Guardian,\n\n");
        out.push_str(&format!(
            "Please find below the performance report for {}.\n\n",
            report.name
        ));
        out.push_str(&format!("Overall Percentage: {}%\n", report.percentage));
        out.push_str(&format!("Grade: {}\n\n", report.grade));
        for row in &report.subjects {
            out.push_str(&format!("  {}: {}%\n", row.subject, row.score));
        }
        out.push_str("\nRegards,\nSchool Analytics Team\n");
        out
    }
}

impl ReportSink for EmailDraftSink {
    fn name(&self) -> &'static str {
        "email"
    }

    fn render(&self, report: &StudentReport) -> anyhow::Result<PathBuf> {
        if report.email.trim().is_empty() {
            anyhow::bail!("student {} has no email address", report.id);
        }
        write_file(
            &self.dir,
            &format!("Report_{}.eml.txt", safe_file_stem(&report.id)),
            &self.compose(report),
        )
    }
}
