use crate::auth::PasswordHasher;
use crate::calc::{self, CoreError, Grade};
use crate::config::Subjects;
use serde::Serialize;

/// Integer value of a JSON number, accepting floats like `80.0` with no
/// fractional part.
fn whole_number(v: &serde_json::Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    let f = v.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Subject scores kept in canonical subject order. Always holds exactly the
/// configured subject set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectScores(Vec<(String, u8)>);

impl SubjectScores {
    /// Pairs subjects with scores position by position; missing trailing
    /// scores read as 0.
    #[cfg(test)]
    pub fn from_ordered<I>(subjects: &Subjects, scores: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let mut it = scores.into_iter();
        Self(
            subjects
                .iter()
                .map(|s| (s.to_string(), it.next().unwrap_or(0)))
                .collect(),
        )
    }

    /// Builds from stored (subject, score) rows. Subjects outside the
    /// configured set are dropped and configured subjects with no row read as
    /// 0, so older workspaces still load with the full subject set.
    pub fn from_rows(subjects: &Subjects, rows: &[(String, i64)]) -> Self {
        Self(
            subjects
                .iter()
                .map(|s| {
                    let v = rows
                        .iter()
                        .find(|(name, _)| name == s)
                        .map(|(_, v)| (*v).clamp(0, 100) as u8)
                        .unwrap_or(0);
                    (s.to_string(), v)
                })
                .collect(),
        )
    }

    /// Parses a `{subject: score}` JSON object, collecting every problem
    /// before rejecting.
    pub fn parse(subjects: &Subjects, raw: Option<&serde_json::Value>) -> Result<Self, CoreError> {
        let Some(obj) = raw.and_then(|v| v.as_object()) else {
            return Err(CoreError::Validation(vec![
                "scores must be an object keyed by subject".to_string(),
            ]));
        };

        let mut problems = Vec::new();
        for key in obj.keys() {
            if !subjects.contains(key) {
                problems.push(format!("unknown subject: {}", key));
            }
        }

        let mut out = Vec::with_capacity(subjects.len());
        for subject in subjects.iter() {
            match obj.get(subject) {
                None | Some(serde_json::Value::Null) => {
                    problems.push(format!("missing score for {}", subject));
                }
                Some(v) => match whole_number(v) {
                    Some(n) if (0..=100).contains(&n) => out.push((subject.to_string(), n as u8)),
                    Some(n) => problems.push(format!(
                        "{} score {} is out of range (0-100)",
                        subject, n
                    )),
                    None => problems.push(format!("{} score must be an integer", subject)),
                },
            }
        }

        if problems.is_empty() {
            Ok(Self(out))
        } else {
            Err(CoreError::Validation(problems))
        }
    }

    pub fn get(&self, subject: &str) -> Option<u8> {
        self.0.iter().find(|(s, _)| s == subject).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.0.iter().map(|(s, v)| (s.as_str(), *v))
    }

    pub fn values(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().map(|(_, v)| *v)
    }

    pub fn percentage(&self) -> f64 {
        calc::percentage_of(self.values())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub password_hash: String,
    pub email: String,
    pub phone: String,
    pub scores: SubjectScores,
}

impl StudentRecord {
    pub fn percentage(&self) -> f64 {
        self.scores.percentage()
    }

    pub fn grade(&self) -> Grade {
        calc::classify(self.percentage())
    }

    pub fn summary(&self) -> StudentSummary {
        StudentSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            percentage: self.percentage(),
            grade: self.grade(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub percentage: f64,
    pub grade: Grade,
}

fn required_field(params: &serde_json::Value, key: &str, problems: &mut Vec<String>) -> String {
    match params.get(key).and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        Some(_) => {
            problems.push(format!("{} must not be empty", key));
            String::new()
        }
        None => {
            problems.push(format!("missing {}", key));
            String::new()
        }
    }
}

fn contact_field(params: &serde_json::Value, key: &str, problems: &mut Vec<String>) -> String {
    match params.get(key) {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(_) => {
            problems.push(format!("{} must be a string", key));
            String::new()
        }
        None => {
            problems.push(format!("missing {}", key));
            String::new()
        }
    }
}

/// Validates registration params and builds the record. Nothing is returned
/// unless every field is acceptable.
pub fn registration_from_params(
    params: &serde_json::Value,
    subjects: &Subjects,
    hasher: &dyn PasswordHasher,
) -> Result<StudentRecord, CoreError> {
    let mut problems = Vec::new();
    let id = required_field(params, "id", &mut problems);
    let name = required_field(params, "name", &mut problems);
    let email = contact_field(params, "email", &mut problems);
    let phone = contact_field(params, "phone", &mut problems);
    let password = match params.get("password").and_then(|v| v.as_str()) {
        Some(p) if !p.is_empty() => Some(p),
        Some(_) => {
            problems.push("password must not be empty".to_string());
            None
        }
        None => {
            problems.push("missing password".to_string());
            None
        }
    };
    let scores = match SubjectScores::parse(subjects, params.get("scores")) {
        Ok(s) => Some(s),
        Err(CoreError::Validation(mut p)) => {
            problems.append(&mut p);
            None
        }
        Err(e) => return Err(e),
    };

    match (password, scores) {
        (Some(password), Some(scores)) if problems.is_empty() => Ok(StudentRecord {
            id,
            name,
            password_hash: hasher.hash(password),
            email,
            phone,
            scores,
        }),
        _ => Err(CoreError::Validation(problems)),
    }
}
