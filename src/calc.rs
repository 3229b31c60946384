use crate::config::Subjects;
use crate::record::StudentRecord;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;

/// Half-away-from-zero rounding to 2 decimals, used for every reported
/// percentage and average.
pub fn round_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid student record: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Insufficient data for predictions (need at least 2 records, have {points})")]
    InsufficientData { points: usize },
    #[error("No student data available")]
    EmptyDataset,
}

impl CoreError {
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation_failed",
            CoreError::NotFound(_) => "not_found",
            CoreError::InsufficientData { .. } => "insufficient_data",
            CoreError::EmptyDataset => "empty_dataset",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            CoreError::Validation(problems) => Some(serde_json::json!({ "problems": problems })),
            CoreError::InsufficientData { points } => {
                Some(serde_json::json!({ "points": points, "required": 2 }))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grade {
    APlus,
    A,
    BPlus,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Canonical reporting order, best first.
    pub const ALL: [Grade; 7] = [
        Grade::APlus,
        Grade::A,
        Grade::BPlus,
        Grade::B,
        Grade::C,
        Grade::D,
        Grade::F,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// Letter grade for a percentage. Thresholds are inclusive lower bounds,
/// checked from the top; anything below 40 (including NaN) is an F.
pub fn classify(percentage: f64) -> Grade {
    match percentage {
        p if p >= 90.0 => Grade::APlus,
        p if p >= 80.0 => Grade::A,
        p if p >= 70.0 => Grade::BPlus,
        p if p >= 60.0 => Grade::B,
        p if p >= 50.0 => Grade::C,
        p if p >= 40.0 => Grade::D,
        _ => Grade::F,
    }
}

/// Mean of the given scores rounded to 2 decimals; 0 for an empty sheet.
pub fn percentage_of<I>(scores: I) -> f64
where
    I: IntoIterator<Item = u8>,
{
    let mut sum = 0_u32;
    let mut count = 0_u32;
    for s in scores {
        sum += u32::from(s);
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    round_2_decimals(f64::from(sum) / f64::from(count))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStanding {
    pub id: String,
    pub name: String,
    pub percentage: f64,
    pub grade: Grade,
}

impl StudentStanding {
    fn of(record: &StudentRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            percentage: record.percentage(),
            grade: record.grade(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAverage {
    pub subject: String,
    pub average: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeCount {
    pub grade: Grade,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStatistics {
    pub total_students: usize,
    pub class_average: f64,
    pub topper: StudentStanding,
    pub weakest: StudentStanding,
    pub subject_averages: Vec<SubjectAverage>,
    pub hardest_subject: SubjectAverage,
    pub easiest_subject: SubjectAverage,
    pub grade_distribution: Vec<GradeCount>,
}

/// First element with the extreme key; later elements only replace the
/// current pick on a strict improvement, so ties keep scan order.
fn first_extreme<T, F>(items: &[T], key: F, want: Ordering) -> Option<&T>
where
    F: Fn(&T) -> f64,
{
    let mut best: Option<&T> = None;
    for item in items {
        match best {
            None => best = Some(item),
            Some(b) => {
                if key(item).partial_cmp(&key(b)) == Some(want) {
                    best = Some(item);
                }
            }
        }
    }
    best
}

pub fn compute_class_statistics(
    records: &[StudentRecord],
    subjects: &Subjects,
) -> Result<ClassStatistics, CoreError> {
    if records.is_empty() {
        return Err(CoreError::EmptyDataset);
    }
    let n = records.len() as f64;

    let percentages_sum: f64 = records.iter().map(|r| r.percentage()).sum();
    let class_average = round_2_decimals(percentages_sum / n);

    let topper = first_extreme(records, |r| r.percentage(), Ordering::Greater)
        .ok_or(CoreError::EmptyDataset)?;
    let weakest = first_extreme(records, |r| r.percentage(), Ordering::Less)
        .ok_or(CoreError::EmptyDataset)?;

    let subject_averages: Vec<SubjectAverage> = subjects
        .iter()
        .map(|subject| {
            let total: u32 = records
                .iter()
                .map(|r| u32::from(r.scores.get(subject).unwrap_or(0)))
                .sum();
            SubjectAverage {
                subject: subject.to_string(),
                average: round_2_decimals(f64::from(total) / n),
            }
        })
        .collect();
    let hardest_subject = first_extreme(&subject_averages, |s| s.average, Ordering::Less)
        .cloned()
        .ok_or(CoreError::EmptyDataset)?;
    let easiest_subject = first_extreme(&subject_averages, |s| s.average, Ordering::Greater)
        .cloned()
        .ok_or(CoreError::EmptyDataset)?;

    let grade_distribution = Grade::ALL
        .iter()
        .map(|g| GradeCount {
            grade: *g,
            count: records.iter().filter(|r| r.grade() == *g).count(),
        })
        .collect();

    Ok(ClassStatistics {
        total_students: records.len(),
        class_average,
        topper: StudentStanding::of(topper),
        weakest: StudentStanding::of(weakest),
        subject_averages,
        hardest_subject,
        easiest_subject,
        grade_distribution,
    })
}
