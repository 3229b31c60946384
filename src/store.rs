use crate::config::Subjects;
use crate::db;
use crate::record::{StudentRecord, SubjectScores};
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("student id {0} already exists")]
    DuplicateId(String),
    #[error("student {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::DuplicateId(_) => "duplicate_id",
            StoreError::NotFound(_) => "not_found",
            StoreError::Backend(_) => "db_query_failed",
        }
    }
}

/// One dated score sheet for a student. Sequence 0 is the registration sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSnapshot {
    pub seq: i64,
    pub recorded_at: String,
    pub scores: SubjectScores,
}

impl ScoreSnapshot {
    pub fn percentage(&self) -> f64 {
        self.scores.percentage()
    }
}

pub trait RecordStore {
    /// Inserts a new record along with its registration snapshot.
    fn insert(&mut self, record: &StudentRecord) -> Result<(), StoreError>;

    fn find_by_id(&self, id: &str) -> Result<Option<StudentRecord>, StoreError>;

    /// Every record, in registration order.
    fn scan_all(&self) -> Result<Vec<StudentRecord>, StoreError>;

    fn append_snapshot(
        &mut self,
        id: &str,
        scores: &SubjectScores,
    ) -> Result<ScoreSnapshot, StoreError>;

    /// Snapshots for one student ordered by sequence, earliest first.
    fn snapshots(&self, id: &str) -> Result<Vec<ScoreSnapshot>, StoreError>;

    fn percentage_history(&self, id: &str) -> Result<Vec<f64>, StoreError> {
        Ok(self
            .snapshots(id)?
            .iter()
            .map(ScoreSnapshot::percentage)
            .collect())
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub struct SqliteRecordStore {
    conn: Connection,
    subjects: Subjects,
}

impl SqliteRecordStore {
    pub fn open(workspace: &Path, subjects: Subjects) -> anyhow::Result<Self> {
        let conn = db::open_db(workspace).with_context(|| {
            format!("failed to open workspace {}", workspace.to_string_lossy())
        })?;
        Ok(Self { conn, subjects })
    }

    fn student_exists(&self, id: &str) -> anyhow::Result<bool> {
        let hit: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM students WHERE id = ?", [id], |r| r.get(0))
            .optional()
            .context("failed to look up student id")?;
        Ok(hit.is_some())
    }

    fn load_score_rows(&self, sql: &str, key: &str) -> anyhow::Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([key], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn insert_snapshot_rows(
    tx: &rusqlite::Transaction<'_>,
    student_id: &str,
    seq: i64,
    recorded_at: &str,
    scores: &SubjectScores,
) -> anyhow::Result<()> {
    let snapshot_id = Uuid::new_v4().to_string();
    tx.execute(
        "INSERT INTO score_snapshots(id, student_id, seq, recorded_at) VALUES(?, ?, ?, ?)",
        (&snapshot_id, student_id, seq, recorded_at),
    )
    .context("failed to insert score snapshot")?;
    for (subject, score) in scores.iter() {
        tx.execute(
            "INSERT INTO snapshot_scores(snapshot_id, subject, score) VALUES(?, ?, ?)",
            (&snapshot_id, subject, i64::from(score)),
        )
        .context("failed to insert snapshot score")?;
    }
    Ok(())
}

impl RecordStore for SqliteRecordStore {
    fn insert(&mut self, record: &StudentRecord) -> Result<(), StoreError> {
        if self.student_exists(&record.id)? {
            return Err(StoreError::DuplicateId(record.id.clone()));
        }
        let recorded_at = now_rfc3339();
        let tx = self
            .conn
            .transaction()
            .context("failed to begin transaction")?;
        let sort_order: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM students",
                [],
                |r| r.get(0),
            )
            .context("failed to compute sort order")?;
        tx.execute(
            "INSERT INTO students(id, name, password_hash, email, phone, sort_order, created_at)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                &record.id,
                &record.name,
                &record.password_hash,
                &record.email,
                &record.phone,
                sort_order,
                &recorded_at,
            ),
        )
        .context("failed to insert student")?;
        for (subject, score) in record.scores.iter() {
            tx.execute(
                "INSERT INTO student_scores(student_id, subject, score) VALUES(?, ?, ?)",
                (&record.id, subject, i64::from(score)),
            )
            .context("failed to insert student score")?;
        }
        insert_snapshot_rows(&tx, &record.id, 0, &recorded_at, &record.scores)?;
        tx.commit().context("failed to commit registration")?;
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<StudentRecord>, StoreError> {
        let row: Option<(String, String, String, String, String)> = self
            .conn
            .query_row(
                "SELECT id, name, password_hash, email, phone FROM students WHERE id = ?",
                [id],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
            )
            .optional()
            .context("failed to query student")?;
        let Some((id, name, password_hash, email, phone)) = row else {
            return Ok(None);
        };
        let rows = self
            .load_score_rows(
                "SELECT subject, score FROM student_scores WHERE student_id = ?",
                &id,
            )
            .context("failed to query student scores")?;
        Ok(Some(StudentRecord {
            id,
            name,
            password_hash,
            email,
            phone,
            scores: SubjectScores::from_rows(&self.subjects, &rows),
        }))
    }

    fn scan_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        let mut score_stmt = self
            .conn
            .prepare("SELECT student_id, subject, score FROM student_scores")
            .context("failed to prepare score scan")?;
        let mut by_student: HashMap<String, Vec<(String, i64)>> = HashMap::new();
        let score_rows = score_stmt
            .query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, i64>(2)?,
                ))
            })
            .and_then(|it| it.collect::<Result<Vec<_>, _>>())
            .context("failed to scan student scores")?;
        for (student_id, subject, score) in score_rows {
            by_student
                .entry(student_id)
                .or_default()
                .push((subject, score));
        }

        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, password_hash, email, phone
                 FROM students
                 ORDER BY sort_order, rowid",
            )
            .context("failed to prepare student scan")?;
        let students = stmt
            .query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                ))
            })
            .and_then(|it| it.collect::<Result<Vec<_>, _>>())
            .context("failed to scan students")?;

        Ok(students
            .into_iter()
            .map(|(id, name, password_hash, email, phone)| {
                let rows = by_student.remove(&id).unwrap_or_default();
                StudentRecord {
                    scores: SubjectScores::from_rows(&self.subjects, &rows),
                    id,
                    name,
                    password_hash,
                    email,
                    phone,
                }
            })
            .collect())
    }

    fn append_snapshot(
        &mut self,
        id: &str,
        scores: &SubjectScores,
    ) -> Result<ScoreSnapshot, StoreError> {
        if !self.student_exists(id)? {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let recorded_at = now_rfc3339();
        let tx = self
            .conn
            .transaction()
            .context("failed to begin transaction")?;
        let seq: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(seq), -1) + 1 FROM score_snapshots WHERE student_id = ?",
                [id],
                |r| r.get(0),
            )
            .context("failed to compute snapshot sequence")?;
        insert_snapshot_rows(&tx, id, seq, &recorded_at, scores)?;
        tx.commit().context("failed to commit snapshot")?;
        Ok(ScoreSnapshot {
            seq,
            recorded_at,
            scores: scores.clone(),
        })
    }

    fn snapshots(&self, id: &str) -> Result<Vec<ScoreSnapshot>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, seq, recorded_at
                 FROM score_snapshots
                 WHERE student_id = ?
                 ORDER BY seq",
            )
            .context("failed to prepare snapshot query")?;
        let heads = stmt
            .query_map([id], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                ))
            })
            .and_then(|it| it.collect::<Result<Vec<_>, _>>())
            .context("failed to query snapshots")?;

        let mut out = Vec::with_capacity(heads.len());
        for (snapshot_id, seq, recorded_at) in heads {
            let rows = self
                .load_score_rows(
                    "SELECT subject, score FROM snapshot_scores WHERE snapshot_id = ?",
                    &snapshot_id,
                )
                .context("failed to query snapshot scores")?;
            out.push(ScoreSnapshot {
                seq,
                recorded_at,
                scores: SubjectScores::from_rows(&self.subjects, &rows),
            });
        }
        Ok(out)
    }
}

/// Keeps everything in memory. Backs `workspace.select { inMemory: true }`
/// sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Vec<StudentRecord>,
    snapshots: HashMap<String, Vec<ScoreSnapshot>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert(&mut self, record: &StudentRecord) -> Result<(), StoreError> {
        if self.records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::DuplicateId(record.id.clone()));
        }
        self.records.push(record.clone());
        self.snapshots.insert(
            record.id.clone(),
            vec![ScoreSnapshot {
                seq: 0,
                recorded_at: now_rfc3339(),
                scores: record.scores.clone(),
            }],
        );
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<StudentRecord>, StoreError> {
        Ok(self.records.iter().find(|r| r.id == id).cloned())
    }

    fn scan_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn append_snapshot(
        &mut self,
        id: &str,
        scores: &SubjectScores,
    ) -> Result<ScoreSnapshot, StoreError> {
        let Some(list) = self.snapshots.get_mut(id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        let snapshot = ScoreSnapshot {
            seq: list.len() as i64,
            recorded_at: now_rfc3339(),
            scores: scores.clone(),
        };
        list.push(snapshot.clone());
        Ok(snapshot)
    }

    fn snapshots(&self, id: &str) -> Result<Vec<ScoreSnapshot>, StoreError> {
        Ok(self.snapshots.get(id).cloned().unwrap_or_default())
    }
}
