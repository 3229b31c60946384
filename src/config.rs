use anyhow::{anyhow, Context};
use std::collections::HashSet;
use std::path::PathBuf;

pub const DEFAULT_SUBJECTS: [&str; 6] = ["Machine Learning", "UHV", "DMGT", "DBMS", "OT", "ES"];

/// Canonical, ordered subject list shared read-only by every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subjects(Vec<String>);

impl Subjects {
    pub fn new<I, S>(names: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for name in names {
            let name: String = name.into();
            let t = name.trim();
            if t.is_empty() {
                return Err(anyhow!("subject names must not be empty"));
            }
            if !seen.insert(t.to_string()) {
                return Err(anyhow!("duplicate subject: {}", t));
            }
            out.push(t.to_string());
        }
        if out.is_empty() {
            return Err(anyhow!("at least one subject must be configured"));
        }
        Ok(Self(out))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|s| s == name)
    }
}

impl Default for Subjects {
    fn default() -> Self {
        Self(DEFAULT_SUBJECTS.iter().map(|s| s.to_string()).collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub subjects: Subjects,
    pub workspace: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let subjects = match std::env::var("STUDENTD_SUBJECTS") {
            Ok(raw) if !raw.trim().is_empty() => {
                Subjects::new(raw.split(',')).context("invalid STUDENTD_SUBJECTS")?
            }
            _ => Subjects::default(),
        };
        let workspace = std::env::var("STUDENTD_WORKSPACE")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Ok(Self {
            subjects,
            workspace,
        })
    }
}
