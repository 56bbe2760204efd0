//! Flat, append-only log of every submitted report.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use reviewsweep_core::config::{read_json_or_default, write_json};
use reviewsweep_core::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: String,
    pub reporter: String,
    #[serde(rename = "reviewKey")]
    pub review_key: String,
    pub place: String,
    pub user: String,
    pub category: String,
    pub timestamp: DateTime<Utc>,
}

impl ReportRecord {
    pub fn new(reporter: &str, review_key: &str, place: &str, user: &str, category: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            reporter: reporter.to_string(),
            review_key: review_key.to_string(),
            place: place.to_string(),
            user: user.to_string(),
            category: category.to_string(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubmittedLog {
    path: PathBuf,
    records: Vec<ReportRecord>,
}

impl SubmittedLog {
    pub fn load(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            records: read_json_or_default(path),
        }
    }

    pub fn save(&self) -> Result<()> {
        write_json(&self.path, &self.records)
    }

    pub fn append(&mut self, record: ReportRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ReportRecord] {
        &self.records
    }

    pub fn for_reporter<'a>(&'a self, reporter: &'a str) -> impl Iterator<Item = &'a ReportRecord> + 'a {
        self.records.iter().filter(move |r| r.reporter == reporter)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_save_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submitted_log.json");

        let mut log = SubmittedLog::load(&path);
        assert!(log.is_empty());
        log.append(ReportRecord::new("ann", "k1", "Cafe Luna", "Bob", "Spam"));
        log.append(ReportRecord::new("cy", "k2", "Cafe Luna", "Dee", "Profanity"));
        log.save().unwrap();

        let reloaded = SubmittedLog::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.records()[0].review_key, "k1");
        assert_ne!(reloaded.records()[0].id, reloaded.records()[1].id);
        assert_eq!(reloaded.for_reporter("cy").count(), 1);
    }

    #[test]
    fn test_corrupt_log_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submitted_log.json");
        std::fs::write(&path, "{\"not\": \"a list\"}").unwrap();
        assert!(SubmittedLog::load(&path).is_empty());
    }
}
