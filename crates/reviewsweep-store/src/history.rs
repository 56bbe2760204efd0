//! Per-reporter report history: `{reporter: {review_key: {Category, Date}}}`.
//!
//! Drives anti-double-report checks. Entries are append-only: recording a
//! review that is already in a reporter's history keeps the first entry.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use reviewsweep_core::config::{read_json_or_default, write_json};
use reviewsweep_core::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Timestamp format of [`HistoryEntry::date`].
pub const HISTORY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Date")]
    pub date: String,
}

type ReporterMap = BTreeMap<String, BTreeMap<String, HistoryEntry>>;

#[derive(Debug, Clone)]
pub struct ReportHistory {
    path: PathBuf,
    reporters: ReporterMap,
}

impl ReportHistory {
    /// Load from `path`; missing or corrupt files give an empty history.
    pub fn load(path: &Path) -> Self {
        let reporters: ReporterMap = read_json_or_default(path);
        debug!(
            "Report history: {} reporters from {}",
            reporters.len(),
            path.display()
        );
        Self {
            path: path.to_path_buf(),
            reporters,
        }
    }

    pub fn save(&self) -> Result<()> {
        write_json(&self.path, &self.reporters)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_reported(&self, reporter: &str, review_key: &str) -> bool {
        self.get(reporter, review_key).is_some()
    }

    pub fn get(&self, reporter: &str, review_key: &str) -> Option<&HistoryEntry> {
        self.reporters.get(reporter).and_then(|m| m.get(review_key))
    }

    /// Record a report filed now. Returns `false` if one was already recorded.
    pub fn record(&mut self, reporter: &str, review_key: &str, category: &str) -> bool {
        self.record_at(reporter, review_key, category, chrono::Local::now().naive_local())
    }

    pub fn record_at(&mut self, reporter: &str, review_key: &str, category: &str, at: NaiveDateTime) -> bool {
        let entries = self.reporters.entry(reporter.to_string()).or_default();
        if entries.contains_key(review_key) {
            debug!("{} already reported {}", reporter, review_key);
            return false;
        }
        entries.insert(
            review_key.to_string(),
            HistoryEntry {
                category: category.to_string(),
                date: at.format(HISTORY_DATE_FORMAT).to_string(),
            },
        );
        info!("Recorded '{}' report by {}", category, reporter);
        true
    }

    /// A reporter's entries ordered by review key.
    pub fn entries_for(&self, reporter: &str) -> Vec<(&str, &HistoryEntry)> {
        self.reporters
            .get(reporter)
            .map(|m| m.iter().map(|(k, e)| (k.as_str(), e)).collect())
            .unwrap_or_default()
    }

    /// Review keys already reported by `reporter`.
    pub fn reported_keys(&self, reporter: &str) -> HashSet<String> {
        self.reporters
            .get(reporter)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn reporters(&self) -> impl Iterator<Item = &str> {
        self.reporters.keys().map(String::as_str)
    }

    /// Total entries across all reporters.
    pub fn len(&self) -> usize {
        self.reporters.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_record_is_append_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = ReportHistory::load(&dir.path().join("history.json"));
        assert!(history.is_empty());

        assert!(history.record_at("ann@example.com", "k1", "Spam", at(9)));
        assert!(!history.record_at("ann@example.com", "k1", "Profanity", at(10)));

        let entry = history.get("ann@example.com", "k1").unwrap();
        assert_eq!(entry.category, "Spam");
        assert_eq!(entry.date, "2024-03-01 09:00:00");
        assert!(!history.is_reported("bob@example.com", "k1"));
    }

    #[test]
    fn test_file_format_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut history = ReportHistory::load(&path);
        history.record_at("ann", "k2", "Off topic", at(8));
        history.record_at("ann", "k1", "Spam", at(9));
        history.save().unwrap();

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["ann"]["k1"]["Category"], "Spam");
        assert_eq!(raw["ann"]["k1"]["Date"], "2024-03-01 09:00:00");

        let reloaded = ReportHistory::load(&path);
        assert_eq!(reloaded.len(), 2);
        let keys: Vec<&str> = reloaded.entries_for("ann").into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["k1", "k2"]);
        assert!(reloaded.reported_keys("ann").contains("k2"));
        assert!(reloaded.entries_for("nobody").is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "[[[").unwrap();
        let history = ReportHistory::load(&path);
        assert!(history.is_empty());
        assert_eq!(history.reporters().count(), 0);
    }
}
