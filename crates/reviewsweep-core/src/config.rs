//! Configuration and data directory management.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Paths to all ReviewSweep data files and directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Per-reporter report history (`data/report_history.json`).
    pub report_history: PathBuf,
    /// Flat log of submitted reports (`data/submitted_log.json`).
    pub submitted_log: PathBuf,
    /// Saved account cookie jars (`data/cookies/`).
    pub cookies: PathBuf,
    /// Embedding model files (`data/models/`).
    pub models: PathBuf,
    /// Tabular dataset exports (`data/exports/`).
    pub exports: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            report_history: root.join("report_history.json"),
            submitted_log: root.join("submitted_log.json"),
            cookies: root.join("cookies"),
            models: root.join("models"),
            exports: root.join("exports"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.cookies)?;
        std::fs::create_dir_all(&self.exports)?;
        Ok(())
    }
}

/// Top-level ReviewSweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Directory holding `model.onnx` + `tokenizer.json`.
    pub model_dir: PathBuf,
    /// Optional JSON file overriding the built-in category taxonomy.
    pub taxonomy_file: Option<PathBuf>,
}

impl SweepConfig {
    /// Create configuration from environment and defaults.
    ///
    /// `REVIEWSWEEP_MODEL_DIR` overrides `<data>/models`,
    /// `REVIEWSWEEP_TAXONOMY` points at a taxonomy JSON file.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let data_paths = DataPaths::new(data_dir)?;

        let model_dir = std::env::var("REVIEWSWEEP_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_paths.models.clone());

        let taxonomy_file = std::env::var("REVIEWSWEEP_TAXONOMY").ok().map(PathBuf::from);

        Ok(Self {
            data_paths,
            model_dir,
            taxonomy_file,
        })
    }
}

/// Read a JSON file, falling back to `T::default()`.
///
/// A missing file is silent. An unreadable or malformed file is logged
/// and treated as empty; it is never fatal.
pub fn read_json_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            warn!("Failed to read {}: {}. Using empty state.", path.display(), e);
            return T::default();
        }
    };

    match serde_json::from_str(&data) {
        Ok(value) => value,
        Err(e) => {
            warn!("Corrupt JSON in {}: {}. Using empty state.", path.display(), e);
            T::default()
        }
    }
}

/// Write a value as pretty JSON, replacing the whole file.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_data_paths_created() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path().join("data")).unwrap();
        assert!(paths.cookies.is_dir());
        assert!(paths.exports.is_dir());
        assert_eq!(paths.report_history.file_name().unwrap(), "report_history.json");
    }

    #[test]
    fn test_missing_json_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let value: HashMap<String, u32> = read_json_or_default(&dir.path().join("nope.json"));
        assert!(value.is_empty());
    }

    #[test]
    fn test_corrupt_json_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let value: Vec<String> = read_json_or_default(&path);
        assert!(value.is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/state.json");
        let mut map = HashMap::new();
        map.insert("a".to_string(), 1u32);
        write_json(&path, &map).unwrap();
        let loaded: HashMap<String, u32> = read_json_or_default(&path);
        assert_eq!(loaded.get("a"), Some(&1));
    }
}
