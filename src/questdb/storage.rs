//! JSON file persistence for the quest dataset.
//!
//! The dataset is always read and written whole. Saving renders pretty JSON with the
//! NPC order preserved and keeps the source file's trailing-newline state, so loading
//! and saving an unchanged dataset reproduces its bytes.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;

use crate::questdb::errors::QuestDbError;
use crate::questdb::types::Dataset;

impl Dataset {
    /// Parse a dataset document held in memory.
    pub fn from_json_str(contents: &str) -> Result<Self, serde_json::Error> {
        let mut dataset: Dataset = serde_json::from_str(contents)?;
        dataset.trailing_newline = contents.ends_with('\n');
        Ok(dataset)
    }

    /// Render the dataset exactly as `QuestStore::save` writes it.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        let mut out = to_pretty_json(self)?;
        if self.trailing_newline {
            out.push('\n');
        }
        Ok(out)
    }
}

/// Pretty JSON (two-space indent, UTF-8 kept as-is), no trailing newline.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// File-backed quest dataset.
#[derive(Debug, Clone)]
pub struct QuestStore {
    path: PathBuf,
}

impl QuestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read and parse the whole dataset.
    pub fn load(&self) -> Result<Dataset, QuestDbError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(QuestDbError::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let dataset = Dataset::from_json_str(&contents).map_err(|source| QuestDbError::Parse {
            path: self.path.clone(),
            source,
        })?;

        debug!(
            "Loaded {} ({} NPCs, {} quests)",
            self.path.display(),
            dataset.npcs.len(),
            dataset.quest_count()
        );
        Ok(dataset)
    }

    /// Overwrite the backing file with `dataset`.
    pub fn save(&self, dataset: &Dataset) -> Result<(), QuestDbError> {
        let content = dataset.to_json_string()?;
        write_atomic(&self.path, &content)?;
        info!(
            "Saved {} ({} quests)",
            self.path.display(),
            dataset.quest_count()
        );
        Ok(())
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), QuestDbError> {
    let content = to_pretty_json(value)?;
    write_atomic(path, &content)?;
    Ok(())
}

/// Write to a unique temp file next to `path`, then rename it over `path`.
///
/// Readers never observe a half-written file. There is no locking: one writer at a time.
pub fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("quests.json");

    let mut counter = 0u32;
    let tmp_path = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut tmp) => {
                tmp.write_all(content.as_bytes())?;
                tmp.flush()?;
                let _ = tmp.sync_all();
                break candidate;
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
                continue;
            }
            Err(e) => return Err(e),
        }
    };

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    // Persist the rename (best-effort)
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questdb::types::{NpcRecord, QuestRecord};
    use tempfile::TempDir;

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let store = QuestStore::new(dir.path().join("absent.json"));
        assert!(matches!(store.load(), Err(QuestDbError::NotFound { .. })));
    }

    #[test]
    fn load_malformed_file_is_parse_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"npcs\": [").unwrap();
        let store = QuestStore::new(&path);
        assert!(matches!(store.load(), Err(QuestDbError::Parse { .. })));
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let dir = TempDir::new().expect("tempdir");
        let store = QuestStore::new(dir.path().join("quests.json"));
        let dataset = Dataset::new("1.0.0")
            .with_npc("prapor", NpcRecord::new("Prapor").with_quest(QuestRecord::new("debut", "Debut")));
        store.save(&dataset).unwrap();
        store.save(&dataset).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["quests.json".to_string()]);
    }
}
