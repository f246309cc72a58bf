//! Run history with a retention cap and optional JSON persistence.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use switchboard_common::{Result, RunResult, SwitchboardError};
use tracing::{debug, info};

pub const DEFAULT_MAX_ITEMS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    /// Unix epoch milliseconds
    pub timestamp: u64,
    pub task: String,
    pub result: RunResult,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    tasks_completed: u64,
    #[serde(default)]
    entries: Vec<HistoryEntry>,
}

/// Recorded runs, newest first.
#[derive(Debug)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    max_items: usize,
    tasks_completed: u64,
    path: Option<PathBuf>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITEMS)
    }
}

impl HistoryStore {
    /// In-memory store.
    pub fn new(max_items: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_items,
            tasks_completed: 0,
            path: None,
        }
    }

    /// File-backed store. A missing file starts empty.
    pub fn open(path: impl AsRef<Path>, max_items: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<HistoryFile>(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HistoryFile::default(),
            Err(e) => return Err(e.into()),
        };

        let mut store = Self {
            entries: file.entries.into(),
            max_items,
            tasks_completed: file.tasks_completed,
            path: Some(path),
        };
        evict(&mut store.entries, max_items);

        info!(
            path = ?store.path,
            entries = store.entries.len(),
            "Opened history store"
        );
        Ok(store)
    }

    pub fn record(&mut self, task: &str, result: &RunResult) -> Result<HistoryEntry> {
        let entry = HistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: now_millis(),
            task: task.to_string(),
            result: result.clone(),
        };

        let mut entries = self.entries.clone();
        entries.push_front(entry.clone());
        evict(&mut entries, self.max_items);
        let tasks_completed = self.tasks_completed + 1;

        self.commit(entries, tasks_completed)?;

        debug!(entry_id = %entry.id, "Recorded run");
        Ok(entry)
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Result<HistoryEntry> {
        let mut entries = self.entries.clone();
        let removed = entries
            .iter()
            .position(|e| e.id == id)
            .and_then(|index| entries.remove(index))
            .ok_or_else(|| SwitchboardError::History(format!("no entry with id {id}")))?;

        self.commit(entries, self.tasks_completed)?;
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.commit(VecDeque::new(), self.tasks_completed)
    }

    /// Runs ever recorded; not reduced by eviction or removal.
    pub fn tasks_completed(&self) -> u64 {
        self.tasks_completed
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Persist the new state, then adopt it. A failed write leaves the
    /// store as it was.
    fn commit(&mut self, entries: VecDeque<HistoryEntry>, tasks_completed: u64) -> Result<()> {
        if let Some(path) = &self.path {
            save(path, &entries, tasks_completed)?;
        }

        self.entries = entries;
        self.tasks_completed = tasks_completed;
        Ok(())
    }
}

fn evict(entries: &mut VecDeque<HistoryEntry>, max_items: usize) {
    while entries.len() > max_items {
        if let Some(evicted) = entries.pop_back() {
            debug!(entry_id = %evicted.id, "Evicted from history");
        }
    }
}

fn save(path: &Path, entries: &VecDeque<HistoryEntry>, tasks_completed: u64) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = HistoryFile {
        tasks_completed,
        entries: entries.iter().cloned().collect(),
    };
    std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
    Ok(())
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(task: &str) -> RunResult {
        RunResult {
            task: task.to_string(),
            routing_plan: Vec::new(),
            results: Vec::new(),
            consolidated: format!("answer to {task}"),
            success: true,
            errors: Vec::new(),
        }
    }

    #[test]
    fn newest_entry_comes_first() {
        let mut store = HistoryStore::new(10);
        store.record("first", &run("first")).unwrap();
        store.record("second", &run("second")).unwrap();

        let tasks: Vec<_> = store.entries().map(|e| e.task.as_str()).collect();
        assert_eq!(tasks, vec!["second", "first"]);
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let mut store = HistoryStore::new(2);
        for task in ["a", "b", "c"] {
            store.record(task, &run(task)).unwrap();
        }

        let tasks: Vec<_> = store.entries().map(|e| e.task.as_str()).collect();
        assert_eq!(tasks, vec!["c", "b"]);
        assert_eq!(store.tasks_completed(), 3);
    }

    #[test]
    fn get_and_remove_by_id() {
        let mut store = HistoryStore::default();
        let entry = store.record("task", &run("task")).unwrap();

        assert_eq!(store.get(&entry.id).map(|e| e.task.as_str()), Some("task"));
        store.remove(&entry.id).unwrap();
        assert!(store.get(&entry.id).is_none());
        assert!(matches!(
            store.remove(&entry.id),
            Err(SwitchboardError::History(_))
        ));
        assert_eq!(store.tasks_completed(), 1);
    }

    #[test]
    fn clear_keeps_counter() {
        let mut store = HistoryStore::default();
        store.record("task", &run("task")).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.tasks_completed(), 1);
    }

    #[test]
    fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");

        let id = {
            let mut store = HistoryStore::open(&path, 10).unwrap();
            assert!(store.is_empty());
            store.record("persisted", &run("persisted")).unwrap().id
        };

        let store = HistoryStore::open(&path, 10).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.tasks_completed(), 1);
        assert_eq!(store.get(&id).map(|e| e.result.consolidated.as_str()), Some("answer to persisted"));
    }

    #[test]
    fn retention_cap_applies_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        {
            let mut store = HistoryStore::open(&path, 10).unwrap();
            for task in ["a", "b", "c"] {
                store.record(task, &run(task)).unwrap();
            }
        }

        let store = HistoryStore::open(&path, 1).unwrap();
        let tasks: Vec<_> = store.entries().map(|e| e.task.as_str()).collect();
        assert_eq!(tasks, vec!["c"]);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            HistoryStore::open(&path, 10),
            Err(SwitchboardError::Serialization(_))
        ));
    }

    #[test]
    fn failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::open(&path, 10).unwrap();
        let kept = store.record("kept", &run("kept")).unwrap();

        // a directory where the file should be makes every write fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.record("lost", &run("lost")).is_err());
        assert_eq!(store.len(), 1);
        assert_eq!(store.tasks_completed(), 1);

        assert!(store.remove(&kept.id).is_err());
        assert!(store.get(&kept.id).is_some());

        assert!(store.clear().is_err());
        assert_eq!(store.len(), 1);
    }
}
