// SPDX-License-Identifier: GPL-3.0-only

//! Persistent scanner debug log
//!
//! A bounded list of timestamped strings, newest first, stored under a fixed
//! key. Nothing in the decode path ever reads it back; it only exists so a
//! user can inspect what the scanner tried. Storage failures are logged and
//! otherwise ignored.
//!
//! Entries are kept in memory and written out at most once per
//! [`DEBUG_LOG_FLUSH_INTERVAL`], on [`DebugLog::flush`], and when the last
//! handle is dropped.

use crate::constants::{
    APP_DIR_NAME, DEBUG_LOG_CAPACITY, DEBUG_LOG_FLUSH_INTERVAL, DEBUG_LOG_KEY,
};
use crate::errors::{ScannerError, ScannerResult};
use chrono::{SecondsFormat, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Key-value backend for string lists
pub trait LogStore: Send + Sync {
    fn load(&self, key: &str) -> ScannerResult<Vec<String>>;
    fn store(&self, key: &str, entries: &[String]) -> ScannerResult<()>;
}

/// JSON files in a directory, one file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store in the user data directory (e.g. `~/.local/share/barcode-scanner`)
    pub fn in_data_dir() -> ScannerResult<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| ScannerError::Storage("No data directory available".into()))?;
        Ok(Self::new(base.join(APP_DIR_NAME)))
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl LogStore for FileStore {
    fn load(&self, key: &str) -> ScannerResult<Vec<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn store(&self, key: &str, entries: &[String]) -> ScannerResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string(entries)?;
        std::fs::write(self.path_for(key), json)?;
        Ok(())
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogStore for MemoryStore {
    fn load(&self, key: &str) -> ScannerResult<Vec<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    fn store(&self, key: &str, entries: &[String]) -> ScannerResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), entries.to_vec());
        Ok(())
    }
}

/// Cached entries and their write-back bookkeeping
#[derive(Default)]
struct Buffer {
    /// `None` until first loaded from the store
    entries: Option<Vec<String>>,
    dirty: bool,
    last_flush: Option<Instant>,
}

struct LogInner {
    store: Arc<dyn LogStore>,
    buffer: Mutex<Buffer>,
}

impl LogInner {
    fn loaded(&self) -> MutexGuard<'_, Buffer> {
        let mut buffer = self.buffer.lock().unwrap();
        if buffer.entries.is_none() {
            buffer.entries = Some(match self.store.load(DEBUG_LOG_KEY) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "Failed to load debug log");
                    Vec::new()
                }
            });
        }
        buffer
    }

    fn write_back(&self, buffer: &mut Buffer) {
        let entries = buffer.entries.as_deref().unwrap_or_default();
        match self.store.store(DEBUG_LOG_KEY, entries) {
            Ok(()) => trace!(entries = entries.len(), "Debug log written"),
            Err(e) => warn!(error = %e, "Failed to persist debug log"),
        }
        buffer.dirty = false;
        buffer.last_flush = Some(Instant::now());
    }
}

impl Drop for LogInner {
    fn drop(&mut self) {
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        if buffer.dirty {
            let entries = buffer.entries.take().unwrap_or_default();
            if let Err(e) = self.store.store(DEBUG_LOG_KEY, &entries) {
                warn!(error = %e, "Failed to persist debug log");
            }
            buffer.dirty = false;
        }
    }
}

/// Bounded, newest-first debug log
#[derive(Clone)]
pub struct DebugLog {
    enabled: bool,
    inner: Arc<LogInner>,
}

impl DebugLog {
    pub fn new(store: Arc<dyn LogStore>, enabled: bool) -> Self {
        Self {
            enabled,
            inner: Arc::new(LogInner {
                store,
                buffer: Mutex::new(Buffer::default()),
            }),
        }
    }

    /// Log persisted in the user data directory, in memory if there is none
    pub fn persistent(enabled: bool) -> Self {
        match FileStore::in_data_dir() {
            Ok(store) => Self::new(Arc::new(store), enabled),
            Err(e) => {
                warn!(error = %e, "Falling back to in-memory debug log");
                Self::in_memory(enabled)
            }
        }
    }

    pub fn in_memory(enabled: bool) -> Self {
        Self::new(Arc::new(MemoryStore::new()), enabled)
    }

    /// Log that never records anything
    pub fn disabled() -> Self {
        Self::in_memory(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Prepend a timestamped entry, evicting the oldest beyond capacity.
    ///
    /// No-op while disabled. The store is written at most once per flush
    /// interval; the first append writes immediately.
    pub fn append(&self, message: impl AsRef<str>) {
        if !self.enabled {
            return;
        }
        let entry = format!(
            "{} {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            message.as_ref()
        );

        let mut buffer = self.inner.loaded();
        let entries = buffer.entries.get_or_insert_with(Vec::new);
        entries.insert(0, entry);
        entries.truncate(DEBUG_LOG_CAPACITY);
        buffer.dirty = true;

        let due = buffer
            .last_flush
            .is_none_or(|at| at.elapsed() >= DEBUG_LOG_FLUSH_INTERVAL);
        if due {
            self.inner.write_back(&mut buffer);
        }
    }

    /// Write pending entries to the store
    pub fn flush(&self) {
        let mut buffer = self.inner.buffer.lock().unwrap();
        if buffer.dirty {
            self.inner.write_back(&mut buffer);
        }
    }

    /// All entries, newest first
    pub fn entries(&self) -> Vec<String> {
        self.inner.loaded().entries.clone().unwrap_or_default()
    }

    /// The `n` newest entries
    pub fn recent(&self, n: usize) -> Vec<String> {
        let buffer = self.inner.loaded();
        let entries = buffer.entries.as_deref().unwrap_or_default();
        entries[..n.min(entries.len())].to_vec()
    }

    pub fn clear(&self) {
        let mut buffer = self.inner.buffer.lock().unwrap();
        buffer.entries = Some(Vec::new());
        buffer.dirty = false;
        match self.inner.store.store(DEBUG_LOG_KEY, &[]) {
            Ok(()) => debug!("Debug log cleared"),
            Err(e) => warn!(error = %e, "Failed to clear debug log"),
        }
    }
}

impl std::fmt::Debug for DebugLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugLog")
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("barcode-scanner-test-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_disabled_log_ignores_appends() {
        let log = DebugLog::disabled();
        log.append("hello");
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_newest_first_with_timestamp() {
        let log = DebugLog::in_memory(true);
        log.append("first");
        log.append("second");

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].ends_with(" second"));
        assert!(entries[1].ends_with(" first"));

        let (stamp, _) = entries[0].split_once(' ').unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let log = DebugLog::in_memory(true);
        for i in 0..DEBUG_LOG_CAPACITY + 5 {
            log.append(format!("entry {}", i));
        }
        let entries = log.entries();
        assert_eq!(entries.len(), DEBUG_LOG_CAPACITY);
        assert!(entries[0].ends_with(&format!("entry {}", DEBUG_LOG_CAPACITY + 4)));
        assert!(entries.last().unwrap().ends_with(" entry 5"));

        assert_eq!(log.recent(3).len(), 3);
        log.clear();
        assert!(log.entries().is_empty());
    }

    /// Store that counts writes
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        writes: std::sync::atomic::AtomicUsize,
    }

    impl CountingStore {
        fn writes(&self) -> usize {
            self.writes.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    impl LogStore for CountingStore {
        fn load(&self, key: &str) -> ScannerResult<Vec<String>> {
            self.inner.load(key)
        }

        fn store(&self, key: &str, entries: &[String]) -> ScannerResult<()> {
            self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.store(key, entries)
        }
    }

    #[test]
    fn test_rapid_appends_are_batched() {
        let store = Arc::new(CountingStore::default());
        let log = DebugLog::new(store.clone(), true);
        for i in 0..50 {
            log.append(format!("attempt {}", i));
        }
        // First append writes, the rest wait for the flush interval
        assert_eq!(store.writes(), 1);
        assert_eq!(log.entries().len(), 50);
        assert_eq!(store.load(DEBUG_LOG_KEY).unwrap().len(), 1);

        log.flush();
        assert_eq!(store.writes(), 2);
        let persisted = store.load(DEBUG_LOG_KEY).unwrap();
        assert_eq!(persisted.len(), 50);
        assert!(persisted[0].ends_with(" attempt 49"));

        // Nothing pending
        log.flush();
        assert_eq!(store.writes(), 2);
    }

    #[test]
    fn test_last_handle_drop_flushes() {
        let store = Arc::new(CountingStore::default());
        let log = DebugLog::new(store.clone(), true);
        let clone = log.clone();
        log.append("one");
        log.append("two");
        drop(log);
        assert_eq!(store.writes(), 1);

        drop(clone);
        assert_eq!(store.load(DEBUG_LOG_KEY).unwrap().len(), 2);
    }

    #[test]
    fn test_file_store_persists_under_fixed_key() {
        let dir = temp_dir();
        let store = Arc::new(FileStore::new(&dir));
        let log = DebugLog::new(store.clone(), true);
        log.append("persisted");
        log.append("buffered");
        log.flush();

        let path = store.path_for(DEBUG_LOG_KEY);
        assert!(path.ends_with("scanner_debug_logs.json"));
        let reopened = DebugLog::new(Arc::new(FileStore::new(&dir)), true);
        assert_eq!(reopened.entries().len(), 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let store = FileStore::new(&dir);
        std::fs::write(store.path_for(DEBUG_LOG_KEY), "not json").unwrap();

        let log = DebugLog::new(Arc::new(store), true);
        assert!(log.entries().is_empty());
        log.append("recovered");
        assert_eq!(log.entries().len(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
