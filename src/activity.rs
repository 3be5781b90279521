//! Persisted activity log
//!
//! Every entry goes to two places: a `tracing` event for whoever is watching
//! stderr, and a capped JSON document in the store so `snaplink logs` can show
//! history across runs. Persistence is best-effort and never fails the caller.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::clock::Clock;
use crate::database::{KeyValueStore, ACTIVITY_KEY};
use crate::model::{LogEntry, LogLevel};
use crate::random::RandomSource;

/// Oldest entries are dropped past this many
pub const MAX_ENTRIES: usize = 1000;

/// Default number of entries returned by [`ActivityLog::entries`]
pub const DEFAULT_LIMIT: usize = 100;

pub struct ActivityLog {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    lock: Mutex<()>,
}

impl ActivityLog {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            store,
            clock,
            random,
            lock: Mutex::new(()),
        }
    }

    pub fn log(&self, level: LogLevel, message: &str, data: Value) -> LogEntry {
        emit(level, message, &data);

        let now = self.clock.now_millis();
        let entry = LogEntry {
            id: format!("{}-{}", now, self.random.alphanumeric(6)),
            timestamp: DateTime::from_timestamp_millis(now).unwrap_or_else(Utc::now),
            level,
            message: message.to_string(),
            data,
        };

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load();
        entries.push(entry.clone());
        if entries.len() > MAX_ENTRIES {
            let excess = entries.len() - MAX_ENTRIES;
            entries.drain(..excess);
        }
        self.persist(&entries);

        entry
    }

    pub fn info(&self, message: &str, data: Value) -> LogEntry {
        self.log(LogLevel::Info, message, data)
    }

    pub fn warn(&self, message: &str, data: Value) -> LogEntry {
        self.log(LogLevel::Warn, message, data)
    }

    pub fn error(&self, message: &str, data: Value) -> LogEntry {
        self.log(LogLevel::Error, message, data)
    }

    pub fn success(&self, message: &str, data: Value) -> LogEntry {
        self.log(LogLevel::Success, message, data)
    }

    /// Newest first, optionally restricted to one level
    pub fn entries(&self, level: Option<LogLevel>, limit: usize) -> Vec<LogEntry> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries: Vec<LogEntry> = self
            .load()
            .into_iter()
            .filter(|entry| level.map_or(true, |level| entry.level == level))
            .collect();

        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
        entries.reverse();
        entries
    }

    pub fn clear(&self) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.persist(&[]);
    }

    fn load(&self) -> Vec<LogEntry> {
        let raw = match self.store.load(ACTIVITY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read activity log");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "activity log is malformed, starting fresh");
            Vec::new()
        })
    }

    fn persist(&self, entries: &[LogEntry]) {
        let result = serde_json::to_string(entries)
            .map_err(|err| err.to_string())
            .and_then(|raw| {
                self.store
                    .save(ACTIVITY_KEY, &raw)
                    .map_err(|err| err.to_string())
            });

        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to persist activity log");
        }
    }
}

fn emit(level: LogLevel, message: &str, data: &Value) {
    match level {
        LogLevel::Info => tracing::info!(data = %data, "{}", message),
        LogLevel::Success => tracing::info!(data = %data, outcome = "success", "{}", message),
        LogLevel::Warn => tracing::warn!(data = %data, "{}", message),
        LogLevel::Error => tracing::error!(data = %data, "{}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::database::MemoryStore;
    use crate::random::SeededRandom;
    use serde_json::json;

    fn activity() -> (ActivityLog, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let log = ActivityLog::new(
            store.clone(),
            Arc::new(ManualClock::new(1_700_000_000_000)),
            Arc::new(SeededRandom::new(3)),
        );
        (log, store)
    }

    #[test]
    fn entries_are_newest_first_and_filtered() {
        let (log, _store) = activity();
        log.info("first", json!({}));
        log.warn("second", json!({ "shortcode": "abc" }));
        log.success("third", json!({}));

        let all = log.entries(None, DEFAULT_LIMIT);
        let messages: Vec<_> = all.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["third", "second", "first"]);

        let warnings = log.entries(Some(LogLevel::Warn), DEFAULT_LIMIT);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].data["shortcode"], "abc");

        assert_eq!(log.entries(None, 2).len(), 2);
        assert_eq!(log.entries(None, 2)[1].message, "second");
    }

    #[test]
    fn log_is_capped() {
        let (log, _store) = activity();
        for i in 0..(MAX_ENTRIES + 5) {
            log.info(&format!("entry {i}"), Value::Null);
        }

        let entries = log.entries(None, usize::MAX);
        assert_eq!(entries.len(), MAX_ENTRIES);
        assert_eq!(entries[0].message, format!("entry {}", MAX_ENTRIES + 4));
        assert_eq!(entries[MAX_ENTRIES - 1].message, "entry 5");
    }

    #[test]
    fn malformed_document_reads_as_empty() {
        let (log, store) = activity();
        store.save(ACTIVITY_KEY, "not json").unwrap();
        assert!(log.entries(None, DEFAULT_LIMIT).is_empty());

        log.error("after corruption", Value::Null);
        assert_eq!(log.entries(None, DEFAULT_LIMIT).len(), 1);
    }

    #[test]
    fn write_failures_are_swallowed() {
        let (log, store) = activity();
        store.reject_writes(true);
        let entry = log.info("kept in memory only", Value::Null);
        assert_eq!(entry.level, LogLevel::Info);
        assert!(log.entries(None, DEFAULT_LIMIT).is_empty());
    }

    #[test]
    fn clear_empties_the_log() {
        let (log, _store) = activity();
        log.info("one", Value::Null);
        log.clear();
        assert!(log.entries(None, DEFAULT_LIMIT).is_empty());
    }
}
