//! The link service
//!
//! [`UrlService`] owns the store handle and the injected clock and random
//! source. It keeps no link data between calls: every operation loads the
//! whole links document, works on that snapshot and, if it changed anything,
//! writes the whole document back. The registry, click recorder and stats
//! live in their own modules as further `impl UrlService` blocks built on the
//! helpers here.

use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::activity::ActivityLog;
use crate::clock::Clock;
use crate::database::{KeyValueStore, LINKS_KEY};
use crate::error::ServiceError;
use crate::model::UrlMap;
use crate::random::RandomSource;

/// Settings that shape the records the service builds
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Prefix of every `short_url`, without trailing slash
    pub base_url: String,

    /// Recorded when a click arrives without a user agent
    pub default_user_agent: String,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            default_user_agent: concat!("snaplink/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

pub struct UrlService {
    store: Arc<dyn KeyValueStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) random: Arc<dyn RandomSource>,
    pub(crate) activity: Arc<ActivityLog>,
    pub(crate) options: ServiceOptions,
    // Serializes each load-modify-save cycle.
    lock: Mutex<()>,
}

impl UrlService {
    /// Builds a service with its own activity log over the same store
    ///
    /// # Arguments
    ///
    /// * `store` - Where the links document (and the activity log) live
    /// * `clock` - Source of "now" for timestamps and expiry checks
    /// * `random` - Draws shortcodes and fallback click locations
    /// * `options` - Base URL for short links and the default user agent
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
        options: ServiceOptions,
    ) -> Self {
        let activity = Arc::new(ActivityLog::new(
            store.clone(),
            clock.clone(),
            random.clone(),
        ));
        Self::with_activity(store, clock, random, activity, options)
    }

    /// Shares an existing activity log instead of creating one
    pub fn with_activity(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
        activity: Arc<ActivityLog>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            store,
            clock,
            random,
            activity,
            options,
            lock: Mutex::new(()),
        }
    }

    pub fn activity(&self) -> &Arc<ActivityLog> {
        &self.activity
    }

    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Reads the current links snapshot
    pub(crate) fn snapshot(&self) -> UrlMap {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.load_links()
    }

    /// Runs one read-modify-write cycle
    ///
    /// `step` receives the current snapshot and returns the next snapshot plus
    /// a result. Nothing is written when `step` fails.
    pub(crate) fn transact<T, F>(&self, step: F) -> Result<T, ServiceError>
    where
        F: FnOnce(UrlMap) -> Result<(UrlMap, T), ServiceError>,
    {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let snapshot = self.load_links();
        let (next, output) = step(snapshot)?;
        self.save_links(&next)?;
        Ok(output)
    }

    fn load_links(&self) -> UrlMap {
        let raw = match self.store.load(LINKS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return UrlMap::new(),
            Err(err) => {
                self.activity.error(
                    "Failed to load URL data from storage",
                    json!({ "error": err.to_string() }),
                );
                return UrlMap::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|err| {
            self.activity.error(
                "Failed to load URL data from storage",
                json!({ "error": err.to_string() }),
            );
            UrlMap::new()
        })
    }

    fn save_links(&self, links: &UrlMap) -> Result<(), ServiceError> {
        let raw = serde_json::to_string(links)
            .map_err(|err| ServiceError::StorageWriteFailed(err.to_string()))?;

        self.store.save(LINKS_KEY, &raw).map_err(|err| {
            self.activity.error(
                "Failed to save URL data to storage",
                json!({ "error": err.to_string() }),
            );
            ServiceError::StorageWriteFailed(err.to_string())
        })
    }
}
