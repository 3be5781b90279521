//! Click recording and the caller-side duplicate guard

use std::collections::{HashSet, VecDeque};

use serde_json::json;

use crate::error::ServiceError;
use crate::model::{ClickData, ClickEvent, UrlMap};
use crate::service::UrlService;

/// Picked from at random when a click arrives without a location
pub const LOCATIONS: [&str; 8] = [
    "Mumbai, India",
    "Delhi, India",
    "Bangalore, India",
    "Chennai, India",
    "Kolkata, India",
    "Hyderabad, India",
    "Pune, India",
    "Ahmedabad, India",
];

pub const DEFAULT_SOURCE: &str = "Direct";

/// Appends `event` to an active record and bumps its counter
///
/// Returns the new click count.
pub(crate) fn append_click(
    mut links: UrlMap,
    shortcode: &str,
    event: ClickEvent,
) -> Result<(UrlMap, u64), ServiceError> {
    let record = links
        .get_mut(shortcode)
        .ok_or_else(|| ServiceError::NotFound(shortcode.to_string()))?;

    if record.is_expired(event.timestamp) {
        return Err(ServiceError::Expired(shortcode.to_string()));
    }

    record.click_logs.push(event);
    record.click_count += 1;
    let count = record.click_count;

    Ok((links, count))
}

impl UrlService {
    /// Records one visit to `shortcode`
    ///
    /// Missing, expired and unsaveable clicks all report `false`. Empty
    /// metadata fields count as absent and get their defaults.
    pub fn record_click(&self, shortcode: &str, data: ClickData) -> bool {
        let present = |value: Option<String>| value.filter(|s| !s.is_empty());
        let event = ClickEvent {
            timestamp: self.now(),
            source: present(data.source).unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            location: present(data.location)
                .unwrap_or_else(|| LOCATIONS[self.random.index(LOCATIONS.len())].to_string()),
            user_agent: present(data.user_agent)
                .unwrap_or_else(|| self.options.default_user_agent.clone()),
        };

        match self.transact(|links| append_click(links, shortcode, event)) {
            Ok(click_count) => {
                self.activity.info(
                    "Click recorded successfully",
                    json!({ "shortcode": shortcode, "clickCount": click_count }),
                );
                true
            }
            Err(ServiceError::NotFound(_)) => {
                self.activity.error(
                    "Cannot record click: shortcode not found",
                    json!({ "shortcode": shortcode }),
                );
                false
            }
            Err(ServiceError::Expired(_)) => {
                self.activity.error(
                    "Cannot record click: URL has expired",
                    json!({ "shortcode": shortcode }),
                );
                false
            }
            Err(_) => {
                self.activity
                    .error("Failed to record click", json!({ "shortcode": shortcode }));
                false
            }
        }
    }
}

/// Tracked keys beyond this trigger eviction
const TRACKER_LIMIT: usize = 100;

/// Keys kept after eviction
const TRACKER_RETAIN: usize = 50;

/// Suppresses repeat clicks on the same code within one wall-clock second
///
/// This is a best-effort, per-session guard, not an exact dedup: only the
/// most recent keys are remembered.
#[derive(Debug, Default)]
pub struct ClickDeduper {
    seen: HashSet<String>,
    order: VecDeque<String>,
}

impl ClickDeduper {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(shortcode: &str, now_millis: i64) -> String {
        format!("{}-{}", shortcode, now_millis.div_euclid(1000))
    }

    pub fn is_duplicate(&self, shortcode: &str, now_millis: i64) -> bool {
        self.seen.contains(&Self::key(shortcode, now_millis))
    }

    /// Marks a successfully recorded click
    pub fn remember(&mut self, shortcode: &str, now_millis: i64) {
        let key = Self::key(shortcode, now_millis);
        if !self.seen.insert(key.clone()) {
            return;
        }
        self.order.push_back(key);

        if self.order.len() > TRACKER_LIMIT {
            while self.order.len() > TRACKER_RETAIN {
                if let Some(oldest) = self.order.pop_front() {
                    self.seen.remove(&oldest);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
