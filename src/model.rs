//! Data models for the URL shortener
//!
//! Stored documents use camelCase field names so the persisted JSON reads the
//! same as the payloads a browser front end would exchange.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// All link records, keyed by shortcode
pub type UrlMap = BTreeMap<String, UrlRecord>;

/// One shortened URL and its click history
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UrlRecord {
    /// Creation timestamp in epoch milliseconds
    pub id: i64,

    /// The original long URL (http or https only)
    pub original_url: String,

    /// Unique key of this record (e.g., "abc123" or a custom code)
    pub shortcode: String,

    /// The complete shortened URL (e.g., "http://localhost:3000/abc123")
    pub short_url: String,

    pub created_at: i64,

    /// `created_at + expiry_minutes * 60_000`
    pub expiry_at: i64,

    pub expiry_minutes: u32,

    /// Always equal to `click_logs.len()`
    #[serde(default)]
    pub click_count: u64,

    /// Oldest first
    #[serde(default)]
    pub click_logs: Vec<ClickEvent>,
}

impl UrlRecord {
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expiry_at
    }

    pub fn status(&self, now: i64) -> LinkStatus {
        if self.is_expired(now) {
            LinkStatus::Expired
        } else {
            LinkStatus::Active
        }
    }
}

/// Derived state of a record relative to the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Active,
    Expired,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::Active => f.write_str("active"),
            LinkStatus::Expired => f.write_str("expired"),
        }
    }
}

/// One recorded visit
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub timestamp: i64,
    pub source: String,
    pub location: String,
    pub user_agent: String,
}

/// Caller-supplied click metadata; missing fields get defaults
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClickData {
    pub source: Option<String>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Summary counts over every stored record
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UrlStats {
    pub total_urls: usize,
    pub active_urls: usize,
    pub expired_urls: usize,
    pub total_clicks: u64,
}

/// Signed-in demo user
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// Severity of an activity log entry
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Success,
}

impl LogLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "info" => Some(LogLevel::Info),
            "warn" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            "success" => Some(LogLevel::Success),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Success => "success",
        };
        f.write_str(name)
    }
}

/// One persisted activity log entry
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}
