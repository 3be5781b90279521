//! Shortcode registry: create, resolve, delete and list link records

use serde_json::json;
use url::Url;

use crate::error::ServiceError;
use crate::model::{LinkStatus, UrlMap, UrlRecord};
use crate::random::RandomSource;
use crate::service::UrlService;

/// Validity window used when the caller does not pick one
pub const DEFAULT_EXPIRY_MINUTES: u32 = 30;

/// Longest validity window accepted: one year
pub const MAX_EXPIRY_MINUTES: u32 = 525_600;

/// Length of system-generated shortcodes
pub const GENERATED_LENGTH: usize = 6;

const CUSTOM_LENGTH: std::ops::RangeInclusive<usize> = 3..=20;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Accepts absolute `http`/`https` URLs only
pub fn validate_url(raw: &str) -> Result<Url, ServiceError> {
    let parsed = Url::parse(raw).map_err(|err| ServiceError::InvalidUrl(format!("{raw}: {err}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ServiceError::InvalidUrl(format!(
            "{raw}: scheme {other} is not allowed"
        ))),
    }
}

/// Custom shortcodes must match `^[A-Za-z0-9]{3,20}$`
pub fn validate_shortcode(code: &str) -> Result<(), ServiceError> {
    if CUSTOM_LENGTH.contains(&code.len()) && code.bytes().all(|b| b.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(ServiceError::InvalidShortcode(code.to_string()))
    }
}

/// Draws codes until one is not present in `links`
///
/// There is no retry bound; with 62^6 codes a collision is rare and a long
/// run of them only happens near exhaustion of the keyspace.
pub fn generate_unused(links: &UrlMap, random: &dyn RandomSource) -> String {
    loop {
        let candidate = random.alphanumeric(GENERATED_LENGTH);
        if !links.contains_key(&candidate) {
            return candidate;
        }
    }
}

/// Adds a new record to the snapshot
///
/// `custom_shortcode` must already be format-checked; this only enforces
/// uniqueness, which includes expired records that were never deleted.
pub(crate) fn insert_link(
    mut links: UrlMap,
    original_url: &str,
    expiry_minutes: u32,
    custom_shortcode: Option<&str>,
    now: i64,
    random: &dyn RandomSource,
    base_url: &str,
) -> Result<(UrlMap, UrlRecord), ServiceError> {
    let shortcode = match custom_shortcode {
        Some(code) if links.contains_key(code) => {
            return Err(ServiceError::ShortcodeTaken(code.to_string()));
        }
        Some(code) => code.to_string(),
        None => generate_unused(&links, random),
    };

    let record = UrlRecord {
        id: now,
        original_url: original_url.to_string(),
        short_url: format!("{}/{}", base_url.trim_end_matches('/'), shortcode),
        shortcode: shortcode.clone(),
        created_at: now,
        expiry_at: now + i64::from(expiry_minutes) * MILLIS_PER_MINUTE,
        expiry_minutes,
        click_count: 0,
        click_logs: Vec::new(),
    };

    links.insert(shortcode, record.clone());
    Ok((links, record))
}

/// Removes a record from the snapshot regardless of its expiry
pub(crate) fn remove_link(
    mut links: UrlMap,
    shortcode: &str,
) -> Result<(UrlMap, UrlRecord), ServiceError> {
    match links.remove(shortcode) {
        Some(record) => Ok((links, record)),
        None => Err(ServiceError::NotFound(shortcode.to_string())),
    }
}

/// Every record, newest first
///
/// The sort is stable, so records created in the same millisecond keep
/// shortcode order.
pub fn sorted_newest_first(links: UrlMap) -> Vec<UrlRecord> {
    let mut records: Vec<UrlRecord> = links.into_values().collect();
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records
}

impl UrlService {
    /// Creates a short link for `original_url`
    ///
    /// An empty `custom_shortcode` counts as no custom code. Without one, a
    /// random six character code is generated.
    ///
    /// # Arguments
    ///
    /// * `original_url` - Absolute `http`/`https` URL to shorten
    /// * `expiry_minutes` - Validity window, from 1 to [`MAX_EXPIRY_MINUTES`]
    /// * `custom_shortcode` - Optional alias, alphanumeric and 3-20 characters
    ///
    /// # Returns
    ///
    /// * `Ok(UrlRecord)` - The stored record with no clicks yet
    /// * `Err(ServiceError::InvalidUrl)` - The URL failed validation
    /// * `Err(ServiceError::InvalidExpiry)` - `expiry_minutes` is out of range
    /// * `Err(ServiceError::InvalidShortcode)` - The custom alias is malformed
    /// * `Err(ServiceError::ShortcodeTaken)` - The custom alias already exists
    /// * `Err(ServiceError::StorageWriteFailed)` - The store refused the write
    pub fn create(
        &self,
        original_url: &str,
        expiry_minutes: u32,
        custom_shortcode: Option<&str>,
    ) -> Result<UrlRecord, ServiceError> {
        let custom_shortcode = custom_shortcode.filter(|code| !code.is_empty());

        if let Err(err) = validate_url(original_url) {
            self.activity
                .error("Invalid URL provided", json!({ "originalUrl": original_url }));
            return Err(err);
        }

        if !(1..=MAX_EXPIRY_MINUTES).contains(&expiry_minutes) {
            self.activity
                .error("Invalid expiry provided", json!({ "expiryMinutes": expiry_minutes }));
            return Err(ServiceError::InvalidExpiry);
        }

        if let Some(code) = custom_shortcode {
            if let Err(err) = validate_shortcode(code) {
                self.activity
                    .error("Invalid shortcode format", json!({ "shortcode": code }));
                return Err(err);
            }
        }

        let now = self.now();
        let result = self.transact(|links| {
            insert_link(
                links,
                original_url,
                expiry_minutes,
                custom_shortcode,
                now,
                self.random.as_ref(),
                &self.options.base_url,
            )
        });

        match &result {
            Ok(record) => {
                self.activity.success(
                    "URL shortened successfully",
                    json!({
                        "shortcode": record.shortcode,
                        "originalUrl": record.original_url,
                        "expiryMinutes": record.expiry_minutes,
                    }),
                );
            }
            Err(ServiceError::ShortcodeTaken(code)) => {
                self.activity
                    .error("Shortcode already exists", json!({ "shortcode": code }));
            }
            Err(_) => {}
        }

        result
    }

    /// Resolves an active record; absent and expired codes both yield `None`
    pub fn get(&self, shortcode: &str) -> Option<UrlRecord> {
        let mut links = self.snapshot();
        let Some(record) = links.remove(shortcode) else {
            self.activity
                .warn("Shortcode not found", json!({ "shortcode": shortcode }));
            return None;
        };

        if record.is_expired(self.now()) {
            self.activity.warn(
                "URL has expired",
                json!({ "shortcode": shortcode, "expiryAt": record.expiry_at }),
            );
            return None;
        }

        Some(record)
    }

    /// Reads a record whether or not it has expired, with its current status
    pub fn inspect(&self, shortcode: &str) -> Option<(UrlRecord, LinkStatus)> {
        let now = self.now();
        self.snapshot().remove(shortcode).map(|record| {
            let status = record.status(now);
            (record, status)
        })
    }

    /// Removes a record; `false` when it does not exist or cannot be saved
    pub fn delete(&self, shortcode: &str) -> bool {
        match self.transact(|links| remove_link(links, shortcode)) {
            Ok(_) => {
                self.activity
                    .success("URL deleted successfully", json!({ "shortcode": shortcode }));
                true
            }
            Err(ServiceError::NotFound(_)) => {
                self.activity.warn(
                    "Cannot delete: shortcode not found",
                    json!({ "shortcode": shortcode }),
                );
                false
            }
            Err(_) => {
                self.activity
                    .error("Failed to delete URL", json!({ "shortcode": shortcode }));
                false
            }
        }
    }

    /// All records, active and expired, newest first
    pub fn list_all(&self) -> Vec<UrlRecord> {
        sorted_newest_first(self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Hands out pre-scripted codes in order
    struct ScriptedRandom {
        codes: Mutex<VecDeque<&'static str>>,
    }

    impl ScriptedRandom {
        fn new(codes: &[&'static str]) -> Self {
            Self {
                codes: Mutex::new(codes.iter().copied().collect()),
            }
        }
    }

    impl RandomSource for ScriptedRandom {
        fn alphanumeric(&self, _len: usize) -> String {
            self.codes
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted")
                .to_string()
        }

        fn index(&self, _bound: usize) -> usize {
            0
        }
    }

    fn record(code: &str, created_at: i64) -> UrlRecord {
        UrlRecord {
            id: created_at,
            original_url: "https://example.com".to_string(),
            shortcode: code.to_string(),
            short_url: format!("http://localhost:3000/{code}"),
            created_at,
            expiry_at: created_at + 60_000,
            expiry_minutes: 1,
            click_count: 0,
            click_logs: Vec::new(),
        }
    }

    #[test]
    fn url_validation_only_allows_http_and_https() {
        assert!(validate_url("https://example.com/path?q=1").is_ok());
        assert!(validate_url("http://localhost:8080").is_ok());
        assert!(matches!(
            validate_url("ftp://example.com"),
            Err(ServiceError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("javascript:alert(1)"),
            Err(ServiceError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("example.com"),
            Err(ServiceError::InvalidUrl(_))
        ));
    }

    #[test]
    fn shortcode_validation_bounds() {
        assert!(validate_shortcode("abc").is_ok());
        assert!(validate_shortcode("A1b2C3d4E5f6G7h8I9j0").is_ok());
        assert!(validate_shortcode("ab").is_err());
        assert!(validate_shortcode("A1b2C3d4E5f6G7h8I9j0x").is_err());
        assert!(validate_shortcode("my-code").is_err());
        assert!(validate_shortcode("caf\u{e9}s").is_err());
    }

    #[test]
    fn generation_retries_on_collision() {
        let mut links = UrlMap::new();
        links.insert("aaaaaa".to_string(), record("aaaaaa", 1));
        links.insert("bbbbbb".to_string(), record("bbbbbb", 2));

        let random = ScriptedRandom::new(&["aaaaaa", "bbbbbb", "cccccc"]);
        assert_eq!(generate_unused(&links, &random), "cccccc");
    }

    #[test]
    fn insert_builds_record_with_expiry() {
        let random = ScriptedRandom::new(&["Zx9Qw1"]);
        let (links, created) = insert_link(
            UrlMap::new(),
            "https://example.com",
            30,
            None,
            1_000,
            &random,
            "http://sho.rt/",
        )
        .unwrap();

        assert_eq!(created.shortcode, "Zx9Qw1");
        assert_eq!(created.short_url, "http://sho.rt/Zx9Qw1");
        assert_eq!(created.expiry_at - created.created_at, 30 * 60_000);
        assert_eq!(created.id, 1_000);
        assert_eq!(links.get("Zx9Qw1"), Some(&created));
    }

    #[test]
    fn insert_rejects_taken_custom_code() {
        let mut links = UrlMap::new();
        links.insert("mycode".to_string(), record("mycode", 1));
        let random = ScriptedRandom::new(&[]);

        let err = insert_link(links, "https://b.com", 30, Some("mycode"), 5, &random, "")
            .unwrap_err();
        assert_eq!(err, ServiceError::ShortcodeTaken("mycode".to_string()));
    }

    #[test]
    fn remove_reports_missing_code() {
        let err = remove_link(UrlMap::new(), "nope").unwrap_err();
        assert_eq!(err, ServiceError::NotFound("nope".to_string()));
    }

    #[test]
    fn listing_is_newest_first_and_stable() {
        let mut links = UrlMap::new();
        links.insert("old".to_string(), record("old", 1));
        links.insert("tieB".to_string(), record("tieB", 5));
        links.insert("tieA".to_string(), record("tieA", 5));
        links.insert("new".to_string(), record("new", 9));

        let codes: Vec<_> = sorted_newest_first(links)
            .into_iter()
            .map(|r| r.shortcode)
            .collect();
        assert_eq!(codes, ["new", "tieA", "tieB", "old"]);
    }
}
