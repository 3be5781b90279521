//! Command handlers
//!
//! Each handler performs one user action against the shared [`AppState`] and
//! returns the text to print. Commands that manage links require a signed-in
//! demo user; following a link does not.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::DateTime;

use crate::activity::ActivityLog;
use crate::auth::Authenticator;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::database::{KeyValueStore, RedbStore};
use crate::error::AppError;
use crate::model::{ClickData, LogLevel, User};
use crate::random::{RandomSource, ThreadRandom};
use crate::redirect::Redirector;
use crate::service::UrlService;

/// Everything a command needs, wired over one store
pub struct AppState {
    pub service: Arc<UrlService>,
    pub auth: Authenticator,
    pub redirector: Redirector,
}

impl AppState {
    /// Wires the service, authenticator and redirector over one store
    ///
    /// All three share a single activity log, so `logs` shows every event.
    ///
    /// # Arguments
    ///
    /// * `store` - Backing key-value store for links, log and session
    /// * `clock` - Clock shared by every component
    /// * `random` - Randomness for shortcodes, ids and locations
    /// * `config` - Base URL, default user agent and login delay
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
        config: &Config,
    ) -> Self {
        let activity = Arc::new(ActivityLog::new(
            store.clone(),
            clock.clone(),
            random.clone(),
        ));
        let service = Arc::new(UrlService::with_activity(
            store.clone(),
            clock,
            random.clone(),
            activity.clone(),
            config.service_options(),
        ));

        Self {
            auth: Authenticator::new(store, random, activity, config.login_delay),
            redirector: Redirector::new(service.clone()),
            service,
        }
    }

    /// Opens the database named by `config` with the real clock and randomness
    ///
    /// # Arguments
    ///
    /// * `config` - Loaded configuration; `database_url` names the redb file
    ///
    /// # Returns
    ///
    /// * `Ok(AppState)` - State ready for the command handlers
    /// * `Err(AppError::Store)` - The database file could not be opened
    pub fn open(config: &Config) -> Result<Self, AppError> {
        let store = RedbStore::open(&config.database_url)?;
        Ok(Self::new(
            Arc::new(store),
            Arc::new(SystemClock),
            Arc::new(ThreadRandom),
            config,
        ))
    }

    fn require_user(&self) -> Result<User, AppError> {
        self.auth.current_user().ok_or(AppError::NotSignedIn)
    }
}

fn format_time(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// Signs in a demo account after the configured delay
///
/// # Returns
///
/// * `Ok(String)` - Confirmation naming the signed-in user
/// * `Err(AppError::LoginFailed)` - Unknown username or wrong password
pub async fn login(state: &AppState, username: &str, password: &str) -> Result<String, AppError> {
    let user = state
        .auth
        .login(username, password)
        .await
        .ok_or(AppError::LoginFailed)?;
    Ok(format!("Signed in as {} <{}>", user.username, user.email))
}

/// Ends the session, if any
pub fn logout(state: &AppState) -> Result<String, AppError> {
    Ok(match state.auth.logout() {
        Some(user) => format!("Signed out {}", user.username),
        None => "No active session".to_string(),
    })
}

pub fn whoami(state: &AppState) -> Result<String, AppError> {
    let user = state.require_user()?;
    Ok(format!("{} <{}> (session {})", user.username, user.email, user.id))
}

/// Creates a short link for the signed-in user
///
/// # Arguments
///
/// * `state` - Application state
/// * `url` - Target URL to shorten
/// * `expiry_minutes` - Validity window in minutes
/// * `custom_shortcode` - Optional alias; empty means generate one
///
/// # Returns
///
/// * `Ok(String)` - Short URL followed by the record details
/// * `Err(AppError::NotSignedIn)` - No session exists
/// * `Err(AppError::Service)` - Validation or storage failure from `create`
pub fn shorten(
    state: &AppState,
    url: &str,
    expiry_minutes: u32,
    custom_shortcode: Option<&str>,
) -> Result<String, AppError> {
    state.require_user()?;
    let record = state
        .service
        .create(url, expiry_minutes, custom_shortcode)?;

    Ok(format!(
        "{}\n  shortcode: {}\n  target:    {}\n  expires:   {} (valid for {} minutes)",
        record.short_url,
        record.shortcode,
        record.original_url,
        format_time(record.expiry_at),
        record.expiry_minutes,
    ))
}

/// Every link with its status, newest first
pub fn list(state: &AppState) -> Result<String, AppError> {
    state.require_user()?;
    let records = state.service.list_all();
    if records.is_empty() {
        return Ok("No short links found".to_string());
    }

    let now = state.service.now();
    let mut out = String::new();
    for record in &records {
        let _ = writeln!(
            out,
            "{} -> {} [{}] (clicks: {}, expires: {})",
            record.shortcode,
            record.original_url,
            record.status(now),
            record.click_count,
            format_time(record.expiry_at),
        );
    }
    let _ = write!(out, "Total {} short links", records.len());
    Ok(out)
}

/// One link with its click log, newest click first
///
/// Expired links are shown too.
pub fn show(state: &AppState, shortcode: &str) -> Result<String, AppError> {
    state.require_user()?;
    let (record, status) = state
        .service
        .inspect(shortcode)
        .ok_or_else(|| AppError::NotFound(shortcode.to_string()))?;

    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", record.short_url, status);
    let _ = writeln!(out, "  target:  {}", record.original_url);
    let _ = writeln!(out, "  created: {}", format_time(record.created_at));
    let _ = writeln!(out, "  expires: {}", format_time(record.expiry_at));
    let _ = write!(out, "  clicks:  {}", record.click_count);
    for click in record.click_logs.iter().rev() {
        let _ = write!(
            out,
            "\n    {}  {}  {}  {}",
            format_time(click.timestamp),
            click.source,
            click.location,
            click.user_agent,
        );
    }
    Ok(out)
}

/// # Returns
///
/// * `Ok(String)` - Confirmation of the removal
/// * `Err(AppError::NotFound)` - No such shortcode, or the store refused the write
pub fn delete(state: &AppState, shortcode: &str) -> Result<String, AppError> {
    state.require_user()?;
    if state.service.delete(shortcode) {
        Ok(format!("Deleted {shortcode}"))
    } else {
        Err(AppError::NotFound(shortcode.to_string()))
    }
}

pub fn stats(state: &AppState) -> Result<String, AppError> {
    state.require_user()?;
    let stats = state.service.stats();
    Ok(format!(
        "Total URLs:   {}\nActive URLs:  {}\nExpired URLs: {}\nTotal clicks: {}",
        stats.total_urls, stats.active_urls, stats.expired_urls, stats.total_clicks,
    ))
}

/// Follows a link and prints its target
///
/// No session is needed. Repeat visits within one second count once.
///
/// # Returns
///
/// * `Ok(String)` - The original URL
/// * `Err(AppError::NotFound)` - The code is unknown or expired
pub fn open(state: &AppState, shortcode: &str, data: ClickData) -> Result<String, AppError> {
    let record = state
        .redirector
        .follow(shortcode, data)
        .ok_or_else(|| AppError::NotFound(shortcode.to_string()))?;
    Ok(record.original_url)
}

/// Shows or clears the activity log
///
/// # Arguments
///
/// * `state` - Application state
/// * `level` - Optional filter: `info`, `warn`, `error` or `success`
/// * `limit` - Maximum number of entries, newest first
/// * `clear` - Empty the log instead of listing it
///
/// # Returns
///
/// * `Ok(String)` - Rendered entries or a confirmation
/// * `Err(AppError::UnknownLevel)` - `level` is not one of the four names
pub fn logs(
    state: &AppState,
    level: Option<&str>,
    limit: usize,
    clear: bool,
) -> Result<String, AppError> {
    state.require_user()?;
    let activity = state.service.activity();

    if clear {
        activity.clear();
        return Ok("Activity log cleared".to_string());
    }

    let level = level
        .map(|raw| LogLevel::parse(raw).ok_or_else(|| AppError::UnknownLevel(raw.to_string())))
        .transpose()?;

    let entries = activity.entries(level, limit);
    if entries.is_empty() {
        return Ok("No log entries".to_string());
    }

    let lines: Vec<String> = entries
        .iter()
        .map(|entry| {
            format!(
                "{} {:<7} {} {}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.level.to_string(),
                entry.message,
                entry.data,
            )
        })
        .collect();
    Ok(lines.join("\n"))
}
