//! Runtime configuration
//!
//! Values come from the environment (after `.env` is loaded in `main`).
//!
//! - `DATABASE_URL` - Path to the database file (default: "snaplink.db")
//! - `BASE_URL` - Prefix of generated short URLs (default: "http://localhost:3000")
//! - `LOGIN_DELAY_MS` - Artificial sign-in delay (default: 1000)
//! - `DEFAULT_USER_AGENT` - Recorded for clicks without a user agent
//! - `RUST_LOG` - Tracing filter (default: "snaplink=info")

use std::env;
use std::time::Duration;

use crate::service::ServiceOptions;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub base_url: String,
    pub login_delay: Duration,
    pub default_user_agent: String,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        let options = ServiceOptions::default();
        Self {
            database_url: "snaplink.db".to_string(),
            base_url: options.base_url,
            login_delay: Duration::from_millis(1000),
            default_user_agent: options.default_user_agent,
            log_filter: "snaplink=info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let login_delay = env::var("LOGIN_DELAY_MS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.login_delay);

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            base_url: env::var("BASE_URL").unwrap_or(defaults.base_url),
            login_delay,
            default_user_agent: env::var("DEFAULT_USER_AGENT")
                .unwrap_or(defaults.default_user_agent),
            log_filter: env::var("RUST_LOG").unwrap_or(defaults.log_filter),
        }
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            default_user_agent: self.default_user_agent.clone(),
        }
    }
}
