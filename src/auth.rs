//! Demo sign-in
//!
//! There is no real authentication: a fixed list of demo accounts is checked
//! after an artificial delay and the matched user is persisted as the session.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::activity::ActivityLog;
use crate::database::{KeyValueStore, SESSION_KEY};
use crate::model::User;
use crate::random::RandomSource;

struct DemoAccount {
    username: &'static str,
    password: &'static str,
    email: &'static str,
}

static DEMO_ACCOUNTS: [DemoAccount; 3] = [
    DemoAccount {
        username: "admin",
        password: "admin123",
        email: "admin@urlshortener.com",
    },
    DemoAccount {
        username: "user",
        password: "user123",
        email: "user@urlshortener.com",
    },
    DemoAccount {
        username: "demo",
        password: "demo123",
        email: "demo@urlshortener.com",
    },
];

const USER_ID_LENGTH: usize = 9;

pub struct Authenticator {
    store: Arc<dyn KeyValueStore>,
    random: Arc<dyn RandomSource>,
    activity: Arc<ActivityLog>,
    delay: Duration,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        random: Arc<dyn RandomSource>,
        activity: Arc<ActivityLog>,
        delay: Duration,
    ) -> Self {
        Self {
            store,
            random,
            activity,
            delay,
        }
    }

    /// Signs in one of the demo accounts and persists the session
    ///
    /// Returns `None` for unknown credentials or when the session cannot be
    /// saved.
    pub async fn login(&self, username: &str, password: &str) -> Option<User> {
        tokio::time::sleep(self.delay).await;

        let Some(account) = DEMO_ACCOUNTS
            .iter()
            .find(|account| account.username == username && account.password == password)
        else {
            self.activity.warn(
                "Login attempt failed",
                json!({ "username": username, "reason": "Invalid credentials" }),
            );
            return None;
        };

        let user = User {
            id: self
                .random
                .alphanumeric(USER_ID_LENGTH)
                .to_ascii_lowercase(),
            username: account.username.to_string(),
            email: account.email.to_string(),
        };

        let saved = serde_json::to_string(&user)
            .map_err(|err| err.to_string())
            .and_then(|raw| {
                self.store
                    .save(SESSION_KEY, &raw)
                    .map_err(|err| err.to_string())
            });

        if let Err(err) = saved {
            self.activity
                .error("Login error", json!({ "username": username, "error": err }));
            return None;
        }

        self.activity.success(
            "User logged in successfully",
            json!({ "username": user.username, "email": user.email }),
        );
        Some(user)
    }

    /// Restores the persisted session, discarding it if it is unreadable
    pub fn current_user(&self) -> Option<User> {
        let raw = match self.store.load(SESSION_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                self.activity.error(
                    "Failed to restore user session",
                    json!({ "error": err.to_string() }),
                );
                return None;
            }
        };

        match serde_json::from_str::<User>(&raw) {
            Ok(user) => {
                tracing::debug!(username = %user.username, "user session restored");
                Some(user)
            }
            Err(err) => {
                self.activity.error(
                    "Failed to restore user session",
                    json!({ "error": err.to_string() }),
                );
                if let Err(err) = self.store.remove(SESSION_KEY) {
                    tracing::warn!(error = %err, "failed to discard malformed session");
                }
                None
            }
        }
    }

    /// Ends the session; returns who was signed in
    pub fn logout(&self) -> Option<User> {
        let user = self.current_user();
        if let Some(user) = &user {
            self.activity
                .info("User logged out", json!({ "username": user.username }));
        }

        if let Err(err) = self.store.remove(SESSION_KEY) {
            tracing::warn!(error = %err, "failed to clear session");
        }
        user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::database::MemoryStore;
    use crate::random::SeededRandom;

    fn authenticator() -> (Authenticator, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let random = Arc::new(SeededRandom::new(11));
        let activity = Arc::new(ActivityLog::new(
            store.clone(),
            Arc::new(ManualClock::new(0)),
            random.clone(),
        ));
        let auth = Authenticator::new(store.clone(), random, activity, Duration::ZERO);
        (auth, store)
    }

    #[tokio::test]
    async fn demo_account_signs_in() {
        let (auth, _store) = authenticator();
        let user = auth.login("demo", "demo123").await.unwrap();

        assert_eq!(user.username, "demo");
        assert_eq!(user.email, "demo@urlshortener.com");
        assert_eq!(user.id.len(), USER_ID_LENGTH);
        assert!(user
            .id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_eq!(auth.current_user(), Some(user));
    }

    #[tokio::test]
    async fn wrong_password_leaves_no_session() {
        let (auth, _store) = authenticator();
        assert!(auth.login("admin", "wrong").await.is_none());
        assert!(auth.current_user().is_none());
    }

    #[tokio::test]
    async fn unsaveable_session_fails_login() {
        let (auth, store) = authenticator();
        store.reject_writes(true);
        assert!(auth.login("user", "user123").await.is_none());
    }

    #[test]
    fn malformed_session_is_discarded() {
        let (auth, store) = authenticator();
        store.save(SESSION_KEY, "{broken").unwrap();

        assert!(auth.current_user().is_none());
        assert_eq!(store.load(SESSION_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn logout_returns_previous_user() {
        let (auth, _store) = authenticator();
        auth.login("admin", "admin123").await.unwrap();

        let user = auth.logout().unwrap();
        assert_eq!(user.username, "admin");
        assert!(auth.current_user().is_none());
        assert!(auth.logout().is_none());
    }
}
