//! Following a short link
//!
//! The redirect flow resolves a code and counts the visit once. A repeat
//! visit to the same code within the same second is treated as the same
//! redirect and is not counted again.

use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::clicks::ClickDeduper;
use crate::model::{ClickData, UrlRecord};
use crate::service::UrlService;

pub struct Redirector {
    service: Arc<UrlService>,
    deduper: Mutex<ClickDeduper>,
}

impl Redirector {
    pub fn new(service: Arc<UrlService>) -> Self {
        Self {
            service,
            deduper: Mutex::new(ClickDeduper::new()),
        }
    }

    /// Resolves `shortcode` and records the visit
    ///
    /// Returns the record as it was before this click was counted, or `None`
    /// when the code is unknown or expired.
    pub fn follow(&self, shortcode: &str, data: ClickData) -> Option<UrlRecord> {
        let record = self.service.get(shortcode)?;

        if self.record_click(shortcode, data) {
            self.service
                .activity()
                .info("Click recorded for redirect", json!({ "shortcode": shortcode }));
        }

        Some(record)
    }

    /// Records a click unless one was already counted this second
    pub fn record_click(&self, shortcode: &str, data: ClickData) -> bool {
        let now = self.service.now();
        let mut deduper = self.deduper.lock().unwrap_or_else(|e| e.into_inner());

        if deduper.is_duplicate(shortcode, now) {
            self.service.activity().warn(
                "Click already recorded for this shortcode in current session",
                json!({ "shortcode": shortcode }),
            );
            return false;
        }

        let recorded = self.service.record_click(shortcode, data);
        if recorded {
            deduper.remember(shortcode, now);
        }
        recorded
    }
}
