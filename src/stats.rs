//! Summary counts over the registry

use crate::model::{UrlMap, UrlStats};
use crate::service::UrlService;

/// Counts records and clicks in `links` as of `now`
pub fn compute(links: &UrlMap, now: i64) -> UrlStats {
    let total_urls = links.len();
    let active_urls = links.values().filter(|r| !r.is_expired(now)).count();

    UrlStats {
        total_urls,
        active_urls,
        expired_urls: total_urls - active_urls,
        total_clicks: links.values().map(|r| r.click_count).sum(),
    }
}

impl UrlService {
    /// Fresh totals from a full scan; nothing is cached
    pub fn stats(&self) -> UrlStats {
        compute(&self.snapshot(), self.now())
    }
}
