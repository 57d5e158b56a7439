//! Per-IP, per-route rate limiting, generalized from the teacher's single
//! fixed-window limiter (`rest/submit.rs::check_rate_limit`) into one
//! keyed by route so upload's much higher ceiling doesn't share a bucket
//! with the 100/minute routes.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

pub const GETJOBID_PER_MINUTE: usize = 100;
pub const ANALYZE_PER_MINUTE: usize = 100;
pub const STATUS_PER_MINUTE: usize = 100;
pub const RESULTS_PER_MINUTE: usize = 100;
pub const UPLOAD_PER_SECOND: usize = 1000;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Route {
    GetJobId,
    Upload,
    Analyze,
    Status,
    Results,
}

impl Route {
    fn window(&self) -> (Duration, usize) {
        match self {
            Route::GetJobId => (Duration::from_secs(60), GETJOBID_PER_MINUTE),
            Route::Upload => (Duration::from_secs(1), UPLOAD_PER_SECOND),
            Route::Analyze => (Duration::from_secs(60), ANALYZE_PER_MINUTE),
            Route::Status => (Duration::from_secs(60), STATUS_PER_MINUTE),
            Route::Results => (Duration::from_secs(60), RESULTS_PER_MINUTE),
        }
    }
}

/// Check and record one request. Returns true if the request is allowed.
/// Prunes expired entries from this bucket first.
pub fn check_rate_limit(entries: &mut Vec<Instant>, now: Instant, route: Route) -> bool {
    let (window, max) = route.window();
    let cutoff = now - window;
    entries.retain(|t| *t > cutoff);
    if entries.len() >= max {
        return false;
    }
    entries.push(now);
    true
}

pub type RateLimiter = std::collections::HashMap<(IpAddr, Route), Vec<Instant>>;

/// Drop buckets that are now empty, so a rate limiter under sustained
/// traffic from many distinct IPs doesn't grow without bound.
pub fn prune_empty_entries(limiter: &mut HashMap<(IpAddr, Route), Vec<Instant>>) {
    limiter.retain(|_, entries| !entries.is_empty());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_requests_under_the_limit() {
        let mut entries = Vec::new();
        let now = Instant::now();
        for _ in 0..GETJOBID_PER_MINUTE {
            assert!(check_rate_limit(&mut entries, now, Route::GetJobId));
        }
    }

    #[test]
    fn rejects_requests_over_the_limit() {
        let mut entries = Vec::new();
        let now = Instant::now();
        for _ in 0..GETJOBID_PER_MINUTE {
            assert!(check_rate_limit(&mut entries, now, Route::GetJobId));
        }
        assert!(!check_rate_limit(&mut entries, now, Route::GetJobId));
    }

    #[test]
    fn upload_bucket_has_its_own_higher_ceiling() {
        let mut entries = Vec::new();
        let now = Instant::now();
        for _ in 0..UPLOAD_PER_SECOND {
            assert!(check_rate_limit(&mut entries, now, Route::Upload));
        }
        assert!(!check_rate_limit(&mut entries, now, Route::Upload));
    }
}
