use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wall-clock instant in milliseconds since the Unix epoch.
/// Same unit as the `tmi-sent-ts` tag chat servers stamp on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    pub millis: u64,
}

pub const TICK_MS: u64 = 100;

impl Timestamp {
    pub fn from_millis(millis: u64) -> Self {
        Timestamp { millis }
    }

    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Timestamp { millis }
    }

    pub fn plus(&self, d: Duration) -> Self {
        Timestamp { millis: self.millis.saturating_add(d.as_millis() as u64) }
    }

    pub fn minus(&self, d: Duration) -> Self {
        Timestamp { millis: self.millis.saturating_sub(d.as_millis() as u64) }
    }

    /// Zero when `earlier` is actually later (clock skew between chat server and host).
    pub fn elapsed_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.millis.saturating_sub(earlier.millis))
    }
}
