use std::time::{SystemTime, UNIX_EPOCH};

use crate::TimeSource;

/// Reads `SystemTime::now()` on every call.
///
/// The clock may step backwards (NTP corrections); the generator detects that
/// and refuses to issue ids until time catches up.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }
}
