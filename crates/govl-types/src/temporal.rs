use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Hybrid timestamp stamped on every entry at append time.
///
/// Combines wall-clock milliseconds with a logical counter. The store always
/// derives the next stamp with [`EntryTimestamp::next_after`], so timestamps
/// keep increasing along the chain even when the wall clock stalls or steps
/// backwards.
///
/// Ordering: `unix_ms` → `logical`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntryTimestamp {
    /// Wall-clock milliseconds since UNIX epoch.
    pub unix_ms: u64,
    /// Logical counter for entries at the same millisecond.
    pub logical: u32,
}

impl EntryTimestamp {
    pub const fn new(unix_ms: u64, logical: u32) -> Self {
        Self { unix_ms, logical }
    }

    /// Stamp for the current wall-clock time.
    pub fn now() -> Self {
        let unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self { unix_ms, logical: 0 }
    }

    /// The stamp for an entry appended after `previous` at wall time `now`.
    ///
    /// Strictly greater than `previous`.
    pub fn next_after(previous: Option<&Self>, now: Self) -> Self {
        match previous {
            None => now,
            Some(prev) if now.unix_ms > prev.unix_ms => Self::new(now.unix_ms, 0),
            Some(prev) => Self::new(prev.unix_ms, prev.logical.saturating_add(1)),
        }
    }
}

impl fmt::Display for EntryTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.unix_ms, self.logical)
    }
}
