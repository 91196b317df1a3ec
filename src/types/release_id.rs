// ABOUTME: Ordered release identifiers derived from wall-clock time.
// ABOUTME: Fixed-width rendering makes lexicographic order equal chronological order.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Rendered form: `YYYYMMDDHHMMSSmmm`, UTC, millisecond granularity.
const FORMAT: &str = "%Y%m%d%H%M%S%3f";
const RENDERED_LEN: usize = 17;

/// Last issued timestamp, used to keep allocation monotonic when the
/// clock has not advanced between two allocations.
static LAST_ISSUED_MS: AtomicU64 = AtomicU64::new(0);

/// Identifier of a single release directory under `releases/`.
///
/// Release ids are UTC timestamps at millisecond granularity. Because the
/// rendered form is fixed-width and zero-padded, sorting the rendered strings
/// lexicographically yields the same order as sorting by creation time.
/// Cleanup and rollback target selection both rely on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseId {
    epoch_ms: u64,
}

#[derive(Debug, Error)]
pub enum ParseReleaseIdError {
    #[error("release id must be {RENDERED_LEN} digits, got {0:?}")]
    Malformed(String),

    #[error("release id {0:?} is not a valid timestamp")]
    InvalidTimestamp(String),
}

impl ReleaseId {
    /// Allocate a new release id from the wall clock.
    ///
    /// Ids are strictly increasing within a process: if the clock reads the
    /// same millisecond (or went backwards), the id is bumped one millisecond
    /// past the last issued one.
    pub fn allocate() -> Self {
        let now_ms = Utc::now().timestamp_millis().max(0) as u64;
        let issued = LAST_ISSUED_MS
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now_ms.max(last + 1))
            })
            .map(|last| now_ms.max(last + 1))
            .unwrap_or(now_ms);
        Self { epoch_ms: issued }
    }

    /// Construct from a timestamp, truncated to millisecond granularity.
    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        Self {
            epoch_ms: ts.timestamp_millis().max(0) as u64,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.epoch_ms as i64)
            .single()
            .unwrap_or_default()
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.timestamp().format(FORMAT))
    }
}

impl FromStr for ReleaseId {
    type Err = ParseReleaseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != RENDERED_LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseReleaseIdError::Malformed(s.to_string()));
        }

        let naive = NaiveDateTime::parse_from_str(s, FORMAT)
            .map_err(|_| ParseReleaseIdError::InvalidTimestamp(s.to_string()))?;

        Ok(Self::from_timestamp(Utc.from_utc_datetime(&naive)))
    }
}
