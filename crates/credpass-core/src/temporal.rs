//! # Temporal Types
//!
//! UTC-only timestamp type. Ledger dates are integer seconds since the Unix
//! epoch; the evaluation instant handed to status resolution is a
//! [`Timestamp`] with millisecond precision.
//!
//! Nothing in the engine reads the wall clock directly. "Now" is always an
//! explicit argument, supplied by a clock at the service boundary.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A UTC instant.
///
/// Serializes to RFC 3339 with a `Z` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Create a timestamp from whole seconds since the epoch.
    pub fn from_epoch_secs(secs: u64) -> Result<Self, ValidationError> {
        let signed = i64::try_from(secs).map_err(|_| ValidationError::InvalidTimestamp {
            value: secs.to_string(),
            reason: "exceeds i64 range".into(),
        })?;
        Utc.timestamp_opt(signed, 0)
            .single()
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidTimestamp {
                value: secs.to_string(),
                reason: "outside representable date range".into(),
            })
    }

    /// Create a timestamp from milliseconds since the epoch.
    pub fn from_epoch_millis(millis: i64) -> Result<Self, ValidationError> {
        Utc.timestamp_millis_opt(millis)
            .single()
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidTimestamp {
                value: millis.to_string(),
                reason: "outside representable date range".into(),
            })
    }

    /// Access the underlying `chrono::DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Whole seconds since the epoch, clamped at zero for pre-epoch instants.
    pub fn epoch_secs(&self) -> u64 {
        u64::try_from(self.0.timestamp()).unwrap_or(0)
    }

    /// Milliseconds since the epoch.
    pub fn epoch_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Calendar date, `YYYY-MM-DD`.
    pub fn to_date_string(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S%.3fZ"))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}
