//! Usage accounting types

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Daily usage tallied for one client IP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Client IP the record belongs to
    pub ip: String,
    /// UTC day the counters cover
    pub day: NaiveDate,
    /// Tokens consumed so far today
    pub tokens_used: u32,
    /// Completions served so far today
    pub requests: u32,
    /// Whether the daily limit has been crossed
    pub is_blocked: bool,
    /// When the block lifts, for records over the limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_until: Option<DateTime<Utc>>,
}

impl UsageRecord {
    /// A fresh record for an IP on a given day
    pub fn new(ip: impl Into<String>, day: NaiveDate) -> Self {
        Self {
            ip: ip.into(),
            day,
            tokens_used: 0,
            requests: 0,
            is_blocked: false,
            blocked_until: None,
        }
    }

    /// True while the block is in force at `now`
    pub fn is_blocked_at(&self, now: DateTime<Utc>) -> bool {
        self.is_blocked && matches!(self.blocked_until, Some(until) if now < until)
    }
}

/// The instant the current UTC day rolls over.
///
/// Daily limits lift here, so refusals can tell the client when to
/// come back.
pub fn next_utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive() + Duration::days(1);
    DateTime::from_naive_utc_and_offset(tomorrow.and_time(NaiveTime::MIN), Utc)
}
