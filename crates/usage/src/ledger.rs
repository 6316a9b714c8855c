//! In-memory usage ledger

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use lingotutor_core::{next_utc_midnight, Result, UsageGate, UsageRecord};

/// Usage ledger keyed by client IP.
///
/// Counters are per UTC day. Crossing the daily token limit marks the
/// record blocked until the next UTC midnight. A record from an earlier
/// day is dead weight: reads treat it as unblocked and the next write
/// replaces it with a fresh one, so blocks and counters clear themselves
/// at day rollover.
///
/// Trait methods run against `Utc::now()`; the `*_at` variants take the
/// clock as a parameter so rollover behavior is testable.
pub struct InMemoryUsageLedger {
    records: DashMap<String, UsageRecord>,
    daily_token_limit: u32,
}

impl InMemoryUsageLedger {
    /// Create a ledger with the given daily token limit
    pub fn new(daily_token_limit: u32) -> Self {
        Self {
            records: DashMap::new(),
            daily_token_limit,
        }
    }

    /// Whether `ip` is blocked at the given instant
    pub fn is_blocked_at(&self, ip: &str, now: DateTime<Utc>) -> bool {
        self.records
            .get(ip)
            .map(|record| record.day == now.date_naive() && record.is_blocked_at(now))
            .unwrap_or(false)
    }

    /// Charge tokens to `ip` at the given instant and return the updated
    /// record
    pub fn record_usage_at(&self, ip: &str, tokens: u32, now: DateTime<Utc>) -> UsageRecord {
        let today = now.date_naive();
        let mut entry = self
            .records
            .entry(ip.to_string())
            .or_insert_with(|| UsageRecord::new(ip, today));

        let record = entry.value_mut();
        if record.day != today {
            *record = UsageRecord::new(ip, today);
        }

        record.tokens_used = record.tokens_used.saturating_add(tokens);
        record.requests += 1;
        if record.tokens_used >= self.daily_token_limit && !record.is_blocked {
            record.is_blocked = true;
            record.blocked_until = Some(next_utc_midnight(now));
            tracing::info!(
                ip,
                tokens_used = record.tokens_used,
                limit = self.daily_token_limit,
                "client crossed daily token limit"
            );
        }

        record.clone()
    }
}

#[async_trait]
impl UsageGate for InMemoryUsageLedger {
    async fn is_blocked(&self, ip: &str) -> Result<bool> {
        Ok(self.is_blocked_at(ip, Utc::now()))
    }

    async fn record_usage(&self, ip: &str, tokens: u32) -> Result<UsageRecord> {
        Ok(self.record_usage_at(ip, tokens, Utc::now()))
    }
}

/// Gate that never blocks, for deployments with limiting disabled.
///
/// Usage is still tallied per call so logs stay meaningful, but nothing
/// is persisted.
pub struct AllowAllGate;

#[async_trait]
impl UsageGate for AllowAllGate {
    async fn is_blocked(&self, _ip: &str) -> Result<bool> {
        Ok(false)
    }

    async fn record_usage(&self, ip: &str, tokens: u32) -> Result<UsageRecord> {
        let mut record = UsageRecord::new(ip, Utc::now().date_naive());
        record.tokens_used = tokens;
        record.requests = 1;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_under_limit_stays_unblocked() {
        let ledger = InMemoryUsageLedger::new(1000);
        let record = ledger.record_usage_at("10.0.0.1", 400, noon());
        assert_eq!(record.tokens_used, 400);
        assert_eq!(record.requests, 1);
        assert!(!record.is_blocked);
        assert!(!ledger.is_blocked_at("10.0.0.1", noon()));
    }

    #[test]
    fn test_crossing_limit_blocks_until_next_midnight() {
        let ledger = InMemoryUsageLedger::new(1000);
        ledger.record_usage_at("10.0.0.1", 600, noon());
        let record = ledger.record_usage_at("10.0.0.1", 600, noon());

        assert_eq!(record.tokens_used, 1200);
        assert!(record.is_blocked);
        assert_eq!(
            record.blocked_until,
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap())
        );
        assert!(ledger.is_blocked_at("10.0.0.1", noon()));
    }

    #[test]
    fn test_block_clears_at_day_rollover() {
        let ledger = InMemoryUsageLedger::new(100);
        ledger.record_usage_at("10.0.0.1", 150, noon());
        assert!(ledger.is_blocked_at("10.0.0.1", noon()));

        let next_day = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 1).unwrap();
        assert!(!ledger.is_blocked_at("10.0.0.1", next_day));

        let record = ledger.record_usage_at("10.0.0.1", 10, next_day);
        assert_eq!(record.tokens_used, 10);
        assert_eq!(record.requests, 1);
        assert!(!record.is_blocked);
    }

    #[test]
    fn test_ips_are_independent() {
        let ledger = InMemoryUsageLedger::new(100);
        ledger.record_usage_at("10.0.0.1", 150, noon());

        assert!(ledger.is_blocked_at("10.0.0.1", noon()));
        assert!(!ledger.is_blocked_at("10.0.0.2", noon()));
    }

    #[test]
    fn test_exact_limit_blocks() {
        let ledger = InMemoryUsageLedger::new(100);
        let record = ledger.record_usage_at("10.0.0.1", 100, noon());
        assert!(record.is_blocked);
    }

    #[tokio::test]
    async fn test_allow_all_never_blocks() {
        let gate = AllowAllGate;
        assert!(!gate.is_blocked("10.0.0.1").await.unwrap());
        let record = gate.record_usage("10.0.0.1", 1_000_000).await.unwrap();
        assert!(!record.is_blocked);
    }
}
