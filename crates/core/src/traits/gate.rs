//! Usage gate trait

use async_trait::async_trait;

use crate::error::Result;
use crate::usage::UsageRecord;

/// Per-client usage limiter.
///
/// The tutor consults the gate before spending model tokens and reports
/// consumption after each completion.
#[async_trait]
pub trait UsageGate: Send + Sync + 'static {
    /// True when the client has exhausted its allowance
    async fn is_blocked(&self, ip: &str) -> Result<bool>;

    /// Charge tokens for one completion and return the updated record
    async fn record_usage(&self, ip: &str, tokens: u32) -> Result<UsageRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    struct BudgetGate {
        limit: u32,
        spent: Mutex<u32>,
    }

    #[async_trait]
    impl UsageGate for BudgetGate {
        async fn is_blocked(&self, _ip: &str) -> Result<bool> {
            Ok(*self.spent.lock().unwrap() >= self.limit)
        }

        async fn record_usage(&self, ip: &str, tokens: u32) -> Result<UsageRecord> {
            let mut spent = self.spent.lock().unwrap();
            *spent += tokens;

            let mut record = UsageRecord::new(ip, Utc::now().date_naive());
            record.tokens_used = *spent;
            record.requests = 1;
            record.is_blocked = *spent >= self.limit;
            Ok(record)
        }
    }

    #[tokio::test]
    async fn test_gate_blocks_after_limit() {
        let gate = BudgetGate {
            limit: 100,
            spent: Mutex::new(0),
        };

        assert!(!gate.is_blocked("10.0.0.1").await.unwrap());
        let record = gate.record_usage("10.0.0.1", 150).await.unwrap();
        assert!(record.is_blocked);
        assert!(gate.is_blocked("10.0.0.1").await.unwrap());
    }
}
