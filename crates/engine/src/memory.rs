//! In-memory per-thread transcript store

use async_trait::async_trait;
use dashmap::DashMap;

use lingotutor_core::{MemoryStore, Result};

/// Transcript entry for one completed exchange
pub fn exchange_entry(user: &str, ai: &str) -> String {
    format!("User: {user}\nAI: {ai}\n")
}

/// Keyed transcript store backed by a concurrent map.
///
/// Appends take the shard lock for just the one thread's entry, so turns
/// on different threads never contend and concurrent appends to one
/// thread are whole-entry, never interleaved.
#[derive(Default)]
pub struct InMemoryMemoryStore {
    threads: DashMap<String, String>,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of threads holding a transcript
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn append(&self, thread_id: &str, entry: &str) -> Result<()> {
        self.threads
            .entry(thread_id.to_string())
            .or_default()
            .push_str(entry);
        Ok(())
    }

    async fn read(&self, thread_id: &str) -> Result<String> {
        Ok(self
            .threads
            .get(thread_id)
            .map(|transcript| transcript.clone())
            .unwrap_or_default())
    }
}
