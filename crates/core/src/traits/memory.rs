//! Conversation memory trait

use async_trait::async_trait;

use crate::error::Result;

/// Per-thread conversation memory.
///
/// Entries are opaque pre-formatted strings; `read` returns them joined
/// in append order so the transcript can be dropped into a prompt as-is.
#[async_trait]
pub trait MemoryStore: Send + Sync + 'static {
    /// Append one entry to a thread, creating the thread if needed
    async fn append(&self, thread_id: &str, entry: &str) -> Result<()>;

    /// Read the full transcript of a thread in append order.
    ///
    /// Unknown threads read as an empty transcript, not an error.
    async fn read(&self, thread_id: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct VecMemory {
        threads: Mutex<HashMap<String, Vec<String>>>,
    }

    impl VecMemory {
        fn new() -> Self {
            Self {
                threads: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl MemoryStore for VecMemory {
        async fn append(&self, thread_id: &str, entry: &str) -> Result<()> {
            self.threads
                .lock()
                .unwrap()
                .entry(thread_id.to_string())
                .or_default()
                .push(entry.to_string());
            Ok(())
        }

        async fn read(&self, thread_id: &str) -> Result<String> {
            Ok(self
                .threads
                .lock()
                .unwrap()
                .get(thread_id)
                .map(|entries| entries.concat())
                .unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn test_append_order_is_preserved() {
        let memory = VecMemory::new();
        memory.append("t1", "User: hi\nAI: hello\n").await.unwrap();
        memory.append("t1", "User: bye\nAI: tschuss\n").await.unwrap();

        let transcript = memory.read("t1").await.unwrap();
        assert_eq!(transcript, "User: hi\nAI: hello\nUser: bye\nAI: tschuss\n");
    }

    #[tokio::test]
    async fn test_unknown_thread_reads_empty() {
        let memory = VecMemory::new();
        assert_eq!(memory.read("missing").await.unwrap(), "");
    }
}
