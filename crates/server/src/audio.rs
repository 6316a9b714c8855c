//! Synthesized clip cache
//!
//! Clips produced during a turn are parked here under a fresh id so the
//! client can stream them from `/api/audio/:id` instead of re-decoding
//! the inline base64. The cache is bounded; once full, the oldest clip
//! is dropped first.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use lingotutor_core::SpeechClip;

/// Bounded cache of synthesized clips, evicted in insertion order
pub struct AudioCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

struct CacheInner {
    clips: HashMap<String, SpeechClip>,
    order: VecDeque<String>,
}

impl AudioCache {
    /// Create a cache holding at most `capacity` clips
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                clips: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    /// Store a clip and return its id
    pub fn store(&self, clip: SpeechClip) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let mut inner = self.inner.lock();

        while inner.clips.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.clips.remove(&oldest);
                    tracing::debug!(clip_id = %oldest, "evicted audio clip");
                }
                None => break,
            }
        }

        inner.order.push_back(id.clone());
        inner.clips.insert(id.clone(), clip);
        id
    }

    /// Look up a clip by id
    pub fn get(&self, id: &str) -> Option<SpeechClip> {
        self.inner.lock().clips.get(id).cloned()
    }

    /// Number of clips currently held
    pub fn len(&self) -> usize {
        self.inner.lock().clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
