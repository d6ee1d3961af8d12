use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};

/// Bounded in-process cache of summaries keyed by prompt hash
///
/// When full, the oldest tenth of the entries (at least one) is evicted.
#[derive(Debug)]
pub struct SummaryCache {
    capacity: usize,
    entries: HashMap<String, String>,
    order: VecDeque<String>,
}

impl SummaryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: String, summary: String) {
        if self.capacity == 0 {
            return;
        }
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = summary;
            return;
        }

        if self.entries.len() >= self.capacity {
            let evict = (self.capacity / 10).max(1);
            for _ in 0..evict {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, summary);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Hex SHA-256 of a prompt, used as the cache key
pub fn cache_key(prompt: &str) -> String {
    hex::encode(Sha256::digest(prompt.as_bytes()))
}
