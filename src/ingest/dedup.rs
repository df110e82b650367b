// src/ingest/dedup.rs
use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded history of already reported descriptions.
/// Eviction is FIFO by insertion order; a repeated hit does not refresh an entry.
#[derive(Debug, Clone)]
pub struct DedupCache {
    seen: VecDeque<String>,
    cap: usize,
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl DedupCache {
    /// `cap` of 0 is treated as 1.
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            seen: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Returns true if `description` is new, recording it as a side effect.
    pub fn admit(&mut self, description: &str) -> bool {
        if self.contains(description) {
            return false;
        }
        self.push(description);
        true
    }

    /// Record without the admission test (first-cycle seeding).
    pub fn record(&mut self, description: &str) {
        if !self.contains(description) {
            self.push(description);
        }
    }

    pub fn contains(&self, description: &str) -> bool {
        self.seen.iter().any(|d| d == description)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    fn push(&mut self, description: &str) {
        self.seen.push_back(description.to_string());
        while self.seen.len() > self.cap {
            self.seen.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_admit_is_rejected() {
        let mut c = DedupCache::default();
        assert!(c.admit("a"));
        assert!(!c.admit("a"));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn oldest_entry_is_evicted_first() {
        let mut c = DedupCache::with_capacity(3);
        for d in ["a", "b", "c"] {
            assert!(c.admit(d));
        }
        // hit on "a" must not refresh it
        assert!(!c.admit("a"));
        assert!(c.admit("d"));
        assert!(!c.contains("a"));
        assert!(c.contains("b"));
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn record_does_not_duplicate() {
        let mut c = DedupCache::with_capacity(2);
        c.record("x");
        c.record("x");
        assert_eq!(c.len(), 1);
        assert!(!c.admit("x"));
    }
}
