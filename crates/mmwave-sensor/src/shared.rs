//! Reading cache shared between threads.
//!
//! One thread owns the [`crate::Sensor`] and its link; any number of others hold
//! clones of the same [`SharedReadingCache`]. Every operation takes the lock
//! once, so a consume is an atomic read-and-clear.

use std::sync::Arc;

use mmwave_protocol::{Reading, ReadingCache, ReadingKind, ReadingStore};
use parking_lot::Mutex;

/// A [`ReadingCache`] behind an `Arc<Mutex<_>>`.
#[derive(Debug, Clone, Default)]
pub struct SharedReadingCache {
    inner: Arc<Mutex<ReadingCache>>,
}

impl SharedReadingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with the cache locked.
    pub fn with<T>(&self, f: impl FnOnce(&mut ReadingCache) -> T) -> T {
        f(&mut self.inner.lock())
    }

    /// Kinds with a fresh reading pending.
    pub fn pending(&self) -> Vec<ReadingKind> {
        self.inner.lock().pending().collect()
    }
}

impl ReadingStore for SharedReadingCache {
    fn store(&mut self, reading: Reading, valid: bool) {
        self.inner.lock().store(reading, valid);
    }

    fn consume(&mut self, kind: ReadingKind) -> Option<Reading> {
        self.inner.lock().consume(kind)
    }

    fn consume_update(&mut self, kind: ReadingKind) -> Option<(Reading, bool)> {
        self.inner.lock().consume_update(kind)
    }

    fn latest(&self, kind: ReadingKind) -> Option<Reading> {
        self.inner.lock().latest(kind)
    }

    fn is_valid(&self, kind: ReadingKind) -> bool {
        self.inner.lock().is_valid(kind)
    }

    fn is_updated(&self, kind: ReadingKind) -> bool {
        self.inner.lock().is_updated(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_slots() {
        let mut writer = SharedReadingCache::new();
        let mut reader = writer.clone();
        writer.update(Reading::HeartRate(71.0));
        assert_eq!(reader.pending(), vec![ReadingKind::HeartRate]);
        assert_eq!(reader.heart_rate(), Some(71.0));
        assert_eq!(writer.heart_rate(), None);
    }

    #[test]
    fn test_with_exposes_entry() {
        let mut cache = SharedReadingCache::new();
        cache.update(Reading::BreathRate(0.0));
        let (updated, valid) = cache.with(|inner| {
            let entry = inner.entry(ReadingKind::BreathRate);
            (entry.is_updated(), entry.is_valid())
        });
        assert!(updated);
        assert!(!valid);
    }
}
