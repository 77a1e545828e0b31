//! Latest-value cache with one-shot consumption.
//!
//! Each [`ReadingKind`] has exactly one slot. Storing a reading overwrites the
//! slot in place; consuming it hands out a copy and clears its freshness, so a
//! caller sees each update at most once.

use crate::readings::{Reading, ReadingKind};
use crate::types::*;

/// One cache slot: the last value with its flags.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    value: Option<T>,
    valid: bool,
    updated: bool,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CacheEntry<T> {
    /// An entry that has never been populated.
    pub const fn new() -> Self {
        CacheEntry {
            value: None,
            valid: false,
            updated: false,
        }
    }

    /// Overwrite the value and mark it fresh.
    pub fn store(&mut self, value: T, valid: bool) {
        self.value = Some(value);
        self.valid = valid;
        self.updated = true;
    }

    /// Whether a fresh value passed its domain rules and has not been consumed.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether a value arrived since the last consumption.
    pub fn is_updated(&self) -> bool {
        self.updated
    }

    /// Whether the slot was ever populated.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Last stored value, without touching the flags.
    pub fn latest(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Clear the flags, keeping the last value for [`CacheEntry::latest`].
    pub fn mark_consumed(&mut self) {
        self.valid = false;
        self.updated = false;
    }
}

impl<T: Clone> CacheEntry<T> {
    /// Hand out a fresh, valid value once.
    ///
    /// Returns `None` if there is no valid value pending. An update that failed
    /// its domain rules is left pending for [`CacheEntry::consume_update`].
    pub fn consume(&mut self) -> Option<T> {
        if !self.valid {
            return None;
        }
        self.mark_consumed();
        self.value.clone()
    }

    /// Hand out a fresh value once, whether or not it is valid.
    pub fn consume_update(&mut self) -> Option<(T, bool)> {
        if !self.updated {
            return None;
        }
        let valid = self.valid;
        self.mark_consumed();
        self.value.clone().map(|value| (value, valid))
    }
}

/// Storage for decoded readings.
///
/// Implemented by [`ReadingCache`] and by shared wrappers around it, so the
/// receive loop can write into whichever one the host uses.
pub trait ReadingStore {
    /// Overwrite the slot of the reading's kind.
    fn store(&mut self, reading: Reading, valid: bool);

    /// Hand out the fresh, valid reading of a kind once.
    fn consume(&mut self, kind: ReadingKind) -> Option<Reading>;

    /// Hand out the fresh reading of a kind once, with its validity.
    fn consume_update(&mut self, kind: ReadingKind) -> Option<(Reading, bool)>;

    /// Copy of the last reading of a kind, leaving its flags alone.
    fn latest(&self, kind: ReadingKind) -> Option<Reading>;

    /// Whether a valid reading of this kind is pending.
    fn is_valid(&self, kind: ReadingKind) -> bool;

    /// Whether any reading of this kind arrived since it was last consumed.
    fn is_updated(&self, kind: ReadingKind) -> bool;

    /// Store a reading, applying its domain rules.
    fn update(&mut self, reading: Reading) {
        let valid = reading.is_domain_valid();
        self.store(reading, valid);
    }

    fn heart_breath_phases(&mut self) -> Option<HeartBreathPhases> {
        self.consume(ReadingKind::HeartBreathPhases)
            .and_then(Reading::into_heart_breath_phases)
    }

    fn breath_rate(&mut self) -> Option<f32> {
        self.consume(ReadingKind::BreathRate)
            .and_then(Reading::into_breath_rate)
    }

    fn heart_rate(&mut self) -> Option<f32> {
        self.consume(ReadingKind::HeartRate)
            .and_then(Reading::into_heart_rate)
    }

    fn distance(&mut self) -> Option<Distance> {
        self.consume(ReadingKind::Distance)
            .and_then(Reading::into_distance)
    }

    fn human_presence(&mut self) -> Option<bool> {
        self.consume(ReadingKind::HumanPresence)
            .and_then(Reading::into_human_presence)
    }

    /// Fall state is level-triggered: the last report, never cleared.
    fn fall_detected(&self) -> Option<bool> {
        self.latest(ReadingKind::FallDetected)
            .and_then(Reading::into_fall_detected)
    }

    fn point_cloud(&mut self) -> Option<Vec<TargetRecord>> {
        self.consume(ReadingKind::PointCloud)
            .and_then(Reading::into_targets)
    }

    fn target_info(&mut self) -> Option<Vec<TargetRecord>> {
        self.consume(ReadingKind::TargetInfo)
            .and_then(Reading::into_targets)
    }

    fn radar_parameters(&mut self) -> Option<RadarParameters> {
        self.consume(ReadingKind::RadarParameters)
            .and_then(Reading::into_radar_parameters)
    }

    fn acknowledgement(&mut self) -> Option<Acknowledgement> {
        self.consume(ReadingKind::Acknowledgement)
            .and_then(Reading::into_acknowledgement)
    }
}

/// One slot per reading kind, allocated once.
#[derive(Debug, Clone)]
pub struct ReadingCache {
    slots: [CacheEntry<Reading>; ReadingKind::COUNT],
}

impl Default for ReadingCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingCache {
    /// An empty cache.
    pub fn new() -> Self {
        ReadingCache {
            slots: std::array::from_fn(|_| CacheEntry::new()),
        }
    }

    /// The slot of a kind.
    pub fn entry(&self, kind: ReadingKind) -> &CacheEntry<Reading> {
        &self.slots[kind.index()]
    }

    /// Kinds with a fresh reading pending.
    pub fn pending(&self) -> impl Iterator<Item = ReadingKind> + '_ {
        ReadingKind::ALL
            .into_iter()
            .filter(|kind| self.slots[kind.index()].is_updated())
    }

    /// Forget every stored reading.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = CacheEntry::new();
        }
    }
}

impl ReadingStore for ReadingCache {
    fn store(&mut self, reading: Reading, valid: bool) {
        self.slots[reading.kind().index()].store(reading, valid);
    }

    fn consume(&mut self, kind: ReadingKind) -> Option<Reading> {
        self.slots[kind.index()].consume()
    }

    fn consume_update(&mut self, kind: ReadingKind) -> Option<(Reading, bool)> {
        self.slots[kind.index()].consume_update()
    }

    fn latest(&self, kind: ReadingKind) -> Option<Reading> {
        self.slots[kind.index()].latest().cloned()
    }

    fn is_valid(&self, kind: ReadingKind) -> bool {
        self.slots[kind.index()].is_valid()
    }

    fn is_updated(&self, kind: ReadingKind) -> bool {
        self.slots[kind.index()].is_updated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_once() {
        let mut cache = ReadingCache::new();
        cache.update(Reading::BreathRate(1.0));
        assert!(cache.is_valid(ReadingKind::BreathRate));
        assert_eq!(cache.breath_rate(), Some(1.0));
        assert_eq!(cache.breath_rate(), None);
        assert!(!cache.is_updated(ReadingKind::BreathRate));
    }

    #[test]
    fn test_never_populated() {
        let mut cache = ReadingCache::new();
        assert!(!cache.entry(ReadingKind::HeartRate).has_value());
        assert_eq!(cache.heart_rate(), None);
        assert_eq!(cache.consume_update(ReadingKind::HeartRate), None);
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let mut cache = ReadingCache::new();
        cache.update(Reading::HeartRate(60.0));
        cache.update(Reading::HeartRate(62.0));
        assert_eq!(cache.heart_rate(), Some(62.0));
        assert_eq!(cache.heart_rate(), None);
    }

    #[test]
    fn test_invalid_update_not_consumed_as_value() {
        let mut cache = ReadingCache::new();
        cache.update(Reading::HeartRate(0.0));
        assert!(cache.is_updated(ReadingKind::HeartRate));
        assert!(!cache.is_valid(ReadingKind::HeartRate));
        assert_eq!(cache.heart_rate(), None);
        assert_eq!(
            cache.consume_update(ReadingKind::HeartRate),
            Some((Reading::HeartRate(0.0), false))
        );
        assert_eq!(cache.consume_update(ReadingKind::HeartRate), None);
    }

    #[test]
    fn test_non_positive_phases_not_consumed_as_value() {
        let mut cache = ReadingCache::new();
        let phases = HeartBreathPhases {
            total_phase: 0.0,
            breath_phase: -1.0,
            heart_phase: 0.5,
        };
        cache.update(Reading::HeartBreathPhases(phases));
        assert!(!cache.is_valid(ReadingKind::HeartBreathPhases));
        assert_eq!(cache.heart_breath_phases(), None);
        assert_eq!(
            cache.consume_update(ReadingKind::HeartBreathPhases),
            Some((Reading::HeartBreathPhases(phases), false))
        );
    }

    #[test]
    fn test_latest_does_not_clear() {
        let mut cache = ReadingCache::new();
        cache.update(Reading::FallDetected(true));
        assert_eq!(cache.fall_detected(), Some(true));
        assert_eq!(cache.fall_detected(), Some(true));
        assert!(cache.is_updated(ReadingKind::FallDetected));
    }

    #[test]
    fn test_slots_are_independent() {
        let mut cache = ReadingCache::new();
        cache.update(Reading::BreathRate(12.0));
        cache.update(Reading::HeartRate(70.0));
        assert_eq!(
            cache.pending().collect::<Vec<_>>(),
            vec![ReadingKind::BreathRate, ReadingKind::HeartRate]
        );
        assert_eq!(cache.heart_rate(), Some(70.0));
        assert_eq!(cache.breath_rate(), Some(12.0));
    }

    #[test]
    fn test_point_cloud_and_target_info_use_own_slots() {
        let mut cache = ReadingCache::new();
        let target = TargetRecord {
            x: 1.0,
            ..TargetRecord::default()
        };
        cache.update(Reading::PointCloud(vec![target]));
        assert_eq!(cache.target_info(), None);
        assert_eq!(cache.point_cloud(), Some(vec![target]));
    }

    #[test]
    fn test_clear() {
        let mut cache = ReadingCache::new();
        cache.update(Reading::BreathRate(12.0));
        cache.clear();
        assert_eq!(cache.latest(ReadingKind::BreathRate), None);
        assert_eq!(cache.pending().count(), 0);
    }
}
