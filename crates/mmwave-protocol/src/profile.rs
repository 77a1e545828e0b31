//! Device profiles.
//!
//! A profile is the catalog of type codes one sensor model emits, each with the
//! rule that decodes it. It is the only per-device customization point; framing
//! and validation are shared by every model.

use std::borrow::Cow;
use std::collections::HashSet;

use crate::constants::*;
use crate::decoder::{DecodeRule, RecordLayout};
use crate::error::ProfileError;
use crate::readings::ReadingKind;

/// One type code of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileEntry {
    /// Type code carried in the frame header.
    pub type_code: u16,
    /// How its payload is decoded.
    pub rule: DecodeRule,
}

impl ProfileEntry {
    const fn fixed(type_code: u16, kind: ReadingKind) -> Self {
        ProfileEntry {
            type_code,
            rule: DecodeRule::Fixed { kind },
        }
    }

    const fn records(type_code: u16, kind: ReadingKind, record: RecordLayout) -> Self {
        ProfileEntry {
            type_code,
            rule: DecodeRule::CountPrefixed { kind, record },
        }
    }
}

const MR60BHA2_ENTRIES: &[ProfileEntry] = &[
    ProfileEntry::fixed(TYPE_HEART_BREATH_PHASE, ReadingKind::HeartBreathPhases),
    ProfileEntry::fixed(TYPE_BREATH_RATE, ReadingKind::BreathRate),
    ProfileEntry::fixed(TYPE_HEART_RATE, ReadingKind::HeartRate),
    ProfileEntry::fixed(TYPE_HEART_BREATH_DISTANCE, ReadingKind::Distance),
    ProfileEntry::fixed(TYPE_HUMAN_PRESENCE, ReadingKind::HumanPresence),
    ProfileEntry::records(
        TYPE_POINT_CLOUD_DETECTION,
        ReadingKind::PointCloud,
        RecordLayout::Planar,
    ),
    ProfileEntry::records(
        TYPE_POINT_CLOUD_TARGET_INFO,
        ReadingKind::TargetInfo,
        RecordLayout::Planar,
    ),
];

const MR60FDC1_ENTRIES: &[ProfileEntry] = &[
    ProfileEntry::fixed(TYPE_FALL_DETECTION, ReadingKind::FallDetected),
    ProfileEntry::fixed(TYPE_HUMAN_PRESENCE, ReadingKind::HumanPresence),
    ProfileEntry::fixed(TYPE_RADAR_PARAMETERS, ReadingKind::RadarParameters),
    ProfileEntry::fixed(TYPE_INSTALLATION_HEIGHT, ReadingKind::Acknowledgement),
    ProfileEntry::fixed(TYPE_FALL_THRESHOLD, ReadingKind::Acknowledgement),
    ProfileEntry::fixed(TYPE_FALL_SENSITIVITY, ReadingKind::Acknowledgement),
    ProfileEntry::fixed(TYPE_ALARM_PARAMETERS, ReadingKind::Acknowledgement),
    ProfileEntry::fixed(TYPE_RADAR_INIT_SETTING, ReadingKind::Acknowledgement),
];

const MR60FDA2_ENTRIES: &[ProfileEntry] = &[
    ProfileEntry::fixed(TYPE_FALL_DETECTION, ReadingKind::FallDetected),
    ProfileEntry::fixed(TYPE_HUMAN_PRESENCE, ReadingKind::HumanPresence),
    ProfileEntry::fixed(TYPE_RADAR_PARAMETERS, ReadingKind::RadarParameters),
    ProfileEntry::fixed(TYPE_INSTALLATION_HEIGHT, ReadingKind::Acknowledgement),
    ProfileEntry::fixed(TYPE_FALL_THRESHOLD, ReadingKind::Acknowledgement),
    ProfileEntry::fixed(TYPE_FALL_SENSITIVITY, ReadingKind::Acknowledgement),
    ProfileEntry::fixed(TYPE_ALARM_PARAMETERS, ReadingKind::Acknowledgement),
    ProfileEntry::fixed(TYPE_RADAR_INIT_SETTING, ReadingKind::Acknowledgement),
    ProfileEntry::records(
        TYPE_POINT_CLOUD_DETECTION,
        ReadingKind::PointCloud,
        RecordLayout::Spatial,
    ),
    ProfileEntry::records(
        TYPE_POINT_CLOUD_TARGET_INFO,
        ReadingKind::TargetInfo,
        RecordLayout::Spatial,
    ),
];

/// The type-code catalog of one sensor model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    name: Cow<'static, str>,
    entries: Cow<'static, [ProfileEntry]>,
}

impl DeviceProfile {
    /// Names accepted by [`DeviceProfile::by_name`].
    pub const BUILT_IN: [&'static str; 3] = ["mr60bha2", "mr60fda2", "mr60fdc1"];

    /// Breath and heart rate monitor.
    pub fn mr60bha2() -> Self {
        Self::built_in("mr60bha2", MR60BHA2_ENTRIES)
    }

    /// Fall detection module with 3D point clouds.
    pub fn mr60fda2() -> Self {
        Self::built_in("mr60fda2", MR60FDA2_ENTRIES)
    }

    /// Fall detection module without point cloud reports.
    pub fn mr60fdc1() -> Self {
        Self::built_in("mr60fdc1", MR60FDC1_ENTRIES)
    }

    fn built_in(name: &'static str, entries: &'static [ProfileEntry]) -> Self {
        DeviceProfile {
            name: Cow::Borrowed(name),
            entries: Cow::Borrowed(entries),
        }
    }

    /// Look up a built-in profile, ignoring ASCII case.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mr60bha2" => Some(Self::mr60bha2()),
            "mr60fda2" => Some(Self::mr60fda2()),
            "mr60fdc1" => Some(Self::mr60fdc1()),
            _ => None,
        }
    }

    /// Start assembling a custom profile.
    pub fn builder(name: impl Into<String>) -> ProfileBuilder {
        ProfileBuilder {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Profile name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every type code of the profile with its rule.
    pub fn entries(&self) -> &[ProfileEntry] {
        &self.entries
    }

    /// Whether any entry produces the given reading kind.
    pub fn produces(&self, kind: ReadingKind) -> bool {
        self.entries.iter().any(|entry| entry.rule.kind() == kind)
    }
}

/// Builder for custom profiles.
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    name: String,
    entries: Vec<ProfileEntry>,
}

impl ProfileBuilder {
    /// Add a fixed-layout type code.
    pub fn fixed(mut self, type_code: u16, kind: ReadingKind) -> Self {
        self.entries.push(ProfileEntry::fixed(type_code, kind));
        self
    }

    /// Add a count-prefixed target list type code.
    pub fn count_prefixed(mut self, type_code: u16, kind: ReadingKind, record: RecordLayout) -> Self {
        self.entries.push(ProfileEntry::records(type_code, kind, record));
        self
    }

    /// Add every entry of an existing profile.
    pub fn extend_from(mut self, profile: &DeviceProfile) -> Self {
        self.entries.extend_from_slice(profile.entries());
        self
    }

    /// Check the entries and produce the profile.
    pub fn build(self) -> Result<DeviceProfile, ProfileError> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !seen.insert(entry.type_code) {
                return Err(ProfileError::DuplicateType(entry.type_code));
            }
            if !entry.rule.is_consistent() {
                return Err(ProfileError::RuleMismatch {
                    type_code: entry.type_code,
                    kind: entry.rule.kind(),
                });
            }
        }
        Ok(DeviceProfile {
            name: Cow::Owned(self.name),
            entries: Cow::Owned(self.entries),
        })
    }
}
