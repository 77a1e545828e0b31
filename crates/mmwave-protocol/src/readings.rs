//! Decoded readings and their kinds.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::*;

/// The semantic quantity a reading describes. Each kind has one cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReadingKind {
    /// Total, breath and heart phase.
    HeartBreathPhases,
    /// Breath rate.
    BreathRate,
    /// Heart rate.
    HeartRate,
    /// Distance to the monitored target.
    Distance,
    /// Whether a human is present.
    HumanPresence,
    /// Whether a fall has been detected.
    FallDetected,
    /// Point cloud detection targets.
    PointCloud,
    /// Point cloud target info.
    TargetInfo,
    /// Radar parameter block.
    RadarParameters,
    /// Status reply to a set-command.
    Acknowledgement,
}

impl ReadingKind {
    /// Number of reading kinds.
    pub const COUNT: usize = 10;

    /// Every reading kind, in slot order.
    pub const ALL: [ReadingKind; ReadingKind::COUNT] = [
        ReadingKind::HeartBreathPhases,
        ReadingKind::BreathRate,
        ReadingKind::HeartRate,
        ReadingKind::Distance,
        ReadingKind::HumanPresence,
        ReadingKind::FallDetected,
        ReadingKind::PointCloud,
        ReadingKind::TargetInfo,
        ReadingKind::RadarParameters,
        ReadingKind::Acknowledgement,
    ];

    /// Slot index of this kind.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether readings of this kind are lists of target records.
    pub const fn is_target_list(self) -> bool {
        matches!(self, ReadingKind::PointCloud | ReadingKind::TargetInfo)
    }

    /// Stable lowercase label.
    pub const fn as_str(self) -> &'static str {
        match self {
            ReadingKind::HeartBreathPhases => "heart_breath_phases",
            ReadingKind::BreathRate => "breath_rate",
            ReadingKind::HeartRate => "heart_rate",
            ReadingKind::Distance => "distance",
            ReadingKind::HumanPresence => "human_presence",
            ReadingKind::FallDetected => "fall_detected",
            ReadingKind::PointCloud => "point_cloud",
            ReadingKind::TargetInfo => "target_info",
            ReadingKind::RadarParameters => "radar_parameters",
            ReadingKind::Acknowledgement => "acknowledgement",
        }
    }
}

impl std::fmt::Display for ReadingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "value", rename_all = "snake_case"))]
pub enum Reading {
    /// Total, breath and heart phase.
    HeartBreathPhases(HeartBreathPhases),
    /// Breaths per minute.
    BreathRate(f32),
    /// Beats per minute.
    HeartRate(f32),
    /// Distance to the monitored target.
    Distance(Distance),
    /// Whether a human is present.
    HumanPresence(bool),
    /// Whether a fall has been detected.
    FallDetected(bool),
    /// Point cloud detection targets.
    PointCloud(Vec<TargetRecord>),
    /// Point cloud target info.
    TargetInfo(Vec<TargetRecord>),
    /// Radar parameter block.
    RadarParameters(RadarParameters),
    /// Status reply to a set-command.
    Acknowledgement(Acknowledgement),
}

impl Reading {
    /// The kind of this reading.
    pub fn kind(&self) -> ReadingKind {
        match self {
            Reading::HeartBreathPhases(_) => ReadingKind::HeartBreathPhases,
            Reading::BreathRate(_) => ReadingKind::BreathRate,
            Reading::HeartRate(_) => ReadingKind::HeartRate,
            Reading::Distance(_) => ReadingKind::Distance,
            Reading::HumanPresence(_) => ReadingKind::HumanPresence,
            Reading::FallDetected(_) => ReadingKind::FallDetected,
            Reading::PointCloud(_) => ReadingKind::PointCloud,
            Reading::TargetInfo(_) => ReadingKind::TargetInfo,
            Reading::RadarParameters(_) => ReadingKind::RadarParameters,
            Reading::Acknowledgement(_) => ReadingKind::Acknowledgement,
        }
    }

    /// Apply the domain rules that mark a decoded value unusable.
    ///
    /// Rates and all three phases must be positive, and a distance needs a
    /// non-zero flag word.
    pub fn is_domain_valid(&self) -> bool {
        match self {
            Reading::HeartBreathPhases(phases) => {
                phases.total_phase > 0.0 && phases.breath_phase > 0.0 && phases.heart_phase > 0.0
            }
            Reading::BreathRate(rate) | Reading::HeartRate(rate) => *rate > 0.0,
            Reading::Distance(distance) => distance.has_range(),
            _ => true,
        }
    }

    pub fn into_heart_breath_phases(self) -> Option<HeartBreathPhases> {
        match self {
            Reading::HeartBreathPhases(phases) => Some(phases),
            _ => None,
        }
    }

    pub fn into_breath_rate(self) -> Option<f32> {
        match self {
            Reading::BreathRate(rate) => Some(rate),
            _ => None,
        }
    }

    pub fn into_heart_rate(self) -> Option<f32> {
        match self {
            Reading::HeartRate(rate) => Some(rate),
            _ => None,
        }
    }

    pub fn into_distance(self) -> Option<Distance> {
        match self {
            Reading::Distance(distance) => Some(distance),
            _ => None,
        }
    }

    pub fn into_human_presence(self) -> Option<bool> {
        match self {
            Reading::HumanPresence(present) => Some(present),
            _ => None,
        }
    }

    pub fn into_fall_detected(self) -> Option<bool> {
        match self {
            Reading::FallDetected(fall) => Some(fall),
            _ => None,
        }
    }

    /// Target records of a point cloud or target info reading.
    pub fn into_targets(self) -> Option<Vec<TargetRecord>> {
        match self {
            Reading::PointCloud(targets) | Reading::TargetInfo(targets) => Some(targets),
            _ => None,
        }
    }

    pub fn into_radar_parameters(self) -> Option<RadarParameters> {
        match self {
            Reading::RadarParameters(params) => Some(params),
            _ => None,
        }
    }

    pub fn into_acknowledgement(self) -> Option<Acknowledgement> {
        match self {
            Reading::Acknowledgement(ack) => Some(ack),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_indices_match_all() {
        for (i, kind) in ReadingKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_rate_domain_rule() {
        assert!(Reading::BreathRate(14.0).is_domain_valid());
        assert!(!Reading::BreathRate(0.0).is_domain_valid());
        assert!(!Reading::HeartRate(-3.0).is_domain_valid());
    }

    #[test]
    fn test_phase_domain_rule() {
        let phases = |total_phase, breath_phase, heart_phase| {
            Reading::HeartBreathPhases(HeartBreathPhases {
                total_phase,
                breath_phase,
                heart_phase,
            })
        };
        assert!(phases(0.1, 0.2, 0.3).is_domain_valid());
        assert!(!phases(0.0, -1.0, 0.5).is_domain_valid());
        assert!(!phases(0.1, 0.2, 0.0).is_domain_valid());
        assert!(!phases(-0.1, 0.2, 0.3).is_domain_valid());
    }

    #[test]
    fn test_distance_domain_rule() {
        let with_range = Reading::Distance(Distance { flag: 1, range: 0.8 });
        let without = Reading::Distance(Distance { flag: 0, range: 0.8 });
        assert!(with_range.is_domain_valid());
        assert!(!without.is_domain_valid());
    }

    #[test]
    fn test_typed_extraction() {
        assert_eq!(Reading::HeartRate(70.0).into_heart_rate(), Some(70.0));
        assert_eq!(Reading::HeartRate(70.0).into_breath_rate(), None);
        assert_eq!(
            Reading::TargetInfo(vec![TargetRecord::default()]).into_targets().map(|t| t.len()),
            Some(1)
        );
    }
}
