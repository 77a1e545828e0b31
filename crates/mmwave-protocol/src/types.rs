//! Value types carried by decoded readings.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Phase values from the breath/heart monitor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeartBreathPhases {
    /// Total phase.
    pub total_phase: f32,
    /// Breath component of the phase.
    pub breath_phase: f32,
    /// Heart component of the phase.
    pub heart_phase: f32,
}

/// Distance to the monitored target.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Distance {
    /// Non-zero when the device has a range measurement.
    pub flag: u32,
    /// Range in meters.
    pub range: f32,
}

impl Distance {
    /// Whether the device reported a usable range.
    pub fn has_range(&self) -> bool {
        self.flag != 0
    }
}

/// One target of a point cloud or target info report.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TargetRecord {
    /// X coordinate in meters.
    pub x: f32,
    /// Y coordinate in meters.
    pub y: f32,
    /// Z coordinate in meters, present only in spatial layouts.
    pub z: Option<f32>,
    /// Doppler index. Planar layouts carry it as an integer.
    pub doppler_index: f32,
    /// Cluster the target belongs to.
    pub cluster_index: i32,
}

/// Rectangle around the installation point that raises fall alarms.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlarmArea {
    /// Extent to the left, in meters.
    pub x_left: f32,
    /// Extent to the right, in meters.
    pub x_right: f32,
    /// Extent to the front, in meters.
    pub z_front: f32,
    /// Extent to the back, in meters.
    pub z_back: f32,
}

/// Configuration block reported by the fall detection modules.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RadarParameters {
    /// Installation height in meters.
    pub height: f32,
    /// Fall threshold in meters.
    pub threshold: f32,
    /// Fall sensitivity, in averaged frames.
    pub sensitivity: u32,
    /// Alarm area.
    pub alarm_area: AlarmArea,
}

/// Status reply to a set-command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Acknowledgement {
    /// Type code of the command being acknowledged.
    pub command: u16,
    /// Whether the device applied the command.
    pub accepted: bool,
}
