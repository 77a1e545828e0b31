//! Per-model facades over [`Sensor`].

use mmwave_protocol::{
    AlarmArea, Command, DeviceProfile, Distance, HeartBreathPhases, RadarParameters,
    ReadingCache, ReadingStore, TargetRecord, TypeFilter,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SensorError, SensorResult};
use crate::link::{ByteStream, Clock, SystemClock};
use crate::sensor::Sensor;

/// Deadline for the factory reset reply of the MR60FDC1.
pub const RESET_REPLY_TIMEOUT_MS: u64 = 3000;

// ============================================================================
// Breath / Heart Monitor
// ============================================================================

/// MR60BHA2 breath and heart rate monitor.
#[derive(Debug)]
pub struct HeartBreathSensor<S, C = SystemClock, R = ReadingCache> {
    sensor: Sensor<S, C, R>,
}

impl<S: ByteStream> HeartBreathSensor<S> {
    pub fn new(link: S) -> Self {
        HeartBreathSensor {
            sensor: Sensor::new(link, DeviceProfile::mr60bha2()),
        }
    }
}

impl<S: ByteStream, C: Clock, R: ReadingStore> HeartBreathSensor<S, C, R> {
    /// Wrap a sensor that was set up with the MR60BHA2 profile.
    pub fn from_sensor(sensor: Sensor<S, C, R>) -> Self {
        HeartBreathSensor { sensor }
    }

    pub fn sensor(&self) -> &Sensor<S, C, R> {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut Sensor<S, C, R> {
        &mut self.sensor
    }

    pub fn into_inner(self) -> Sensor<S, C, R> {
        self.sensor
    }

    /// Process every byte currently available.
    pub fn poll(&mut self) -> SensorResult<Vec<u16>> {
        self.sensor.poll()
    }

    /// Wait up to `timeout_ms` for the next report of any type.
    pub fn update(&mut self, timeout_ms: u64) -> SensorResult<bool> {
        Ok(self.sensor.fetch(TypeFilter::Any, timeout_ms)?.is_some())
    }

    pub fn heart_breath_phases(&mut self) -> Option<HeartBreathPhases> {
        self.sensor.store_mut().heart_breath_phases()
    }

    pub fn breath_rate(&mut self) -> Option<f32> {
        self.sensor.store_mut().breath_rate()
    }

    pub fn heart_rate(&mut self) -> Option<f32> {
        self.sensor.store_mut().heart_rate()
    }

    /// Distance to the target. Only reported when the device has a range.
    pub fn distance(&mut self) -> Option<Distance> {
        self.sensor.store_mut().distance()
    }

    pub fn human_present(&mut self) -> Option<bool> {
        self.sensor.store_mut().human_presence()
    }

    pub fn point_cloud(&mut self) -> Option<Vec<TargetRecord>> {
        self.sensor.store_mut().point_cloud()
    }

    pub fn target_info(&mut self) -> Option<Vec<TargetRecord>> {
        self.sensor.store_mut().target_info()
    }
}

// ============================================================================
// Fall Detection
// ============================================================================

/// Fall detection module variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallModel {
    /// MR60FDA2, with 3D point clouds.
    Fda2,
    /// MR60FDC1, without point clouds.
    Fdc1,
}

impl FallModel {
    pub fn profile(self) -> DeviceProfile {
        match self {
            FallModel::Fda2 => DeviceProfile::mr60fda2(),
            FallModel::Fdc1 => DeviceProfile::mr60fdc1(),
        }
    }

    /// Model matching a profile name.
    pub fn from_profile_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mr60fda2" => Some(FallModel::Fda2),
            "mr60fdc1" => Some(FallModel::Fdc1),
            _ => None,
        }
    }
}

/// MR60FDA2 / MR60FDC1 fall detection module.
#[derive(Debug)]
pub struct FallSensor<S, C = SystemClock, R = ReadingCache> {
    sensor: Sensor<S, C, R>,
    model: FallModel,
}

impl<S: ByteStream> FallSensor<S> {
    pub fn new(link: S, model: FallModel) -> Self {
        FallSensor {
            sensor: Sensor::new(link, model.profile()),
            model,
        }
    }
}

impl<S: ByteStream, C: Clock, R: ReadingStore> FallSensor<S, C, R> {
    /// Wrap a sensor that was set up with the profile of `model`.
    pub fn from_sensor(sensor: Sensor<S, C, R>, model: FallModel) -> Self {
        FallSensor { sensor, model }
    }

    pub fn model(&self) -> FallModel {
        self.model
    }

    pub fn sensor(&self) -> &Sensor<S, C, R> {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut Sensor<S, C, R> {
        &mut self.sensor
    }

    pub fn into_inner(self) -> Sensor<S, C, R> {
        self.sensor
    }

    /// Process every byte currently available.
    pub fn poll(&mut self) -> SensorResult<Vec<u16>> {
        self.sensor.poll()
    }

    /// Wait up to `timeout_ms` for the next report of any type.
    pub fn update(&mut self, timeout_ms: u64) -> SensorResult<bool> {
        Ok(self.sensor.fetch(TypeFilter::Any, timeout_ms)?.is_some())
    }

    /// Restore the factory settings.
    ///
    /// The MR60FDA2 does not answer this command, so it only reports whether
    /// the frame was written. The MR60FDC1 acknowledges it.
    pub fn reset_setting(&mut self) -> SensorResult<bool> {
        let command = Command::ResetSetting;
        match self.model {
            FallModel::Fda2 => {
                self.sensor.send_command(&command)?;
                Ok(true)
            }
            FallModel::Fdc1 => {
                self.sensor.request(
                    command.type_code(),
                    &command.payload(),
                    RESET_REPLY_TIMEOUT_MS,
                )?;
                Ok(self.take_acknowledgement(command.type_code()))
            }
        }
    }

    /// Installation height in meters.
    pub fn set_installation_height(&mut self, height: f32) -> SensorResult<bool> {
        self.set(Command::SetInstallationHeight(height))
    }

    /// Fall threshold in meters.
    pub fn set_threshold(&mut self, threshold: f32) -> SensorResult<bool> {
        self.set(Command::SetFallThreshold(threshold))
    }

    /// Fall sensitivity, in averaged frames.
    pub fn set_sensitivity(&mut self, sensitivity: u32) -> SensorResult<bool> {
        self.set(Command::SetFallSensitivity(sensitivity))
    }

    pub fn set_alarm_area(&mut self, area: AlarmArea) -> SensorResult<bool> {
        self.set(Command::SetAlarmArea(area))
    }

    /// Enable or disable the user log stream. The device sends no reply.
    pub fn set_user_log(&mut self, enabled: bool) -> SensorResult<()> {
        self.sensor.send_command(&Command::SetUserLog(enabled))
    }

    /// Ask the device for its parameter block.
    pub fn radar_parameters(&mut self) -> SensorResult<RadarParameters> {
        let command = Command::QueryRadarParameters;
        self.sensor.request_command(&command)?;
        self.sensor
            .store_mut()
            .radar_parameters()
            .ok_or(SensorError::RequestTimeout {
                type_code: command.type_code(),
                timeout_ms: self.sensor.request_timeout_ms(),
            })
    }

    /// Last reported fall state. Not cleared by reading.
    pub fn fall_detected(&self) -> Option<bool> {
        self.sensor.store().fall_detected()
    }

    pub fn human_present(&mut self) -> Option<bool> {
        self.sensor.store_mut().human_presence()
    }

    pub fn point_cloud(&mut self) -> Option<Vec<TargetRecord>> {
        self.sensor.store_mut().point_cloud()
    }

    pub fn target_info(&mut self) -> Option<Vec<TargetRecord>> {
        self.sensor.store_mut().target_info()
    }

    fn set(&mut self, command: Command) -> SensorResult<bool> {
        self.sensor.request_command(&command)?;
        Ok(self.take_acknowledgement(command.type_code()))
    }

    fn take_acknowledgement(&mut self, type_code: u16) -> bool {
        match self.sensor.store_mut().acknowledgement() {
            Some(ack) if ack.command == type_code => {
                debug!(
                    "FallSensor[{}]: 0x{:04X} accepted={}",
                    self.sensor.name(),
                    type_code,
                    ack.accepted
                );
                ack.accepted
            }
            _ => false,
        }
    }
}
