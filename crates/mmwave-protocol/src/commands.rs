//! Host-to-device commands of the fall detection modules.

use bytes::BufMut;

use crate::constants::*;
use crate::error::FrameError;
use crate::frame::encode_frame;
use crate::types::AlarmArea;

/// A command frame the host can send.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Restore factory radar settings.
    ResetSetting,
    /// Installation height in meters.
    SetInstallationHeight(f32),
    /// Fall threshold in meters.
    SetFallThreshold(f32),
    /// Fall sensitivity, in averaged frames.
    SetFallSensitivity(u32),
    /// Alarm area around the installation point.
    SetAlarmArea(AlarmArea),
    /// Ask for the radar parameter block.
    QueryRadarParameters,
    /// Enable or disable the user log stream.
    SetUserLog(bool),
}

impl Command {
    /// Type code of the command frame. Replies carry the same code.
    pub fn type_code(&self) -> u16 {
        match self {
            Command::ResetSetting => TYPE_RADAR_INIT_SETTING,
            Command::SetInstallationHeight(_) => TYPE_INSTALLATION_HEIGHT,
            Command::SetFallThreshold(_) => TYPE_FALL_THRESHOLD,
            Command::SetFallSensitivity(_) => TYPE_FALL_SENSITIVITY,
            Command::SetAlarmArea(_) => TYPE_ALARM_PARAMETERS,
            Command::QueryRadarParameters => TYPE_RADAR_PARAMETERS,
            Command::SetUserLog(_) => TYPE_USER_LOG_INFO,
        }
    }

    /// Little-endian payload of the command.
    pub fn payload(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Command::ResetSetting | Command::QueryRadarParameters => {}
            Command::SetInstallationHeight(value) | Command::SetFallThreshold(value) => {
                buf.put_f32_le(*value);
            }
            Command::SetFallSensitivity(value) => buf.put_u32_le(*value),
            Command::SetAlarmArea(area) => {
                buf.put_f32_le(area.x_left);
                buf.put_f32_le(area.x_right);
                buf.put_f32_le(area.z_front);
                buf.put_f32_le(area.z_back);
            }
            Command::SetUserLog(enabled) => buf.put_u32_le(u32::from(*enabled)),
        }
        buf
    }

    /// Complete frame for this command.
    pub fn encode(&self, sequence_id: u16) -> Result<Vec<u8>, FrameError> {
        encode_frame(sequence_id, self.type_code(), &self.payload())
    }
}
