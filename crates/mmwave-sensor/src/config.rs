//! Sensor configuration.

use mmwave_protocol::{DeviceProfile, DEFAULT_MAX_PAYLOAD_LEN, DEFAULT_REQUEST_TIMEOUT_MS};
use serde::{Deserialize, Serialize};

use crate::error::SensorError;

/// Where the sensor bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkConfig {
    /// Serial-to-TCP bridge, as `host:port`.
    Tcp(String),
    /// Raw capture file replayed once.
    Capture(String),
}

/// Configuration for one sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Name used in logs and metric labels.
    pub name: String,
    /// Built-in device profile name.
    pub profile: String,
    /// Default deadline for command replies.
    pub request_timeout_ms: u64,
    /// Payload ceiling of the frame synchronizer.
    pub max_payload_len: usize,
    /// Byte source.
    pub link: Option<LinkConfig>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            name: "sensor".to_string(),
            profile: "mr60bha2".to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
            link: None,
        }
    }
}

impl SensorConfig {
    /// Resolve the configured profile.
    pub fn device_profile(&self) -> Result<DeviceProfile, SensorError> {
        DeviceProfile::by_name(&self.profile).ok_or_else(|| {
            SensorError::Config(format!(
                "unknown profile '{}', expected one of {}",
                self.profile,
                DeviceProfile::BUILT_IN.join(", ")
            ))
        })
    }

    /// Check values that Serde cannot.
    pub fn validate(&self) -> Result<(), SensorError> {
        self.device_profile()?;
        if self.max_payload_len == 0 || self.max_payload_len > u16::MAX as usize {
            return Err(SensorError::Config(format!(
                "max_payload_len must be between 1 and {}, got {}",
                u16::MAX,
                self.max_payload_len
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(SensorError::Config(
                "request_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
