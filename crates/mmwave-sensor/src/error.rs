//! Sensor error types.

use mmwave_protocol::{DecodeError, FrameError, ProtocolError};
use thiserror::Error;

/// Errors surfaced by [`crate::Sensor`] and the device facades.
#[derive(Error, Debug)]
pub enum SensorError {
    /// The byte link failed.
    #[error("link error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame or payload was rejected.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// No reply of the expected type arrived before the deadline.
    #[error("no reply to 0x{type_code:04X} within {timeout_ms} ms")]
    RequestTimeout {
        /// Type code that was awaited.
        type_code: u16,
        /// Deadline that elapsed.
        timeout_ms: u64,
    },

    /// The sensor configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SensorError {
    /// Whether the caller may simply retry the operation.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SensorError::RequestTimeout { .. })
    }
}

impl From<FrameError> for SensorError {
    fn from(err: FrameError) -> Self {
        SensorError::Protocol(err.into())
    }
}

impl From<DecodeError> for SensorError {
    fn from(err: DecodeError) -> Self {
        SensorError::Protocol(err.into())
    }
}

/// Result type for sensor operations.
pub type SensorResult<T> = Result<T, SensorError>;
