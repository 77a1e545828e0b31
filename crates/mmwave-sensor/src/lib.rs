//! mmWave radar sensor driver.
//!
//! This crate drives a radar module over any non-blocking byte link. It adds
//! to [`mmwave_protocol`]:
//!
//! - [`ByteStream`] and [`Clock`], the collaborators the receive loop polls
//! - [`Sensor`], which runs the receive pipeline and correlates command
//!   replies with a busy-poll against a deadline
//! - [`HeartBreathSensor`] and [`FallSensor`], typed facades per module
//! - [`SharedReadingCache`] for hosts that read values from other threads
//! - [`TcpLink`] for serial-to-TCP bridges and [`MockLink`] for tests and replay
//!
//! # Example
//!
//! ```rust
//! use mmwave_sensor::{HeartBreathSensor, MockLink};
//! use mmwave_protocol::TYPE_HEART_RATE;
//!
//! let mut link = MockLink::new();
//! link.feed_frame(TYPE_HEART_RATE, &68.0f32.to_le_bytes());
//!
//! let mut sensor = HeartBreathSensor::new(link);
//! sensor.poll().unwrap();
//! assert_eq!(sensor.heart_rate(), Some(68.0));
//! assert_eq!(sensor.heart_rate(), None);
//! ```

mod config;
mod devices;
mod error;
mod link;
mod mock;
mod sensor;
mod shared;
mod tcp;

pub use config::{LinkConfig, SensorConfig};
pub use devices::{FallModel, FallSensor, HeartBreathSensor, RESET_REPLY_TIMEOUT_MS};
pub use error::{SensorError, SensorResult};
pub use link::{ByteStream, Clock, ManualClock, SystemClock};
pub use mock::MockLink;
pub use sensor::{LinkStats, Sensor};
pub use shared::SharedReadingCache;
pub use tcp::{TcpLink, DEFAULT_BUFFER_LIMIT};
