//! mmWave Radar Frame Protocol
//!
//! This crate provides the device-agnostic core for talking to the family of
//! 60 GHz mmWave radar modules (breath/heart monitoring, fall detection, people
//! counting) over a byte-stream link.
//!
//! # Protocol Overview
//!
//! Every message, in both directions, is a single frame:
//!
//! ```text
//! +-----+--------+---------+---------+-------------+-------------+-------------+
//! | SOF | seq id | length  | type    | head cksum  | payload     | data cksum  |
//! | 1 B | 2 B BE | 2 B BE  | 2 B BE  | 1 B         | length B    | 1 B         |
//! +-----+--------+---------+---------+-------------+-------------+-------------+
//! ```
//!
//! Header fields are big-endian, payload fields are little-endian. Both
//! checksums are the complemented XOR of the bytes they cover.
//!
//! The pipeline is:
//!
//! - [`FrameSynchronizer`] finds frame boundaries in the raw byte stream
//! - [`validate`] checks both checksums and extracts a [`Frame`]
//! - [`DecoderRegistry`] turns the payload into a [`Reading`] using the rules of
//!   a [`DeviceProfile`]
//! - [`ReadingCache`] keeps the latest value of each [`ReadingKind`] and hands
//!   it out at most once per update
//!
//! # Example
//!
//! ```rust
//! use mmwave_protocol::*;
//!
//! let registry = DecoderRegistry::new(DeviceProfile::mr60bha2());
//! let mut sync = FrameSynchronizer::new();
//! let mut cache = ReadingCache::new();
//!
//! let bytes = encode_frame(0, TYPE_BREATH_RATE, &16.5f32.to_le_bytes()).unwrap();
//! for candidate in sync.push(&bytes) {
//!     let frame = validate(&candidate, TypeFilter::Any).unwrap();
//!     let decoded = registry.decode(frame.type_code, frame.payload).unwrap();
//!     cache.store(decoded.reading, decoded.valid);
//! }
//!
//! assert_eq!(cache.breath_rate(), Some(16.5));
//! assert_eq!(cache.breath_rate(), None);
//! ```

mod cache;
mod checksum;
mod codec;
mod commands;
mod constants;
mod decoder;
mod error;
mod frame;
mod profile;
mod readings;
mod types;

pub use cache::*;
pub use checksum::*;
pub use codec::*;
pub use commands::*;
pub use constants::*;
pub use decoder::*;
pub use error::*;
pub use frame::*;
pub use profile::*;
pub use readings::*;
pub use types::*;
