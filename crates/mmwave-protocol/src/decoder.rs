//! Payload decoding.
//!
//! A [`DecoderRegistry`] maps each type code of a [`DeviceProfile`] to a
//! [`DecodeRule`]. Rules come in two shapes:
//!
//! - [`DecodeRule::Fixed`]: a fixed sequence of little-endian fields whose
//!   layout is determined by the reading kind
//! - [`DecodeRule::CountPrefixed`]: a signed little-endian `i32` count followed
//!   by that many target records back to back
//!
//! Every read is bounds-checked before any field is touched. A payload that is
//! too short yields [`DecodeError::Truncated`], never a partial reading.

use std::collections::HashMap;

use bytes::BufMut;

use crate::error::DecodeError;
use crate::profile::DeviceProfile;
use crate::readings::{Reading, ReadingKind};
use crate::types::*;

/// Size of the record count that prefixes target lists.
pub const COUNT_PREFIX_SIZE: usize = 4;

/// One fixed-width payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// IEEE-754 single precision float.
    F32,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 32-bit integer.
    I32,
    /// Single byte.
    U8,
}

impl Field {
    /// Width of the field in bytes.
    pub const fn size(self) -> usize {
        match self {
            Field::F32 | Field::U32 | Field::I32 => 4,
            Field::U8 => 1,
        }
    }
}

/// Total width of a field sequence.
pub fn layout_size(fields: &[Field]) -> usize {
    fields.iter().map(|field| field.size()).sum()
}

const PHASES_LAYOUT: &[Field] = &[Field::F32, Field::F32, Field::F32];
const RATE_LAYOUT: &[Field] = &[Field::F32];
const DISTANCE_LAYOUT: &[Field] = &[Field::U32, Field::F32];
const FLAG_LAYOUT: &[Field] = &[Field::U8];
const RADAR_PARAMETERS_LAYOUT: &[Field] = &[
    Field::F32,
    Field::F32,
    Field::U32,
    Field::F32,
    Field::F32,
    Field::F32,
    Field::F32,
];

impl ReadingKind {
    /// Field layout of kinds decoded with [`DecodeRule::Fixed`].
    ///
    /// Target lists have no fixed layout and return `None`.
    pub fn fixed_layout(self) -> Option<&'static [Field]> {
        match self {
            ReadingKind::HeartBreathPhases => Some(PHASES_LAYOUT),
            ReadingKind::BreathRate | ReadingKind::HeartRate => Some(RATE_LAYOUT),
            ReadingKind::Distance => Some(DISTANCE_LAYOUT),
            ReadingKind::HumanPresence | ReadingKind::FallDetected => Some(FLAG_LAYOUT),
            ReadingKind::RadarParameters => Some(RADAR_PARAMETERS_LAYOUT),
            ReadingKind::Acknowledgement => Some(FLAG_LAYOUT),
            ReadingKind::PointCloud | ReadingKind::TargetInfo => None,
        }
    }
}

/// Layout of one target record inside a count-prefixed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// `x:f32, y:f32, doppler_index:i32, cluster_index:i32`
    Planar,
    /// `cluster_index:i32, x:f32, y:f32, z:f32, doppler_index:f32`
    Spatial,
}

impl RecordLayout {
    /// Width of one record in bytes.
    pub const fn size(self) -> usize {
        match self {
            RecordLayout::Planar => 16,
            RecordLayout::Spatial => 20,
        }
    }

    fn read(self, reader: &mut FieldReader<'_>) -> Result<TargetRecord, DecodeError> {
        match self {
            RecordLayout::Planar => {
                let x = reader.f32()?;
                let y = reader.f32()?;
                let doppler_index = reader.i32()? as f32;
                let cluster_index = reader.i32()?;
                Ok(TargetRecord {
                    x,
                    y,
                    z: None,
                    doppler_index,
                    cluster_index,
                })
            }
            RecordLayout::Spatial => {
                let cluster_index = reader.i32()?;
                let x = reader.f32()?;
                let y = reader.f32()?;
                let z = reader.f32()?;
                let doppler_index = reader.f32()?;
                Ok(TargetRecord {
                    x,
                    y,
                    z: Some(z),
                    doppler_index,
                    cluster_index,
                })
            }
        }
    }

    fn write(self, buf: &mut Vec<u8>, record: &TargetRecord) {
        match self {
            RecordLayout::Planar => {
                buf.put_f32_le(record.x);
                buf.put_f32_le(record.y);
                buf.put_i32_le(record.doppler_index as i32);
                buf.put_i32_le(record.cluster_index);
            }
            RecordLayout::Spatial => {
                buf.put_i32_le(record.cluster_index);
                buf.put_f32_le(record.x);
                buf.put_f32_le(record.y);
                buf.put_f32_le(record.z.unwrap_or(0.0));
                buf.put_f32_le(record.doppler_index);
            }
        }
    }
}

/// Sequential little-endian reader over a payload.
struct FieldReader<'a> {
    type_code: u16,
    payload: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn new(type_code: u16, payload: &'a [u8]) -> Self {
        FieldReader {
            type_code,
            payload,
            pos: 0,
        }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let end = self.pos + N;
        let bytes = self
            .payload
            .get(self.pos..end)
            .ok_or(DecodeError::Truncated {
                type_code: self.type_code,
                needed: end,
                available: self.payload.len(),
            })?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.pos = end;
        Ok(out)
    }

    fn f32(&mut self) -> Result<f32, DecodeError> {
        self.take::<4>().map(f32::from_le_bytes)
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        self.take::<4>().map(u32::from_le_bytes)
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        self.take::<4>().map(i32::from_le_bytes)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        self.take::<1>().map(|[b]| b)
    }
}

/// How the payload of one type code is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeRule {
    /// Fixed field layout, see [`ReadingKind::fixed_layout`].
    Fixed {
        /// Reading produced.
        kind: ReadingKind,
    },
    /// `i32` count followed by `count` records.
    CountPrefixed {
        /// Reading produced, a target list kind.
        kind: ReadingKind,
        /// Layout of each record.
        record: RecordLayout,
    },
}

impl DecodeRule {
    /// Reading kind this rule produces.
    pub fn kind(&self) -> ReadingKind {
        match self {
            DecodeRule::Fixed { kind } | DecodeRule::CountPrefixed { kind, .. } => *kind,
        }
    }

    /// Whether the rule shape can produce its reading kind.
    pub fn is_consistent(&self) -> bool {
        match self {
            DecodeRule::Fixed { kind } => kind.fixed_layout().is_some(),
            DecodeRule::CountPrefixed { kind, .. } => kind.is_target_list(),
        }
    }

    /// Decode a payload under this rule.
    pub fn decode(&self, type_code: u16, payload: &[u8]) -> Result<Reading, DecodeError> {
        match *self {
            DecodeRule::Fixed { kind } => decode_fixed(kind, type_code, payload),
            DecodeRule::CountPrefixed { kind, record } => {
                decode_records(kind, record, type_code, payload)
            }
        }
    }

    /// Encode a reading into the payload this rule decodes.
    pub fn encode(&self, type_code: u16, reading: &Reading) -> Result<Vec<u8>, DecodeError> {
        if reading.kind() != self.kind() {
            return Err(DecodeError::ReadingMismatch {
                type_code,
                expected: self.kind(),
                actual: reading.kind(),
            });
        }

        let mismatch = || DecodeError::ReadingMismatch {
            type_code,
            expected: self.kind(),
            actual: reading.kind(),
        };

        let mut buf = Vec::new();
        match reading {
            Reading::PointCloud(targets) | Reading::TargetInfo(targets) => {
                let DecodeRule::CountPrefixed { record, .. } = self else {
                    return Err(mismatch());
                };
                buf.reserve(COUNT_PREFIX_SIZE + targets.len() * record.size());
                buf.put_i32_le(targets.len() as i32);
                for target in targets {
                    record.write(&mut buf, target);
                }
            }
            Reading::HeartBreathPhases(phases) => {
                buf.put_f32_le(phases.total_phase);
                buf.put_f32_le(phases.breath_phase);
                buf.put_f32_le(phases.heart_phase);
            }
            Reading::BreathRate(rate) | Reading::HeartRate(rate) => {
                buf.put_f32_le(*rate);
            }
            Reading::Distance(distance) => {
                buf.put_u32_le(distance.flag);
                buf.put_f32_le(distance.range);
            }
            Reading::HumanPresence(flag) | Reading::FallDetected(flag) => {
                buf.put_u8(u8::from(*flag));
            }
            Reading::RadarParameters(params) => {
                buf.put_f32_le(params.height);
                buf.put_f32_le(params.threshold);
                buf.put_u32_le(params.sensitivity);
                buf.put_f32_le(params.alarm_area.x_left);
                buf.put_f32_le(params.alarm_area.x_right);
                buf.put_f32_le(params.alarm_area.z_front);
                buf.put_f32_le(params.alarm_area.z_back);
            }
            Reading::Acknowledgement(ack) => {
                buf.put_u8(u8::from(ack.accepted));
            }
        }
        Ok(buf)
    }
}

fn decode_fixed(kind: ReadingKind, type_code: u16, payload: &[u8]) -> Result<Reading, DecodeError> {
    let layout = kind.fixed_layout().ok_or(DecodeError::UnknownType(type_code))?;
    let needed = layout_size(layout);
    if payload.len() < needed {
        return Err(DecodeError::Truncated {
            type_code,
            needed,
            available: payload.len(),
        });
    }

    let mut r = FieldReader::new(type_code, payload);
    let reading = match kind {
        ReadingKind::HeartBreathPhases => Reading::HeartBreathPhases(HeartBreathPhases {
            total_phase: r.f32()?,
            breath_phase: r.f32()?,
            heart_phase: r.f32()?,
        }),
        ReadingKind::BreathRate => Reading::BreathRate(r.f32()?),
        ReadingKind::HeartRate => Reading::HeartRate(r.f32()?),
        ReadingKind::Distance => Reading::Distance(Distance {
            flag: r.u32()?,
            range: r.f32()?,
        }),
        ReadingKind::HumanPresence => Reading::HumanPresence(r.u8()? != 0),
        ReadingKind::FallDetected => Reading::FallDetected(r.u8()? != 0),
        ReadingKind::RadarParameters => Reading::RadarParameters(RadarParameters {
            height: r.f32()?,
            threshold: r.f32()?,
            sensitivity: r.u32()?,
            alarm_area: AlarmArea {
                x_left: r.f32()?,
                x_right: r.f32()?,
                z_front: r.f32()?,
                z_back: r.f32()?,
            },
        }),
        ReadingKind::Acknowledgement => Reading::Acknowledgement(Acknowledgement {
            command: type_code,
            accepted: r.u8()? != 0,
        }),
        ReadingKind::PointCloud | ReadingKind::TargetInfo => {
            return Err(DecodeError::UnknownType(type_code));
        }
    };
    Ok(reading)
}

fn decode_records(
    kind: ReadingKind,
    record: RecordLayout,
    type_code: u16,
    payload: &[u8],
) -> Result<Reading, DecodeError> {
    let mut r = FieldReader::new(type_code, payload);
    let count = r.i32()?;
    if count < 0 {
        return Err(DecodeError::InvalidCount { type_code, count });
    }

    let needed = (count as usize)
        .checked_mul(record.size())
        .and_then(|n| n.checked_add(COUNT_PREFIX_SIZE))
        .unwrap_or(usize::MAX);
    if needed > payload.len() {
        return Err(DecodeError::Truncated {
            type_code,
            needed,
            available: payload.len(),
        });
    }

    let targets = (0..count)
        .map(|_| record.read(&mut r))
        .collect::<Result<Vec<_>, _>>()?;

    match kind {
        ReadingKind::PointCloud => Ok(Reading::PointCloud(targets)),
        ReadingKind::TargetInfo => Ok(Reading::TargetInfo(targets)),
        _ => Err(DecodeError::UnknownType(type_code)),
    }
}

/// A successfully decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Type code of the frame.
    pub type_code: u16,
    /// Decoded value.
    pub reading: Reading,
    /// Whether the value passed its domain rules.
    pub valid: bool,
}

/// Type-code keyed decoder for one device profile.
#[derive(Debug, Clone)]
pub struct DecoderRegistry {
    profile: DeviceProfile,
    rules: HashMap<u16, DecodeRule>,
}

impl DecoderRegistry {
    /// Build the lookup table for a profile.
    pub fn new(profile: DeviceProfile) -> Self {
        let rules = profile
            .entries()
            .iter()
            .map(|entry| (entry.type_code, entry.rule))
            .collect();
        DecoderRegistry { profile, rules }
    }

    /// Profile this registry decodes for.
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Rule registered for a type code.
    pub fn rule(&self, type_code: u16) -> Option<&DecodeRule> {
        self.rules.get(&type_code)
    }

    /// Whether the profile knows a type code.
    pub fn supports(&self, type_code: u16) -> bool {
        self.rules.contains_key(&type_code)
    }

    /// Decode a payload and apply the domain validity rules.
    pub fn decode(&self, type_code: u16, payload: &[u8]) -> Result<Decoded, DecodeError> {
        let rule = self.rule(type_code).ok_or(DecodeError::UnknownType(type_code))?;
        let reading = rule.decode(type_code, payload)?;
        let valid = reading.is_domain_valid();
        Ok(Decoded {
            type_code,
            reading,
            valid,
        })
    }

    /// Encode a reading into the payload for a type code.
    pub fn encode(&self, type_code: u16, reading: &Reading) -> Result<Vec<u8>, DecodeError> {
        self.rule(type_code)
            .ok_or(DecodeError::UnknownType(type_code))?
            .encode(type_code, reading)
    }
}
