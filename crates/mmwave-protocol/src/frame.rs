//! Frame encoding and validation.
//!
//! ```text
//! offset 0       : SOF (0x01)
//! offset 1..2    : sequence id      (big-endian)
//! offset 3..4    : payload length N (big-endian)
//! offset 5..6    : type code        (big-endian)
//! offset 7       : header checksum  = checksum(bytes[0..7])
//! offset 8..8+N  : payload
//! offset 8+N     : payload checksum = checksum(payload)
//! ```

use bytes::BufMut;

use crate::checksum::checksum;
use crate::constants::*;
use crate::error::{FrameError, FrameSection};

/// The fixed-size header at the start of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Sequence id chosen by the sender.
    pub sequence_id: u16,
    /// Number of payload bytes that follow the header.
    pub payload_len: u16,
    /// Type code selecting how the payload is interpreted.
    pub type_code: u16,
    /// Checksum over the seven bytes before it.
    pub checksum: u8,
}

impl FrameHeader {
    /// Parse the header fields from the start of a buffer.
    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < FRAME_HEADER_SIZE {
            return Err(FrameError::FrameTooShort {
                expected: FRAME_HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(FrameHeader {
            sequence_id: u16::from_be_bytes([bytes[OFFSET_ID], bytes[OFFSET_ID + 1]]),
            payload_len: u16::from_be_bytes([bytes[OFFSET_LEN], bytes[OFFSET_LEN + 1]]),
            type_code: u16::from_be_bytes([bytes[OFFSET_TYPE], bytes[OFFSET_TYPE + 1]]),
            checksum: bytes[OFFSET_HEAD_CKSUM],
        })
    }

    /// Total length of the frame this header introduces.
    pub fn frame_len(&self) -> usize {
        FRAME_HEADER_SIZE + self.payload_len as usize + SIZE_DATA_CKSUM
    }
}

/// Total frame length declared by a partially received buffer.
///
/// Returns `None` until the whole header is present.
pub fn declared_frame_len(buffer: &[u8]) -> Option<usize> {
    if buffer.len() < FRAME_HEADER_SIZE {
        return None;
    }
    let payload_len = u16::from_be_bytes([buffer[OFFSET_LEN], buffer[OFFSET_LEN + 1]]) as usize;
    Some(FRAME_HEADER_SIZE + payload_len + SIZE_DATA_CKSUM)
}

/// Restricts which frame types a validator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    /// Accept every type.
    #[default]
    Any,
    /// Accept only this type code.
    Only(u16),
}

impl TypeFilter {
    /// Check a type code against the filter.
    pub fn accepts(&self, type_code: u16) -> bool {
        match self {
            TypeFilter::Any => true,
            TypeFilter::Only(expected) => *expected == type_code,
        }
    }
}

impl From<u16> for TypeFilter {
    fn from(code: u16) -> Self {
        if code == TYPE_WILDCARD {
            TypeFilter::Any
        } else {
            TypeFilter::Only(code)
        }
    }
}

/// A validated frame borrowing its payload from the candidate buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Sequence id chosen by the sender.
    pub sequence_id: u16,
    /// Type code of the payload.
    pub type_code: u16,
    /// Payload bytes, checksum verified.
    pub payload: &'a [u8],
}

/// Validate a complete candidate frame.
///
/// Both checksums must verify and the buffer must hold exactly the declared
/// length. When `filter` is not [`TypeFilter::Any`], frames of other types are
/// rejected with [`FrameError::UnexpectedType`].
pub fn validate(candidate: &[u8], filter: TypeFilter) -> Result<Frame<'_>, FrameError> {
    let header = FrameHeader::parse(candidate)?;

    let declared = header.frame_len();
    if candidate.len() != declared {
        return Err(FrameError::LengthMismatch {
            declared,
            available: candidate.len(),
        });
    }

    let computed = checksum(&candidate[..OFFSET_HEAD_CKSUM]);
    if computed != header.checksum {
        return Err(FrameError::ChecksumMismatch {
            section: FrameSection::Header,
            expected: header.checksum,
            computed,
        });
    }

    let payload_end = FRAME_HEADER_SIZE + header.payload_len as usize;
    let payload = &candidate[FRAME_HEADER_SIZE..payload_end];
    let expected = candidate[payload_end];
    let computed = checksum(payload);
    if computed != expected {
        return Err(FrameError::ChecksumMismatch {
            section: FrameSection::Payload,
            expected,
            computed,
        });
    }

    if !filter.accepts(header.type_code) {
        let expected = match filter {
            TypeFilter::Only(code) => code,
            TypeFilter::Any => TYPE_WILDCARD,
        };
        return Err(FrameError::UnexpectedType {
            expected,
            actual: header.type_code,
        });
    }

    Ok(Frame {
        sequence_id: header.sequence_id,
        type_code: header.type_code,
        payload,
    })
}

/// Encode a frame for transmission.
///
/// Fails with [`FrameError::PayloadTooLong`] when the payload length does not
/// fit the 16-bit length field.
pub fn encode_frame(sequence_id: u16, type_code: u16, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let len = u16::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLong {
        len: payload.len(),
        max: u16::MAX as usize,
    })?;
    let mut buf = Vec::with_capacity(MIN_FRAME_SIZE + payload.len());
    buf.put_u8(SOF_BYTE);
    buf.put_u16(sequence_id);
    buf.put_u16(len);
    buf.put_u16(type_code);
    let head_cksum = checksum(&buf);
    buf.put_u8(head_cksum);
    buf.extend_from_slice(payload);
    buf.put_u8(checksum(payload));
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let frame = encode_frame(0x0102, TYPE_BREATH_RATE, &[0x00, 0x00, 0x80, 0x3F]).unwrap();
        assert_eq!(
            frame,
            vec![0x01, 0x01, 0x02, 0x00, 0x04, 0x0A, 0x14, 0xE7, 0x00, 0x00, 0x80, 0x3F, 0x40]
        );
        assert_eq!(declared_frame_len(&frame), Some(frame.len()));
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let payload = vec![0u8; u16::MAX as usize + 1];
        assert_eq!(
            encode_frame(0, TYPE_HEART_RATE, &payload),
            Err(FrameError::PayloadTooLong {
                len: u16::MAX as usize + 1,
                max: u16::MAX as usize,
            })
        );

        let largest = vec![0u8; u16::MAX as usize];
        let frame = encode_frame(0, TYPE_HEART_RATE, &largest).unwrap();
        assert_eq!(declared_frame_len(&frame), Some(frame.len()));
    }

    #[test]
    fn test_encode_empty_payload_keeps_checksum() {
        let frame = encode_frame(0, TYPE_RADAR_PARAMETERS, &[]).unwrap();
        assert_eq!(frame.len(), MIN_FRAME_SIZE);
        assert_eq!(frame[FRAME_HEADER_SIZE], 0xFF);
        assert!(validate(&frame, TypeFilter::Any).is_ok());
    }

    #[test]
    fn test_validate_extracts_fields() {
        let frame = encode_frame(7, TYPE_HEART_RATE, &72.0f32.to_le_bytes()).unwrap();
        let parsed = validate(&frame, TypeFilter::Any).expect("valid frame");
        assert_eq!(parsed.sequence_id, 7);
        assert_eq!(parsed.type_code, TYPE_HEART_RATE);
        assert_eq!(parsed.payload, &72.0f32.to_le_bytes());
    }

    #[test]
    fn test_header_checksum_mismatch() {
        let mut frame = encode_frame(0, TYPE_HEART_RATE, &72.0f32.to_le_bytes()).unwrap();
        frame[OFFSET_HEAD_CKSUM] ^= 0x80;
        assert!(matches!(
            validate(&frame, TypeFilter::Any),
            Err(FrameError::ChecksumMismatch {
                section: FrameSection::Header,
                ..
            })
        ));
    }

    #[test]
    fn test_payload_checksum_bit_flips_rejected() {
        let frame = encode_frame(0, TYPE_HEART_RATE, &72.0f32.to_le_bytes()).unwrap();
        let last = frame.len() - 1;
        for bit in 0..8 {
            let mut corrupted = frame.clone();
            corrupted[last] ^= 1 << bit;
            assert!(matches!(
                validate(&corrupted, TypeFilter::Any),
                Err(FrameError::ChecksumMismatch {
                    section: FrameSection::Payload,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_declared_length_overrun_rejected() {
        let frame = encode_frame(0, TYPE_HEART_RATE, &72.0f32.to_le_bytes()).unwrap();
        let short = &frame[..frame.len() - 2];
        assert_eq!(
            validate(short, TypeFilter::Any),
            Err(FrameError::LengthMismatch {
                declared: frame.len(),
                available: frame.len() - 2,
            })
        );
    }

    #[test]
    fn test_too_short_for_header() {
        assert_eq!(
            validate(&[SOF_BYTE, 0, 0], TypeFilter::Any),
            Err(FrameError::FrameTooShort {
                expected: FRAME_HEADER_SIZE,
                actual: 3,
            })
        );
    }

    #[test]
    fn test_type_filter() {
        let frame = encode_frame(0, TYPE_HEART_RATE, &72.0f32.to_le_bytes()).unwrap();
        assert!(validate(&frame, TypeFilter::Only(TYPE_HEART_RATE)).is_ok());
        assert_eq!(
            validate(&frame, TypeFilter::Only(TYPE_BREATH_RATE)),
            Err(FrameError::UnexpectedType {
                expected: TYPE_BREATH_RATE,
                actual: TYPE_HEART_RATE,
            })
        );
        assert_eq!(TypeFilter::from(TYPE_WILDCARD), TypeFilter::Any);
        assert_eq!(TypeFilter::from(TYPE_HEART_RATE), TypeFilter::Only(TYPE_HEART_RATE));
    }
}
