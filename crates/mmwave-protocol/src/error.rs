//! Protocol error types.

use crate::readings::ReadingKind;
use thiserror::Error;

/// Which checksum of a frame failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSection {
    /// The header checksum at offset 7.
    Header,
    /// The trailing payload checksum.
    Payload,
}

impl std::fmt::Display for FrameSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameSection::Header => write!(f, "header"),
            FrameSection::Payload => write!(f, "payload"),
        }
    }
}

/// Structural errors found while validating a candidate frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Frame is too short to hold a header.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// A checksum did not match the bytes it covers.
    #[error("{section} checksum mismatch: frame carries 0x{expected:02X}, computed 0x{computed:02X}")]
    ChecksumMismatch {
        /// Which checksum failed.
        section: FrameSection,
        /// Checksum carried in the frame.
        expected: u8,
        /// Checksum computed over the received bytes.
        computed: u8,
    },

    /// The declared payload length does not fit the candidate buffer.
    #[error("declared frame length {declared} does not match {available} buffered bytes")]
    LengthMismatch {
        /// Total frame length implied by the length field.
        declared: usize,
        /// Bytes actually present.
        available: usize,
    },

    /// The payload does not fit the 16-bit length field.
    #[error("payload of {len} bytes exceeds the {max} byte frame limit")]
    PayloadTooLong {
        /// Payload length requested.
        len: usize,
        /// Largest encodable payload.
        max: usize,
    },

    /// The frame is valid but not of the type the caller is waiting for.
    #[error("unexpected frame type 0x{actual:04X}, waiting for 0x{expected:04X}")]
    UnexpectedType {
        /// Type the filter accepts.
        expected: u16,
        /// Type carried in the frame.
        actual: u16,
    },
}

/// Errors produced while decoding or encoding a payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No decode rule exists for this type code in the active profile.
    #[error("unknown type code: 0x{0:04X}")]
    UnknownType(u16),

    /// The payload is shorter than the layout or the declared count requires.
    #[error("truncated payload for type 0x{type_code:04X}: need {needed} bytes, have {available}")]
    Truncated {
        /// Type code of the frame.
        type_code: u16,
        /// Bytes required.
        needed: usize,
        /// Bytes present.
        available: usize,
    },

    /// A count prefix was negative.
    #[error("invalid record count {count} for type 0x{type_code:04X}")]
    InvalidCount {
        /// Type code of the frame.
        type_code: u16,
        /// Count carried in the payload.
        count: i32,
    },

    /// The reading passed to an encoder does not belong to the type code's rule.
    #[error("type 0x{type_code:04X} carries {expected} readings, got {actual}")]
    ReadingMismatch {
        /// Type code requested.
        type_code: u16,
        /// Kind the rule produces.
        expected: ReadingKind,
        /// Kind that was supplied.
        actual: ReadingKind,
    },
}

/// Errors found while assembling a custom device profile.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// The same type code was registered twice.
    #[error("duplicate type code 0x{0:04X}")]
    DuplicateType(u16),

    /// The decode rule cannot produce the requested reading kind.
    #[error("type 0x{type_code:04X}: {kind} cannot be decoded with this rule")]
    RuleMismatch {
        /// Type code being registered.
        type_code: u16,
        /// Reading kind requested.
        kind: ReadingKind,
    },
}

/// Any error raised while turning a candidate frame into a reading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame failed structural validation.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ProtocolError {
    /// Short, stable label for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            ProtocolError::Frame(FrameError::FrameTooShort { .. }) => "too_short",
            ProtocolError::Frame(FrameError::ChecksumMismatch {
                section: FrameSection::Header,
                ..
            }) => "header_checksum",
            ProtocolError::Frame(FrameError::ChecksumMismatch {
                section: FrameSection::Payload,
                ..
            }) => "payload_checksum",
            ProtocolError::Frame(FrameError::LengthMismatch { .. }) => "length_mismatch",
            ProtocolError::Frame(FrameError::UnexpectedType { .. }) => "unexpected_type",
            ProtocolError::Frame(FrameError::PayloadTooLong { .. }) => "payload_too_long",
            ProtocolError::Decode(DecodeError::UnknownType(_)) => "unknown_type",
            ProtocolError::Decode(DecodeError::Truncated { .. }) => "truncated",
            ProtocolError::Decode(DecodeError::InvalidCount { .. }) => "invalid_count",
            ProtocolError::Decode(DecodeError::ReadingMismatch { .. }) => "reading_mismatch",
        }
    }

    /// Whether the frame itself was structurally valid and only its payload was rejected.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, ProtocolError::Decode(_))
    }
}
