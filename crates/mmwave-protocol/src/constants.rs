//! Protocol constants
//!
//! Frame layout sizes and the type codes emitted or accepted by the supported
//! radar modules.

// ============================================================================
// Frame Layout
// ============================================================================

/// Start-of-frame marker.
pub const SOF_BYTE: u8 = 0x01;

/// Size of the start-of-frame marker.
pub const SIZE_SOF: usize = 1;
/// Size of the sequence id field.
pub const SIZE_ID: usize = 2;
/// Size of the payload length field.
pub const SIZE_LEN: usize = 2;
/// Size of the type code field.
pub const SIZE_TYPE: usize = 2;
/// Size of the header checksum.
pub const SIZE_HEAD_CKSUM: usize = 1;
/// Size of the payload checksum.
pub const SIZE_DATA_CKSUM: usize = 1;

/// Total header size, including the header checksum.
pub const FRAME_HEADER_SIZE: usize = SIZE_SOF + SIZE_ID + SIZE_LEN + SIZE_TYPE + SIZE_HEAD_CKSUM;

/// Offset of the sequence id field.
pub const OFFSET_ID: usize = SIZE_SOF;
/// Offset of the payload length field.
pub const OFFSET_LEN: usize = OFFSET_ID + SIZE_ID;
/// Offset of the type code field.
pub const OFFSET_TYPE: usize = OFFSET_LEN + SIZE_LEN;
/// Offset of the header checksum. It covers every byte before it.
pub const OFFSET_HEAD_CKSUM: usize = OFFSET_TYPE + SIZE_TYPE;

/// Smallest possible frame: header plus the payload checksum of an empty payload.
pub const MIN_FRAME_SIZE: usize = FRAME_HEADER_SIZE + SIZE_DATA_CKSUM;

/// Default ceiling on declared payload lengths.
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 512;

/// Type code that matches any frame when used as a filter.
pub const TYPE_WILDCARD: u16 = 0xFFFF;

/// Default time to wait for a reply to a command, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1000;

// ============================================================================
// Breath / Heart Monitoring (MR60BHA2)
// ============================================================================

/// Total, breath and heart phase (three f32).
pub const TYPE_HEART_BREATH_PHASE: u16 = 0x0A13;
/// Breath rate in breaths per minute (f32).
pub const TYPE_BREATH_RATE: u16 = 0x0A14;
/// Heart rate in beats per minute (f32).
pub const TYPE_HEART_RATE: u16 = 0x0A15;
/// Distance to the monitored target (u32 flag + f32 range).
pub const TYPE_HEART_BREATH_DISTANCE: u16 = 0x0A16;

// ============================================================================
// Fall Detection (MR60FDA2 / MR60FDC1)
// ============================================================================

/// Enable or disable the user log stream (host to device, u32 flag).
pub const TYPE_USER_LOG_INFO: u16 = 0x0E01;
/// Fall state report (one byte).
pub const TYPE_FALL_DETECTION: u16 = 0x0E02;
/// Set installation height (f32 request, status byte reply).
pub const TYPE_INSTALLATION_HEIGHT: u16 = 0x0E04;
/// Query radar parameters (empty request, 28 byte reply).
pub const TYPE_RADAR_PARAMETERS: u16 = 0x0E06;
/// Set fall threshold (f32 request, status byte reply).
pub const TYPE_FALL_THRESHOLD: u16 = 0x0E08;
/// Set fall sensitivity (u32 request, status byte reply).
pub const TYPE_FALL_SENSITIVITY: u16 = 0x0E0A;
/// Set alarm area (four f32 request, status byte reply).
pub const TYPE_ALARM_PARAMETERS: u16 = 0x0E0C;
/// Restore the factory radar settings (empty request).
pub const TYPE_RADAR_INIT_SETTING: u16 = 0x2110;

// ============================================================================
// Shared Reports
// ============================================================================

/// 3D point cloud detection report (count-prefixed target records).
pub const TYPE_POINT_CLOUD_DETECTION: u16 = 0x0A08;
/// 3D point cloud target info report (count-prefixed target records).
pub const TYPE_POINT_CLOUD_TARGET_INFO: u16 = 0x0A04;
/// Human presence report (one byte).
pub const TYPE_HUMAN_PRESENCE: u16 = 0x0F09;
