//! Byte-stream frame synchronizer.
//!
//! The synchronizer accumulates bytes into a candidate buffer:
//! - Outside a frame, bytes are discarded until a [`SOF_BYTE`] appears
//! - Inside a frame, every byte is appended, including bytes equal to the marker
//! - Once the header is complete the declared length fixes the frame size
//! - A complete candidate is handed out and scanning starts over, whether or
//!   not the candidate later validates

use bytes::{BufMut, BytesMut};

use crate::constants::*;
use crate::frame::declared_frame_len;

/// Splits a raw byte stream into candidate frames.
#[derive(Debug)]
pub struct FrameSynchronizer {
    /// Bytes of the frame currently being received.
    buffer: BytesMut,
    /// Whether a start marker has been seen and a frame is in progress.
    framing: bool,
    /// Largest payload length accepted before framing is abandoned.
    max_payload_len: usize,
}

impl Default for FrameSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSynchronizer {
    /// Create a synchronizer with the default payload ceiling.
    pub fn new() -> Self {
        Self::with_max_payload_len(DEFAULT_MAX_PAYLOAD_LEN)
    }

    /// Create a synchronizer that abandons frames declaring more than
    /// `max_payload_len` payload bytes.
    pub fn with_max_payload_len(max_payload_len: usize) -> Self {
        FrameSynchronizer {
            buffer: BytesMut::with_capacity(MIN_FRAME_SIZE + max_payload_len),
            framing: false,
            max_payload_len,
        }
    }

    /// Feed one byte.
    ///
    /// Returns `Some(candidate)` when this byte completes a frame of the declared
    /// length. The candidate has not been validated.
    pub fn push_byte(&mut self, byte: u8) -> Option<BytesMut> {
        if !self.framing {
            if byte == SOF_BYTE {
                self.buffer.clear();
                self.buffer.put_u8(byte);
                self.framing = true;
            }
            return None;
        }

        self.buffer.put_u8(byte);

        let expected = declared_frame_len(&self.buffer)?;
        let payload_len = expected - MIN_FRAME_SIZE;
        if payload_len > self.max_payload_len {
            log::trace!(
                "abandoning frame: declared payload {} exceeds limit {}",
                payload_len,
                self.max_payload_len
            );
            self.reset();
            return None;
        }

        if self.buffer.len() == expected {
            self.framing = false;
            return Some(self.buffer.split());
        }

        None
    }

    /// Feed a block of bytes, returning every candidate completed by it.
    pub fn push(&mut self, data: &[u8]) -> Vec<BytesMut> {
        data.iter().filter_map(|&byte| self.push_byte(byte)).collect()
    }

    /// Whether a frame is currently in progress.
    pub fn is_framing(&self) -> bool {
        self.framing
    }

    /// Number of bytes held for the frame in progress.
    pub fn buffered_len(&self) -> usize {
        if self.framing {
            self.buffer.len()
        } else {
            0
        }
    }

    /// Payload ceiling in bytes.
    pub fn max_payload_len(&self) -> usize {
        self.max_payload_len
    }

    /// Drop any partial frame and go back to marker search.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.framing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode_frame;

    fn breath_rate_frame(rate: f32) -> Vec<u8> {
        encode_frame(0, TYPE_BREATH_RATE, &rate.to_le_bytes()).unwrap()
    }

    #[test]
    fn test_single_frame() {
        let mut sync = FrameSynchronizer::new();
        let frame = breath_rate_frame(1.0);
        let candidates = sync.push(&frame);
        assert_eq!(candidates.len(), 1);
        assert_eq!(&candidates[0][..], &frame[..]);
        assert!(!sync.is_framing());
    }

    #[test]
    fn test_leading_garbage_discarded() {
        let mut sync = FrameSynchronizer::new();
        let frame = breath_rate_frame(1.0);
        let mut stream = vec![0x55, 0xAA, 0x00, 0x7F];
        stream.extend_from_slice(&frame);
        let candidates = sync.push(&stream);
        assert_eq!(candidates.len(), 1);
        assert_eq!(&candidates[0][..], &frame[..]);
    }

    #[test]
    fn test_partial_then_rest() {
        let mut sync = FrameSynchronizer::new();
        let frame = breath_rate_frame(12.0);
        assert!(sync.push(&frame[..5]).is_empty());
        assert!(sync.is_framing());
        assert_eq!(sync.buffered_len(), 5);
        let candidates = sync.push(&frame[5..]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(&candidates[0][..], &frame[..]);
    }

    #[test]
    fn test_marker_inside_payload_is_data() {
        let mut sync = FrameSynchronizer::new();
        let payload = [SOF_BYTE, SOF_BYTE, 0x02, SOF_BYTE];
        let frame = encode_frame(SOF_BYTE as u16, TYPE_HEART_RATE, &payload).unwrap();
        let candidates = sync.push(&frame);
        assert_eq!(candidates.len(), 1);
        assert_eq!(&candidates[0][..], &frame[..]);
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut sync = FrameSynchronizer::new();
        let first = breath_rate_frame(10.0);
        let second = encode_frame(1, TYPE_HEART_RATE, &60.0f32.to_le_bytes()).unwrap();
        let mut stream = first.clone();
        stream.extend_from_slice(&second);
        let candidates = sync.push(&stream);
        assert_eq!(candidates.len(), 2);
        assert_eq!(&candidates[0][..], &first[..]);
        assert_eq!(&candidates[1][..], &second[..]);
    }

    #[test]
    fn test_oversized_length_abandons_frame() {
        let mut sync = FrameSynchronizer::with_max_payload_len(16);
        // Header declaring a 0x0200 byte payload
        let header = [SOF_BYTE, 0x00, 0x00, 0x02, 0x00, 0x0A, 0x14, 0x00];
        assert!(sync.push(&header).is_empty());
        assert!(!sync.is_framing());

        let frame = breath_rate_frame(3.0);
        let candidates = sync.push(&frame);
        assert_eq!(candidates.len(), 1);
        assert_eq!(&candidates[0][..], &frame[..]);
    }

    #[test]
    fn test_reset_drops_partial_frame() {
        let mut sync = FrameSynchronizer::new();
        let frame = breath_rate_frame(3.0);
        sync.push(&frame[..6]);
        sync.reset();
        assert!(!sync.is_framing());
        assert_eq!(sync.buffered_len(), 0);
        assert_eq!(sync.push(&frame).len(), 1);
    }
}
