//! In-memory link for tests and capture replay.
//!
//! `MockLink` plays the device side of a link: it serves queued bytes to the
//! host, records what the host writes, and can answer command frames with
//! scripted replies.

use std::collections::{HashMap, VecDeque};
use std::io;

use mmwave_protocol::{encode_frame, validate, FrameSynchronizer, TypeFilter};
use tracing::{trace, warn};

use crate::link::{ByteStream, Clock, ManualClock};

/// Scripted device for driving a [`crate::Sensor`] without hardware.
#[derive(Debug, Default)]
pub struct MockLink {
    rx: VecDeque<u8>,
    written: Vec<u8>,
    /// Host frames parsed from `written`, as `(type_code, payload)`.
    sent: Vec<(u16, Vec<u8>)>,
    command_sync: FrameSynchronizer,
    /// Replies keyed by the command type that triggers them.
    replies: HashMap<u16, VecDeque<Vec<u8>>>,
    /// Bytes that become readable once the clock reaches a time.
    scheduled: Vec<(u64, Vec<u8>)>,
    clock: Option<ManualClock>,
    tick_ms: u64,
    reply_sequence: u16,
}

impl MockLink {
    /// An idle link.
    pub fn new() -> Self {
        Self::default()
    }

    /// A link that serves a raw capture, then goes quiet.
    pub fn from_capture(bytes: impl Into<Vec<u8>>) -> Self {
        let mut link = Self::new();
        link.rx.extend(bytes.into());
        link
    }

    /// Advance `clock` by `tick_ms` on every availability check.
    ///
    /// This lets a busy-polling caller reach its deadline deterministically.
    pub fn with_clock(mut self, clock: ManualClock, tick_ms: u64) -> Self {
        self.clock = Some(clock);
        self.tick_ms = tick_ms;
        self
    }

    /// Make raw bytes readable now.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Make an encoded frame readable now.
    pub fn feed_frame(&mut self, type_code: u16, payload: &[u8]) {
        let frame = self.next_frame(type_code, payload);
        self.feed(&frame);
    }

    /// Make an encoded frame readable once the clock reaches `at_ms`.
    pub fn feed_frame_at(&mut self, at_ms: u64, type_code: u16, payload: &[u8]) {
        let frame = self.next_frame(type_code, payload);
        self.scheduled.push((at_ms, frame));
        self.scheduled.sort_by_key(|(at, _)| *at);
    }

    /// Answer the next command of `command_type` with a reply frame.
    ///
    /// Replies for the same command are used in the order they were added.
    pub fn reply_to(&mut self, command_type: u16, reply_type: u16, payload: &[u8]) {
        let frame = self.next_frame(reply_type, payload);
        self.replies.entry(command_type).or_default().push_back(frame);
    }

    /// Every byte the host has written.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Host frames received so far, as `(type_code, payload)`.
    pub fn sent_frames(&self) -> &[(u16, Vec<u8>)] {
        &self.sent
    }

    /// Bytes queued for the host.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Whether every queued and scheduled byte has been read.
    pub fn is_drained(&self) -> bool {
        self.rx.is_empty() && self.scheduled.is_empty()
    }

    fn next_frame(&mut self, type_code: u16, payload: &[u8]) -> Vec<u8> {
        let frame = encode_frame(self.reply_sequence, type_code, payload).unwrap_or_else(|err| {
            warn!("MockLink: not queueing 0x{:04X}: {}", type_code, err);
            Vec::new()
        });
        self.reply_sequence = self.reply_sequence.wrapping_add(1);
        frame
    }

    fn release_scheduled(&mut self) {
        let Some(clock) = &self.clock else {
            return;
        };
        let now = clock.now_ms();
        let due = self.scheduled.iter().take_while(|(at, _)| *at <= now).count();
        for (_, bytes) in self.scheduled.drain(..due) {
            self.rx.extend(bytes);
        }
    }
}

impl ByteStream for MockLink {
    fn available(&mut self) -> io::Result<usize> {
        if let Some(clock) = &self.clock {
            clock.advance(self.tick_ms);
        }
        self.release_scheduled();
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.rx.pop_front())
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(data);
        for candidate in self.command_sync.push(data) {
            let Ok(frame) = validate(&candidate, TypeFilter::Any) else {
                continue;
            };
            trace!("MockLink: host sent 0x{:04X}", frame.type_code);
            self.sent.push((frame.type_code, frame.payload.to_vec()));
            if let Some(reply) = self
                .replies
                .get_mut(&frame.type_code)
                .and_then(VecDeque::pop_front)
            {
                self.rx.extend(reply);
            }
        }
        Ok(data.len())
    }
}
