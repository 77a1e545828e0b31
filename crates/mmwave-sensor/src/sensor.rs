//! Receive loop and request/response correlation.
//!
//! A [`Sensor`] owns the link, the frame synchronizer, the decoder registry of
//! its device profile and a reading store. Every byte it reads goes through the
//! full pipeline, so push reports are cached even while a caller is waiting for
//! the reply to a command.

use mmwave_metrics::SensorMetrics;
use mmwave_protocol::{
    encode_frame, validate, Command, Decoded, DecoderRegistry, DeviceProfile, FrameSynchronizer,
    ProtocolError, ReadingCache, ReadingStore, TypeFilter,
};
use tracing::{debug, trace, warn};

use crate::config::SensorConfig;
use crate::error::{SensorError, SensorResult};
use crate::link::{ByteStream, Clock, SystemClock};

/// Counters kept by a [`Sensor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Raw bytes read.
    pub bytes_received: u64,
    /// Frames that passed validation.
    pub frames_accepted: u64,
    /// Candidates the validator rejected.
    pub frames_rejected: u64,
    /// Valid frames whose payload failed to decode.
    pub decode_failures: u64,
    /// Frames written.
    pub frames_sent: u64,
    /// Requests that timed out.
    pub request_timeouts: u64,
}

/// Outcome of handling one complete candidate.
enum Handled {
    Decoded(u16),
    Rejected,
}

/// A sensor module reached over a byte link.
pub struct Sensor<S, C = SystemClock, R = ReadingCache> {
    link: S,
    clock: C,
    store: R,
    sync: FrameSynchronizer,
    registry: DecoderRegistry,
    request_timeout_ms: u64,
    next_sequence_id: u16,
    metrics: SensorMetrics,
    stats: LinkStats,
}

impl<S: ByteStream> Sensor<S> {
    /// A sensor with the wall clock and a private cache.
    pub fn new(link: S, profile: DeviceProfile) -> Self {
        let metrics = SensorMetrics::new("sensor", profile.name());
        Sensor {
            link,
            clock: SystemClock::new(),
            store: ReadingCache::new(),
            sync: FrameSynchronizer::new(),
            registry: DecoderRegistry::new(profile),
            request_timeout_ms: mmwave_protocol::DEFAULT_REQUEST_TIMEOUT_MS,
            next_sequence_id: 0,
            metrics,
            stats: LinkStats::default(),
        }
    }

    /// A sensor set up from configuration.
    pub fn from_config(link: S, config: &SensorConfig) -> SensorResult<Self> {
        config.validate()?;
        let profile = config.device_profile()?;
        Ok(Sensor::new(link, profile)
            .with_name(&config.name)
            .with_request_timeout(config.request_timeout_ms)
            .with_max_payload_len(config.max_payload_len))
    }
}

impl<S: ByteStream, C: Clock, R: ReadingStore> Sensor<S, C, R> {
    /// Replace the clock used for deadlines.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Sensor<S, C2, R> {
        Sensor {
            link: self.link,
            clock,
            store: self.store,
            sync: self.sync,
            registry: self.registry,
            request_timeout_ms: self.request_timeout_ms,
            next_sequence_id: self.next_sequence_id,
            metrics: self.metrics,
            stats: self.stats,
        }
    }

    /// Replace the store decoded readings are written to.
    pub fn with_store<R2: ReadingStore>(self, store: R2) -> Sensor<S, C, R2> {
        Sensor {
            link: self.link,
            clock: self.clock,
            store,
            sync: self.sync,
            registry: self.registry,
            request_timeout_ms: self.request_timeout_ms,
            next_sequence_id: self.next_sequence_id,
            metrics: self.metrics,
            stats: self.stats,
        }
    }

    /// Name used in logs and metric labels.
    pub fn with_name(mut self, name: &str) -> Self {
        self.metrics = SensorMetrics::new(name, self.registry.profile().name());
        self
    }

    /// Default deadline for [`Sensor::request_command`].
    pub fn with_request_timeout(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    /// Payload ceiling of the synchronizer.
    pub fn with_max_payload_len(mut self, max_payload_len: usize) -> Self {
        self.sync = FrameSynchronizer::with_max_payload_len(max_payload_len);
        self
    }

    pub fn name(&self) -> &str {
        self.metrics.sensor()
    }

    pub fn profile(&self) -> &DeviceProfile {
        self.registry.profile()
    }

    pub fn metrics(&self) -> &SensorMetrics {
        &self.metrics
    }

    pub fn registry(&self) -> &DecoderRegistry {
        &self.registry
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut R {
        &mut self.store
    }

    pub fn link(&self) -> &S {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut S {
        &mut self.link
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn request_timeout_ms(&self) -> u64 {
        self.request_timeout_ms
    }

    /// Sequence id the next sent frame will carry.
    pub fn next_sequence_id(&self) -> u16 {
        self.next_sequence_id
    }

    /// Split into link and store.
    pub fn into_parts(self) -> (S, R) {
        (self.link, self.store)
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Frame `payload` and write it to the link.
    pub fn send(&mut self, type_code: u16, payload: &[u8]) -> SensorResult<()> {
        let frame = encode_frame(self.next_sequence_id, type_code, payload)?;
        trace!(
            "Sensor[{}]: TX 0x{:04X} seq={} {}",
            self.metrics.sensor(),
            type_code,
            self.next_sequence_id,
            hex::encode(&frame)
        );
        self.link.write_all(&frame)?;
        self.next_sequence_id = self.next_sequence_id.wrapping_add(1);
        self.stats.frames_sent += 1;
        self.metrics.frame_sent(type_code);
        Ok(())
    }

    /// Send a device command.
    pub fn send_command(&mut self, command: &Command) -> SensorResult<()> {
        self.send(command.type_code(), &command.payload())
    }

    // ========================================================================
    // Receiving
    // ========================================================================

    /// Process every byte currently available.
    ///
    /// Returns the type codes decoded, in arrival order.
    pub fn poll(&mut self) -> SensorResult<Vec<u16>> {
        let mut decoded = Vec::new();
        while let Some(type_code) = self.poll_frame()? {
            decoded.push(type_code);
        }
        Ok(decoded)
    }

    /// Read available bytes up to the next decoded frame.
    ///
    /// Returns its type code, or `None` once the link has nothing buffered.
    pub fn poll_frame(&mut self) -> SensorResult<Option<u16>> {
        while self.link.available()? > 0 {
            let Some(byte) = self.link.read_byte()? else {
                break;
            };
            if let Some(Handled::Decoded(type_code)) = self.feed(byte, TypeFilter::Any) {
                return Ok(Some(type_code));
            }
        }
        Ok(None)
    }

    /// Wait for the first frame that passes validation under `filter`.
    ///
    /// Frames of other types are rejected without being decoded. Returns the
    /// decoded type code, or `None` if the deadline passed first.
    pub fn fetch(&mut self, filter: TypeFilter, timeout_ms: u64) -> SensorResult<Option<u16>> {
        let start = self.clock.now_ms();
        loop {
            if self.clock.now_ms().saturating_sub(start) >= timeout_ms {
                self.sync.reset();
                return Ok(None);
            }
            if let Some(Handled::Decoded(type_code)) = self.pump(filter)? {
                return Ok(Some(type_code));
            }
        }
    }

    /// Send a command frame and wait for a decoded reply of the same type.
    ///
    /// Frames of other types that arrive meanwhile are decoded and cached.
    pub fn request(&mut self, type_code: u16, payload: &[u8], timeout_ms: u64) -> SensorResult<()> {
        let start = self.clock.now_ms();
        self.send(type_code, payload)?;
        self.metrics.request_started(type_code);
        let reply = self.await_reply(type_code, start, timeout_ms);
        if let Err(err) = &reply {
            if !matches!(err, SensorError::RequestTimeout { .. }) {
                self.metrics.request_abandoned(type_code);
            }
        }
        reply
    }

    fn await_reply(&mut self, type_code: u16, start: u64, timeout_ms: u64) -> SensorResult<()> {
        loop {
            let elapsed = self.clock.now_ms().saturating_sub(start);
            if elapsed >= timeout_ms {
                self.sync.reset();
                self.stats.request_timeouts += 1;
                self.metrics.request_timed_out(type_code);
                warn!(
                    "Sensor[{}]: no reply to 0x{:04X} within {} ms",
                    self.metrics.sensor(), type_code, timeout_ms
                );
                return Err(SensorError::RequestTimeout {
                    type_code,
                    timeout_ms,
                });
            }
            if let Some(Handled::Decoded(decoded)) = self.pump(TypeFilter::Any)? {
                if decoded == type_code {
                    debug!(
                        "Sensor[{}]: reply to 0x{:04X} after {} ms",
                        self.metrics.sensor(), type_code, elapsed
                    );
                    self.metrics.request_answered(type_code, elapsed);
                    return Ok(());
                }
            }
        }
    }

    /// Send a device command and wait for its reply with the default deadline.
    pub fn request_command(&mut self, command: &Command) -> SensorResult<()> {
        let timeout_ms = self.request_timeout_ms;
        self.request(command.type_code(), &command.payload(), timeout_ms)
    }

    /// One busy-poll step: read at most one byte and feed it through.
    fn pump(&mut self, filter: TypeFilter) -> SensorResult<Option<Handled>> {
        if self.link.available()? == 0 {
            std::thread::yield_now();
            return Ok(None);
        }
        match self.link.read_byte()? {
            Some(byte) => Ok(self.feed(byte, filter)),
            None => Ok(None),
        }
    }

    fn feed(&mut self, byte: u8, filter: TypeFilter) -> Option<Handled> {
        self.stats.bytes_received += 1;
        self.metrics.bytes_received(1);
        let candidate = self.sync.push_byte(byte)?;
        Some(self.handle_candidate(&candidate, filter))
    }

    fn handle_candidate(&mut self, candidate: &[u8], filter: TypeFilter) -> Handled {
        match self.decode_candidate(candidate, filter) {
            Ok(decoded) => {
                let type_code = decoded.type_code;
                trace!(
                    "Sensor[{}]: RX 0x{:04X} {:?} valid={}",
                    self.metrics.sensor(),
                    type_code,
                    decoded.reading,
                    decoded.valid
                );
                if !decoded.valid {
                    self.metrics.reading_invalid(&decoded.reading.kind().to_string());
                }
                self.store.store(decoded.reading, decoded.valid);
                Handled::Decoded(type_code)
            }
            Err(err) => {
                trace!(
                    "Sensor[{}]: dropped frame ({}): {}",
                    self.metrics.sensor(),
                    err,
                    hex::encode(candidate)
                );
                if err.is_decode_error() {
                    self.stats.decode_failures += 1;
                    self.metrics.decode_failure(err.reason());
                } else {
                    self.stats.frames_rejected += 1;
                    self.metrics.frame_rejected(err.reason());
                }
                Handled::Rejected
            }
        }
    }

    fn decode_candidate(
        &mut self,
        candidate: &[u8],
        filter: TypeFilter,
    ) -> Result<Decoded, ProtocolError> {
        let frame = validate(candidate, filter)?;
        self.stats.frames_accepted += 1;
        self.metrics.frame_accepted(frame.type_code);
        Ok(self.registry.decode(frame.type_code, frame.payload)?)
    }
}

impl<S, C, R> std::fmt::Debug for Sensor<S, C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sensor")
            .field("name", &self.metrics.sensor())
            .field("profile", &self.registry.profile().name())
            .field("next_sequence_id", &self.next_sequence_id)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
