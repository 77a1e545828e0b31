//! Metrics emitted by the mmWave sensor receive loop and request correlator.
//!
//! Every series is one [`SensorMetric`] variant. A [`SensorMetrics`] handle
//! owns the `sensor` and `profile` labels of one link and records through the
//! `metrics` facade, so call sites never assemble label vectors themselves.
//!
//! ```rust
//! use mmwave_metrics::{describe_metrics, SensorMetrics};
//!
//! describe_metrics();
//!
//! let mut metrics = SensorMetrics::new("bedroom", "mr60bha2");
//! metrics.frame_accepted(0x0A14);
//! metrics.request_started(0x0E08);
//! assert_eq!(metrics.in_flight(), 1);
//! metrics.request_answered(0x0E08, 12);
//! assert_eq!(metrics.in_flight(), 0);
//! ```

pub use metrics;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};

/// How a series aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

/// One series emitted per sensor link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorMetric {
    BytesReceived,
    FramesSent,
    FramesAccepted,
    FramesRejected,
    DecodeFailures,
    ReadingsInvalid,
    RequestTimeouts,
    /// Requests written to the link that have not yet been answered or timed out.
    RequestsInFlight,
    RequestLatency,
}

impl SensorMetric {
    pub const ALL: [SensorMetric; 9] = [
        SensorMetric::BytesReceived,
        SensorMetric::FramesSent,
        SensorMetric::FramesAccepted,
        SensorMetric::FramesRejected,
        SensorMetric::DecodeFailures,
        SensorMetric::ReadingsInvalid,
        SensorMetric::RequestTimeouts,
        SensorMetric::RequestsInFlight,
        SensorMetric::RequestLatency,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            SensorMetric::BytesReceived => "mmwave.link.bytes_received",
            SensorMetric::FramesSent => "mmwave.link.frames_sent",
            SensorMetric::FramesAccepted => "mmwave.frame.accepted",
            SensorMetric::FramesRejected => "mmwave.frame.rejected",
            SensorMetric::DecodeFailures => "mmwave.decode.failures",
            SensorMetric::ReadingsInvalid => "mmwave.decode.readings_invalid",
            SensorMetric::RequestTimeouts => "mmwave.request.timeouts",
            SensorMetric::RequestsInFlight => "mmwave.request.in_flight",
            SensorMetric::RequestLatency => "mmwave.request.latency_ms",
        }
    }

    pub const fn kind(self) -> MetricKind {
        match self {
            SensorMetric::RequestsInFlight => MetricKind::Gauge,
            SensorMetric::RequestLatency => MetricKind::Histogram,
            _ => MetricKind::Counter,
        }
    }

    pub const fn unit(self) -> Unit {
        match self {
            SensorMetric::BytesReceived => Unit::Bytes,
            SensorMetric::RequestLatency => Unit::Milliseconds,
            _ => Unit::Count,
        }
    }

    /// Label carried on top of `sensor` and `profile`, if any.
    pub const fn detail_label(self) -> Option<&'static str> {
        match self {
            SensorMetric::BytesReceived => None,
            SensorMetric::FramesRejected | SensorMetric::DecodeFailures => Some("reason"),
            SensorMetric::ReadingsInvalid => Some("kind"),
            _ => Some("type_code"),
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            SensorMetric::BytesReceived => "Raw bytes read from the sensor link",
            SensorMetric::FramesSent => "Command frames written to the sensor link",
            SensorMetric::FramesAccepted => "Frames that passed checksum and length validation",
            SensorMetric::FramesRejected => "Candidate frames rejected by the validator",
            SensorMetric::DecodeFailures => "Structurally valid frames whose payload failed to decode",
            SensorMetric::ReadingsInvalid => "Decoded readings marked invalid by a domain rule",
            SensorMetric::RequestTimeouts => "Requests that received no reply before the deadline",
            SensorMetric::RequestsInFlight => "Requests awaiting a reply",
            SensorMetric::RequestLatency => "Milliseconds between a request and its decoded reply",
        }
    }

    /// Register the description with the installed recorder.
    pub fn describe(self) {
        let (name, unit, description) = (self.name(), self.unit(), self.description());
        match self.kind() {
            MetricKind::Counter => describe_counter!(name, unit, description),
            MetricKind::Gauge => describe_gauge!(name, unit, description),
            MetricKind::Histogram => describe_histogram!(name, unit, description),
        }
    }
}

type Labels = Vec<(&'static str, String)>;

/// Recording handle for one sensor link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorMetrics {
    sensor: String,
    profile: String,
    in_flight: u32,
}

impl SensorMetrics {
    pub fn new(sensor: impl Into<String>, profile: impl Into<String>) -> Self {
        SensorMetrics {
            sensor: sensor.into(),
            profile: profile.into(),
            in_flight: 0,
        }
    }

    pub fn sensor(&self) -> &str {
        &self.sensor
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Requests this handle has seen started but not finished.
    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }

    pub fn bytes_received(&self, count: u64) {
        counter!(SensorMetric::BytesReceived.name(), &self.labels()).increment(count);
    }

    pub fn frame_sent(&self, type_code: u16) {
        self.count_type(SensorMetric::FramesSent, type_code);
    }

    pub fn frame_accepted(&self, type_code: u16) {
        self.count_type(SensorMetric::FramesAccepted, type_code);
    }

    /// A candidate failed validation, `reason` as in `ProtocolError::reason`.
    pub fn frame_rejected(&self, reason: &str) {
        self.count(SensorMetric::FramesRejected, reason.to_string());
    }

    pub fn decode_failure(&self, reason: &str) {
        self.count(SensorMetric::DecodeFailures, reason.to_string());
    }

    pub fn reading_invalid(&self, kind: &str) {
        self.count(SensorMetric::ReadingsInvalid, kind.to_string());
    }

    pub fn request_started(&mut self, type_code: u16) {
        self.in_flight += 1;
        gauge!(
            SensorMetric::RequestsInFlight.name(),
            &self.labels_with(SensorMetric::RequestsInFlight, type_code_label(type_code))
        )
        .increment(1.0);
    }

    /// The reply to `type_code` was decoded `latency_ms` after sending.
    pub fn request_answered(&mut self, type_code: u16, latency_ms: u64) {
        let labels = self.labels_with(SensorMetric::RequestLatency, type_code_label(type_code));
        histogram!(SensorMetric::RequestLatency.name(), &labels).record(latency_ms as f64);
        self.request_finished(type_code);
    }

    pub fn request_timed_out(&mut self, type_code: u16) {
        self.count_type(SensorMetric::RequestTimeouts, type_code);
        self.request_finished(type_code);
    }

    /// The request ended without a reply or timeout, e.g. on a link error.
    pub fn request_abandoned(&mut self, type_code: u16) {
        self.request_finished(type_code);
    }

    fn request_finished(&mut self, type_code: u16) {
        if self.in_flight == 0 {
            return;
        }
        self.in_flight -= 1;
        gauge!(
            SensorMetric::RequestsInFlight.name(),
            &self.labels_with(SensorMetric::RequestsInFlight, type_code_label(type_code))
        )
        .decrement(1.0);
    }

    fn count_type(&self, metric: SensorMetric, type_code: u16) {
        self.count(metric, type_code_label(type_code));
    }

    fn count(&self, metric: SensorMetric, detail: String) {
        counter!(metric.name(), &self.labels_with(metric, detail)).increment(1);
    }

    fn labels(&self) -> Labels {
        vec![
            ("sensor", self.sensor.clone()),
            ("profile", self.profile.clone()),
        ]
    }

    fn labels_with(&self, metric: SensorMetric, detail: String) -> Labels {
        let mut labels = self.labels();
        if let Some(key) = metric.detail_label() {
            labels.push((key, detail));
        }
        labels
    }
}

/// Format a type code the way metric labels carry it.
pub fn type_code_label(type_code: u16) -> String {
    format!("0x{:04X}", type_code)
}

/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    for metric in SensorMetric::ALL {
        metric.describe();
    }
}

/// Install a Prometheus recorder serving `/metrics` on `addr`.
#[cfg(feature = "prometheus")]
pub fn install_prometheus(
    addr: std::net::SocketAddr,
) -> Result<(), metrics_exporter_prometheus::BuildError> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    describe_metrics();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_unique_and_namespaced() {
        let names: HashSet<_> = SensorMetric::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(names.len(), SensorMetric::ALL.len());
        assert!(names.iter().all(|name| name.starts_with("mmwave.")));
    }

    #[test]
    fn test_kinds_and_units() {
        assert_eq!(SensorMetric::RequestsInFlight.kind(), MetricKind::Gauge);
        assert_eq!(SensorMetric::RequestLatency.kind(), MetricKind::Histogram);
        assert_eq!(SensorMetric::RequestLatency.unit(), Unit::Milliseconds);
        assert_eq!(SensorMetric::BytesReceived.unit(), Unit::Bytes);
        assert_eq!(SensorMetric::FramesRejected.kind(), MetricKind::Counter);
    }

    #[test]
    fn test_detail_labels() {
        let metrics = SensorMetrics::new("hallway", "mr60fda2");
        let labels = metrics.labels_with(SensorMetric::FramesRejected, "head_checksum".to_string());
        assert_eq!(
            labels,
            vec![
                ("sensor", "hallway".to_string()),
                ("profile", "mr60fda2".to_string()),
                ("reason", "head_checksum".to_string()),
            ]
        );
        let labels = metrics.labels_with(SensorMetric::BytesReceived, String::new());
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn test_in_flight_tracks_started_requests() {
        let mut metrics = SensorMetrics::new("s", "mr60fdc1");
        metrics.request_started(0x0E08);
        metrics.request_started(0x0E0A);
        assert_eq!(metrics.in_flight(), 2);
        metrics.request_timed_out(0x0E08);
        metrics.request_abandoned(0x0E0A);
        assert_eq!(metrics.in_flight(), 0);
        // a stray finish never underflows
        metrics.request_answered(0x0E08, 5);
        assert_eq!(metrics.in_flight(), 0);
    }

    #[test]
    fn test_type_code_label() {
        assert_eq!(type_code_label(0x0A15), "0x0A15");
    }

    #[test]
    fn test_describe_without_recorder() {
        describe_metrics();
    }
}
