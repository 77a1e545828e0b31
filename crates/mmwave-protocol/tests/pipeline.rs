//! End-to-end tests of the receive pipeline: bytes in, cached readings out.

use mmwave_protocol::*;

/// Run a byte stream through synchronizer, validator and decoder.
///
/// Returns the accepted frames as `(type_code, payload)` and the number of
/// candidates that failed validation.
fn accepted_frames(sync: &mut FrameSynchronizer, chunks: &[&[u8]]) -> (Vec<(u16, Vec<u8>)>, usize) {
    let mut accepted = Vec::new();
    let mut rejected = 0;
    for chunk in chunks {
        for candidate in sync.push(chunk) {
            match validate(&candidate, TypeFilter::Any) {
                Ok(frame) => accepted.push((frame.type_code, frame.payload.to_vec())),
                Err(_) => rejected += 1,
            }
        }
    }
    (accepted, rejected)
}

/// Deterministic byte noise.
fn noise(len: usize, mut state: u32) -> Vec<u8> {
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect()
}

fn mixed_stream() -> Vec<u8> {
    let mut stream = noise(23, 7);
    stream.extend(encode_frame(1, TYPE_BREATH_RATE, &15.0f32.to_le_bytes()).unwrap());
    stream.extend(encode_frame(2, TYPE_HEART_RATE, &[SOF_BYTE, SOF_BYTE, SOF_BYTE, 0x42]).unwrap());
    let mut corrupted = encode_frame(3, TYPE_HEART_RATE, &70.0f32.to_le_bytes()).unwrap();
    let last = corrupted.len() - 1;
    corrupted[last] ^= 0x10;
    stream.extend(corrupted);
    stream.extend(noise(40, 99));
    stream.extend(encode_frame(4, TYPE_HUMAN_PRESENCE, &[1]).unwrap());
    stream.extend(encode_frame(5, TYPE_RADAR_PARAMETERS, &[]).unwrap());
    stream
}

#[test]
fn test_streaming_equivalence() {
    let stream = mixed_stream();
    let whole = accepted_frames(&mut FrameSynchronizer::new(), &[&stream]);

    let bytes: Vec<&[u8]> = stream.chunks(1).collect();
    assert_eq!(accepted_frames(&mut FrameSynchronizer::new(), &bytes), whole);

    for size in [2, 3, 5, 7, 13, 64] {
        let chunks: Vec<&[u8]> = stream.chunks(size).collect();
        assert_eq!(
            accepted_frames(&mut FrameSynchronizer::new(), &chunks),
            whole,
            "chunk size {}",
            size
        );
    }
}

#[test]
fn test_noise_only_never_panics() {
    for seed in 0..32 {
        let stream = noise(2048, seed);
        let mut sync = FrameSynchronizer::new();
        let registry = DecoderRegistry::new(DeviceProfile::mr60fda2());
        for candidate in sync.push(&stream) {
            if let Ok(frame) = validate(&candidate, TypeFilter::Any) {
                let _ = registry.decode(frame.type_code, frame.payload);
            }
        }
    }
}

#[test]
fn test_payload_checksum_bit_flip_never_decoded() {
    let frame = encode_frame(0, TYPE_BREATH_RATE, &1.0f32.to_le_bytes()).unwrap();
    let last = frame.len() - 1;
    for bit in 0..8 {
        let mut corrupted = frame.clone();
        corrupted[last] ^= 1 << bit;
        let mut sync = FrameSynchronizer::new();
        let (accepted, rejected) = accepted_frames(&mut sync, &[&corrupted]);
        assert!(accepted.is_empty());
        assert_eq!(rejected, 1);
    }
}

#[test]
fn test_breath_rate_scenario() {
    let registry = DecoderRegistry::new(DeviceProfile::mr60bha2());
    let mut sync = FrameSynchronizer::new();
    let mut cache = ReadingCache::new();

    let bytes = [
        0x01, 0x00, 0x00, 0x00, 0x04, 0x0A, 0x14, 0xE4, 0x00, 0x00, 0x80, 0x3F, 0x40,
    ];
    for candidate in sync.push(&bytes) {
        let frame = validate(&candidate, TypeFilter::Any).unwrap();
        let decoded = registry.decode(frame.type_code, frame.payload).unwrap();
        cache.store(decoded.reading, decoded.valid);
    }

    assert!(cache.is_valid(ReadingKind::BreathRate));
    assert_eq!(cache.breath_rate(), Some(1.0));
    assert_eq!(cache.breath_rate(), None);
}

#[test]
fn test_big_endian_float_bytes_are_not_one() {
    // 3F 80 00 00 is 1.0 written big-endian. Payload fields are little-endian,
    // so the same four bytes decode to the subnormal 0x0000803F instead.
    let registry = DecoderRegistry::new(DeviceProfile::mr60bha2());
    let mut sync = FrameSynchronizer::new();
    let mut cache = ReadingCache::new();

    let bytes = [
        0x01, 0x00, 0x00, 0x00, 0x04, 0x0A, 0x14, 0xE4, 0x3F, 0x80, 0x00, 0x00, 0x40,
    ];
    let candidates = sync.push(&bytes);
    assert_eq!(candidates.len(), 1);
    let frame = validate(&candidates[0], TypeFilter::Any).unwrap();
    assert_eq!(frame.payload, &[0x3F, 0x80, 0x00, 0x00]);
    let decoded = registry.decode(frame.type_code, frame.payload).unwrap();
    cache.store(decoded.reading, decoded.valid);

    assert_eq!(f32::from_be_bytes([0x3F, 0x80, 0x00, 0x00]), 1.0);
    let rate = cache.breath_rate().unwrap();
    assert_eq!(rate.to_bits(), 0x0000_803F);
    assert_ne!(rate, 1.0);
}

#[test]
fn test_short_payload_before_new_marker() {
    // Header declares 4 payload bytes but only 3 arrive before the next frame.
    let header = [0x01, 0x00, 0x00, 0x00, 0x04, 0x0A, 0x14, 0xE4];
    assert_eq!(checksum(&header[..7]), header[7]);

    let next = encode_frame(0, TYPE_BREATH_RATE, &1.0f32.to_le_bytes()).unwrap();
    let mut stream = header.to_vec();
    stream.extend_from_slice(&[0x10, 0x20, 0x30]);
    stream.extend_from_slice(&next);

    let mut sync = FrameSynchronizer::new();
    let (accepted, rejected) = accepted_frames(&mut sync, &[&stream]);
    assert!(accepted.is_empty());
    assert_eq!(rejected, 1);
    assert!(!sync.is_framing());

    let later = encode_frame(1, TYPE_HEART_RATE, &64.0f32.to_le_bytes()).unwrap();
    let (accepted, rejected) = accepted_frames(&mut sync, &[&later]);
    assert_eq!(accepted, vec![(TYPE_HEART_RATE, 64.0f32.to_le_bytes().to_vec())]);
    assert_eq!(rejected, 0);
}

#[test]
fn test_unknown_type_keeps_sync() {
    let registry = DecoderRegistry::new(DeviceProfile::mr60bha2());
    let mut stream = encode_frame(0, 0x7777, &[1, 2, 3]).unwrap();
    stream.extend(encode_frame(1, TYPE_HEART_RATE, &66.0f32.to_le_bytes()).unwrap());

    let mut sync = FrameSynchronizer::new();
    let mut results = Vec::new();
    for candidate in sync.push(&stream) {
        let frame = validate(&candidate, TypeFilter::Any).unwrap();
        results.push(registry.decode(frame.type_code, frame.payload).map(|d| d.reading));
    }
    assert_eq!(
        results,
        vec![
            Err(DecodeError::UnknownType(0x7777)),
            Ok(Reading::HeartRate(66.0)),
        ]
    );
}

#[test]
fn test_count_overrun_in_valid_frame() {
    let registry = DecoderRegistry::new(DeviceProfile::mr60fda2());
    let mut payload = 5i32.to_le_bytes().to_vec();
    payload.extend_from_slice(&[0u8; 20]);
    let bytes = encode_frame(0, TYPE_POINT_CLOUD_TARGET_INFO, &payload).unwrap();

    let mut sync = FrameSynchronizer::new();
    let candidates = sync.push(&bytes);
    let frame = validate(&candidates[0], TypeFilter::Any).unwrap();
    assert_eq!(
        registry.decode(frame.type_code, frame.payload),
        Err(DecodeError::Truncated {
            type_code: TYPE_POINT_CLOUD_TARGET_INFO,
            needed: 4 + 5 * 20,
            available: 24,
        })
    );
}

#[test]
fn test_fixed_layout_round_trip() {
    let bha2 = DecoderRegistry::new(DeviceProfile::mr60bha2());
    let fda2 = DecoderRegistry::new(DeviceProfile::mr60fda2());

    let cases = [
        (
            &bha2,
            TYPE_HEART_BREATH_PHASE,
            Reading::HeartBreathPhases(HeartBreathPhases {
                total_phase: 0.25,
                breath_phase: -0.5,
                heart_phase: 0.125,
            }),
        ),
        (&bha2, TYPE_BREATH_RATE, Reading::BreathRate(17.5)),
        (&bha2, TYPE_HEART_RATE, Reading::HeartRate(72.0)),
        (
            &bha2,
            TYPE_HEART_BREATH_DISTANCE,
            Reading::Distance(Distance { flag: 1, range: 0.75 }),
        ),
        (&bha2, TYPE_HUMAN_PRESENCE, Reading::HumanPresence(true)),
        (&fda2, TYPE_FALL_DETECTION, Reading::FallDetected(true)),
        (
            &fda2,
            TYPE_RADAR_PARAMETERS,
            Reading::RadarParameters(RadarParameters {
                height: 2.2,
                threshold: 0.6,
                sensitivity: 3,
                alarm_area: AlarmArea {
                    x_left: 0.5,
                    x_right: 1.0,
                    z_front: 1.5,
                    z_back: 2.0,
                },
            }),
        ),
        (
            &fda2,
            TYPE_ALARM_PARAMETERS,
            Reading::Acknowledgement(Acknowledgement {
                command: TYPE_ALARM_PARAMETERS,
                accepted: true,
            }),
        ),
    ];

    for (registry, type_code, reading) in cases {
        let payload = registry.encode(type_code, &reading).unwrap();
        let decoded = registry.decode(type_code, &payload).unwrap();
        assert_eq!(decoded.reading, reading, "type 0x{:04X}", type_code);
    }
}

#[test]
fn test_type_filter_rejects_before_decode() {
    let bytes = encode_frame(0, TYPE_HEART_RATE, &[0xAA]).unwrap();
    let mut sync = FrameSynchronizer::new();
    let candidates = sync.push(&bytes);
    assert!(matches!(
        validate(&candidates[0], TypeFilter::Only(TYPE_BREATH_RATE)),
        Err(FrameError::UnexpectedType { .. })
    ));
}
