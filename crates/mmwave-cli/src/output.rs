//! JSON-lines output of decoded readings.

use std::io::Write;

use mmwave_protocol::{DecodeRule, Reading, ReadingStore};
use mmwave_sensor::{ByteStream, Clock, Sensor};
use serde::Serialize;

use crate::CliError;

/// One decoded reading as printed on stdout.
#[derive(Debug, Serialize)]
pub struct ReadingLine<'a> {
    pub sensor: &'a str,
    pub type_code: String,
    pub valid: bool,
    #[serde(flatten)]
    pub reading: &'a Reading,
}

impl<'a> ReadingLine<'a> {
    pub fn new(sensor: &'a str, type_code: u16, reading: &'a Reading, valid: bool) -> Self {
        ReadingLine {
            sensor,
            type_code: mmwave_metrics::type_code_label(type_code),
            valid,
            reading,
        }
    }
}

/// Write one JSON object per line.
pub fn write_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<(), CliError> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Decode everything buffered on the link and print each reading as it lands.
///
/// Returns the number of lines written.
pub fn drain<S, C, R, W>(sensor: &mut Sensor<S, C, R>, out: &mut W) -> Result<usize, CliError>
where
    S: ByteStream,
    C: Clock,
    R: ReadingStore,
    W: Write,
{
    let mut lines = 0;
    while let Some(type_code) = sensor.poll_frame()? {
        let Some(kind) = sensor.registry().rule(type_code).map(DecodeRule::kind) else {
            continue;
        };
        if let Some((reading, valid)) = sensor.store_mut().consume_update(kind) {
            write_line(out, &ReadingLine::new(sensor.name(), type_code, &reading, valid))?;
            lines += 1;
        }
    }
    out.flush()?;
    Ok(lines)
}
