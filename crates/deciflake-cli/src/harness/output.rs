use core::time::Duration;
use std::io::Write;

use deciflake::{DeciflakeId, TICK};

use crate::harness::config::OutputFormat;

/// Milliseconds since the Unix epoch at which the identifier's tick began.
pub fn unix_millis(id: &DeciflakeId, epoch: Duration) -> u128 {
    u128::from(id.time()) * TICK.as_millis() + epoch.as_millis()
}

/// Writes one identifier in the requested layout, followed by a newline.
pub fn write_id(
    out: &mut impl Write,
    id: &DeciflakeId,
    format: OutputFormat,
    epoch: Duration,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Plain => writeln!(out, "{id}"),
        OutputFormat::Parts => writeln!(
            out,
            "{id} time={} identity={} sequence={} unix_ms={}",
            id.time(),
            id.identity(),
            id.sequence(),
            unix_millis(id, epoch)
        ),
        OutputFormat::Json => {
            let value = serde_json::json!({
                "id": id.to_string(),
                "time": id.time(),
                "identity": id.identity(),
                "sequence": id.sequence(),
                "unix_ms": unix_millis(id, epoch).to_string(),
            });
            writeln!(out, "{value}")
        }
    }
}
