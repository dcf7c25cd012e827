//! Log output for the `deciflake` binary.
//!
//! Events go to stderr so stdout carries nothing but identifiers and can be
//! piped straight into another program. The filter is read from `RUST_LOG`
//! and defaults to `info`; `RUST_LOG=deciflake=debug` additionally shows how
//! each node was seeded.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::harness::config::LogFormat;

pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    let layer = || {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_target(false)
            .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
            .with_file(true)
    };

    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()));

    match format {
        LogFormat::Pretty => registry.with(layer().pretty()).try_init()?,
        LogFormat::Compact => registry.with(layer().compact()).try_init()?,
    }

    Ok(())
}
