use core::time::Duration;
use std::io::{BufWriter, ErrorKind, Write};

use deciflake::{BasicNode, DeciflakeId, MonotonicClock};

use crate::harness::{config::GenerateConfig, output::write_id};

/// Starts one node and prints `count` identifiers.
///
/// The last issued suffix is logged on exit, also when stdout is closed
/// early, so a supervisor can hand it back as `--recovery-hint`.
pub fn run(config: &GenerateConfig, epoch: Duration) -> anyhow::Result<()> {
    let clock = MonotonicClock::with_epoch(epoch)?;
    let node = BasicNode::<DeciflakeId, _>::new(config.identity, clock, config.recovery_hint)?;

    tracing::info!(
        identity = node.identity(),
        recovery_hint = ?config.recovery_hint,
        count = config.count,
        "node started"
    );

    let result = print_ids(&node, config, epoch);

    match node.last_suffix() {
        Some(last_suffix) => tracing::info!(last_suffix, "node stopped"),
        None => tracing::info!("node stopped before issuing an identifier"),
    }

    result
}

fn print_ids(
    node: &BasicNode<DeciflakeId, MonotonicClock>,
    config: &GenerateConfig,
    epoch: Duration,
) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for _ in 0..config.count {
        let id = node.next_id();
        if let Err(e) = write_id(&mut out, &id, config.format, epoch) {
            return closed_pipe_is_ok(e);
        }
    }

    out.flush().or_else(closed_pipe_is_ok)
}

// A reader such as `head` closing the pipe is a normal way to stop.
fn closed_pipe_is_ok(e: std::io::Error) -> anyhow::Result<()> {
    if e.kind() == ErrorKind::BrokenPipe {
        tracing::debug!("stdout closed");
        return Ok(());
    }
    Err(e.into())
}
