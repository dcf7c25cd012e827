use core::time::Duration;
use std::io::{BufWriter, Write};

use crate::harness::{config::DecomposeConfig, output::write_id};

pub fn run(config: &DecomposeConfig, epoch: Duration) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for id in &config.ids {
        write_id(&mut out, id, config.format, epoch)?;
    }
    out.flush()?;
    Ok(())
}
