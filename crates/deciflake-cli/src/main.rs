mod harness;

use clap::Parser;
use harness::config::{CliArgs, Config, Task};
use harness::telemetry::init_logging;
use harness::{decompose, generate, selftest};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = Config::try_from(args)?;

    init_logging(config.log_format)?;

    if cfg!(debug_assertions) {
        tracing::debug!("Starting with full config: {:#?}", config);
    }

    match &config.task {
        Task::Generate(task) => generate::run(task, config.epoch),
        Task::Decompose(task) => decompose::run(task, config.epoch),
        Task::Selftest(task) => selftest::run(task, config.epoch),
    }
}
