use core::time::Duration;

use anyhow::bail;
use clap::{Args, Parser, Subcommand, ValueEnum};
use deciflake::{DeciflakeId, FixedIdentity, IdentitySource, RandomIdentity};

/// Command-line interface of the `deciflake` binary.
///
/// Every option can also be set through the environment variable named next
/// to it. A `.env` file in the working directory is loaded first.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "deciflake",
    version,
    about = "Generate and inspect coordination-free 20-digit decimal IDs"
)]
pub struct CliArgs {
    /// Log line layout. Logs always go to stderr.
    ///
    /// Environment variable: `DECIFLAKE_LOG_FORMAT`
    #[arg(
        long,
        env = "DECIFLAKE_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty,
        global = true
    )]
    pub log_format: LogFormat,

    /// Clock epoch in milliseconds since the Unix epoch.
    ///
    /// Every node sharing an ID namespace must use the same epoch.
    ///
    /// Environment variable: `DECIFLAKE_EPOCH_MS`
    #[arg(long, env = "DECIFLAKE_EPOCH_MS", default_value_t = 0, global = true)]
    pub epoch_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start one node and print identifiers to stdout.
    Generate(GenerateArgs),
    /// Split identifiers into their time, identity and sequence fields.
    Decompose(DecomposeArgs),
    /// Run several nodes side by side and check for duplicate identifiers.
    Selftest(SelftestArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Number of identifiers to print.
    ///
    /// Environment variable: `DECIFLAKE_COUNT`
    #[arg(short = 'n', long, env = "DECIFLAKE_COUNT", default_value_t = 1)]
    pub count: usize,

    /// Fixed node identity. A random one is drawn when omitted.
    ///
    /// Environment variable: `DECIFLAKE_IDENTITY`
    #[arg(long, env = "DECIFLAKE_IDENTITY")]
    pub identity: Option<u64>,

    /// Upper bound (inclusive) for a randomly drawn identity.
    ///
    /// Environment variable: `DECIFLAKE_IDENTITY_BOUND`
    #[arg(long, env = "DECIFLAKE_IDENTITY_BOUND", default_value_t = 1024)]
    pub identity_bound: u64,

    /// Last suffix issued by the previous incarnation of this node.
    ///
    /// Supplying it warm-starts the sequence right after that suffix.
    ///
    /// Environment variable: `DECIFLAKE_RECOVERY_HINT`
    #[arg(long, env = "DECIFLAKE_RECOVERY_HINT")]
    pub recovery_hint: Option<u64>,

    /// Output layout for each identifier.
    ///
    /// Environment variable: `DECIFLAKE_FORMAT`
    #[arg(long, env = "DECIFLAKE_FORMAT", value_enum, default_value_t = OutputFormat::Plain)]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct DecomposeArgs {
    /// Identifiers to split, as decimal text.
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Output layout for each identifier.
    #[arg(long, value_enum, default_value_t = OutputFormat::Parts)]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct SelftestArgs {
    /// Number of nodes to run.
    ///
    /// Environment variable: `DECIFLAKE_SELFTEST_NODES`
    #[arg(long, env = "DECIFLAKE_SELFTEST_NODES", default_value_t = 10)]
    pub nodes: usize,

    /// Identifiers to draw from every node.
    ///
    /// Environment variable: `DECIFLAKE_SELFTEST_IDS`
    #[arg(long, env = "DECIFLAKE_SELFTEST_IDS", default_value_t = 100_000)]
    pub ids: usize,

    /// Drive each node from its own thread instead of round-robin.
    #[arg(long, default_value_t = false)]
    pub threaded: bool,

    /// Draw node identities at random from `0..=identity_bound` instead of
    /// numbering nodes from zero. Nodes that draw the same identity may
    /// collide.
    #[arg(long, default_value_t = false)]
    pub random_identities: bool,

    /// Upper bound (inclusive) for randomly drawn identities.
    #[arg(long, default_value_t = 1024)]
    pub identity_bound: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Zero-padded decimal, one per line.
    Plain,
    /// Decimal followed by its fields.
    Parts,
    /// One JSON object per line.
    Json,
}

/// Where a node gets its identity from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityChoice {
    Fixed(FixedIdentity),
    Random(RandomIdentity),
}

impl IdentitySource for IdentityChoice {
    fn assign(&self, max_identity: u64) -> u64 {
        match self {
            Self::Fixed(source) => source.assign(max_identity),
            Self::Random(source) => source.assign(max_identity),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_format: LogFormat,
    pub epoch: Duration,
    pub task: Task,
}

#[derive(Debug, Clone)]
pub enum Task {
    Generate(GenerateConfig),
    Decompose(DecomposeConfig),
    Selftest(SelftestConfig),
}

#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub count: usize,
    pub identity: IdentityChoice,
    pub recovery_hint: Option<u64>,
    pub format: OutputFormat,
}

#[derive(Debug, Clone)]
pub struct DecomposeConfig {
    pub ids: Vec<DeciflakeId>,
    pub format: OutputFormat,
}

#[derive(Debug, Clone)]
pub struct SelftestConfig {
    pub nodes: usize,
    pub ids: usize,
    pub threaded: bool,
    pub identities: Vec<IdentityChoice>,
}

impl TryFrom<CliArgs> for Config {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let max_identity = DeciflakeId::max_identity();
        let modulus = DeciflakeId::sequence_modulus();

        let task = match args.command {
            Command::Generate(args) => {
                if args.count == 0 {
                    bail!("DECIFLAKE_COUNT must be greater than 0");
                }

                let identity = match args.identity {
                    Some(identity) if identity > max_identity => bail!(
                        "DECIFLAKE_IDENTITY ({identity}) exceeds the identity field (max = {max_identity})"
                    ),
                    Some(identity) => IdentityChoice::Fixed(FixedIdentity(identity)),
                    None => random_identity(args.identity_bound, max_identity)?,
                };

                if let Some(hint) = args.recovery_hint {
                    if hint >= modulus {
                        bail!("DECIFLAKE_RECOVERY_HINT ({hint}) must be below {modulus}");
                    }
                }

                Task::Generate(GenerateConfig {
                    count: args.count,
                    identity,
                    recovery_hint: args.recovery_hint,
                    format: args.format,
                })
            }
            Command::Decompose(args) => {
                let ids = args
                    .ids
                    .iter()
                    .map(|text| {
                        text.trim()
                            .parse::<DeciflakeId>()
                            .map_err(|e| anyhow::anyhow!("invalid identifier {text:?}: {e}"))
                    })
                    .collect::<anyhow::Result<Vec<_>>>()?;

                Task::Decompose(DecomposeConfig {
                    ids,
                    format: args.format,
                })
            }
            Command::Selftest(args) => {
                if args.nodes == 0 {
                    bail!("DECIFLAKE_SELFTEST_NODES must be greater than 0");
                }
                if args.ids == 0 {
                    bail!("DECIFLAKE_SELFTEST_IDS must be greater than 0");
                }

                let identities = if args.random_identities {
                    let source = random_identity(args.identity_bound, max_identity)?;
                    vec![source; args.nodes]
                } else {
                    let nodes = args.nodes as u64;
                    if nodes > max_identity + 1 {
                        bail!(
                            "DECIFLAKE_SELFTEST_NODES ({nodes}) exceeds available identity space (max = {})",
                            max_identity + 1
                        );
                    }
                    (0..nodes)
                        .map(|identity| IdentityChoice::Fixed(FixedIdentity(identity)))
                        .collect()
                };

                Task::Selftest(SelftestConfig {
                    nodes: args.nodes,
                    ids: args.ids,
                    threaded: args.threaded,
                    identities,
                })
            }
        };

        Ok(Self {
            log_format: args.log_format,
            epoch: Duration::from_millis(args.epoch_ms),
            task,
        })
    }
}

fn random_identity(bound: u64, max_identity: u64) -> anyhow::Result<IdentityChoice> {
    if bound > max_identity {
        bail!("DECIFLAKE_IDENTITY_BOUND ({bound}) exceeds the identity field (max = {max_identity})");
    }
    Ok(IdentityChoice::Random(RandomIdentity::with_bound(bound)))
}
