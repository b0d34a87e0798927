//! voteroll: compute voters and electoral registers for a meeting snapshot.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};

use voteroll_policies::PolicyKind;
use voteroll_service::{init_logging, MeetingService, ServiceConfig};
use voteroll_store_memory::{MeetingSnapshot, MemoryStore};
use voteroll_types::{MeetingId, SystemClock};

#[derive(Parser)]
#[command(name = "voteroll", about = "Electoral register computation for meetings")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "VOTEROLL_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "VOTEROLL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "VOTEROLL_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the voter -> weight mapping of the meeting's policy.
    Voters {
        /// Meeting snapshot (JSON). Defaults to `snapshot_path` from the config.
        #[arg(long, env = "VOTEROLL_SNAPSHOT")]
        snapshot: Option<PathBuf>,

        /// Write each membership's assigned votes back into the snapshot.
        #[arg(long)]
        update_memberships: bool,
    },
    /// Create the meeting's electoral register, or reuse the latest one if
    /// it is still current.
    Register {
        #[arg(long, env = "VOTEROLL_SNAPSHOT")]
        snapshot: Option<PathBuf>,

        /// Create a new register even if the latest one is current.
        #[arg(long)]
        force: bool,

        /// Save the updated snapshot (new register, membership votes).
        #[arg(long)]
        write: bool,
    },
    /// List the registered policies.
    Policies,
}

fn snapshot_path(flag: Option<PathBuf>, config: &ServiceConfig) -> anyhow::Result<PathBuf> {
    match flag.or_else(|| config.snapshot_path.clone()) {
        Some(path) => Ok(path),
        None => bail!("no snapshot given: pass --snapshot or set snapshot_path in the config"),
    }
}

fn load(
    path: &Path,
    config: &ServiceConfig,
) -> anyhow::Result<(MeetingService<MemoryStore, SystemClock>, MeetingId)> {
    let snapshot = MeetingSnapshot::read_file(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let store = MemoryStore::new();
    let meeting = store.load_snapshot(snapshot)?;
    tracing::info!(%meeting, snapshot = %path.display(), "meeting loaded");
    Ok((MeetingService::new(store, SystemClock, config), meeting))
}

fn save(
    service: &MeetingService<MemoryStore, SystemClock>,
    meeting: MeetingId,
    path: &Path,
) -> anyhow::Result<()> {
    service.store().snapshot(meeting)?.write_file(path)?;
    tracing::info!(%meeting, snapshot = %path.display(), "snapshot written");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    init_logging(config.log_format()?, &config.log_level);

    match cli.command {
        Command::Voters {
            snapshot,
            update_memberships,
        } => {
            let path = snapshot_path(snapshot, &config)?;
            let (service, meeting) = load(&path, &config)?;
            let voters = service.get_voters(meeting, update_memberships)?;
            println!("{}", serde_json::to_string_pretty(&voters)?);
            if update_memberships {
                save(&service, meeting, &path)?;
            }
        }
        Command::Register {
            snapshot,
            force,
            write,
        } => {
            let path = snapshot_path(snapshot, &config)?;
            let (service, meeting) = load(&path, &config)?;
            let register = service.create_register(meeting, force)?;
            println!("{}", serde_json::to_string_pretty(&register)?);
            if write {
                save(&service, meeting, &path)?;
            }
        }
        Command::Policies => {
            for info in PolicyKind::ALL {
                let weights = if info.kind.handles_vote_weight() {
                    "weighted"
                } else {
                    "one vote"
                };
                let transfers = info.kind.vote_transfer_policy().unwrap_or("-");
                println!(
                    "{:<20} {:<9} {:<15} {}",
                    info.name, weights, transfers, info.title
                );
            }
        }
    }
    Ok(())
}
