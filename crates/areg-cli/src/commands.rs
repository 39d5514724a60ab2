use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::Context;
use areg_contract::{AssetLedger, ContractResult, TransactionContext};
use areg_store::InMemoryWorldState;
use areg_types::Asset;
use colored::Colorize;
use fs2::FileExt;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::cli::*;
use crate::config::CliConfig;

/// What a command did, ready to be rendered.
#[derive(Debug, PartialEq, Eq)]
pub enum Report {
    Initialized { assets: Vec<Asset> },
    Created(Asset),
    Found(Asset),
    Deleted { id: String },
    Exists { id: String, exists: bool },
    Listed(Vec<Asset>),
}

pub fn run_command(cli: Cli, config: &CliConfig) -> anyhow::Result<()> {
    let report = execute(cli.command, config)?;
    println!("{}", render(&report, cli.format));
    Ok(())
}

/// Load world state, run the command as one transaction, and save the
/// snapshot if the command wrote anything.
///
/// The state file's lock is held from load through save. Mutating commands
/// take it exclusively, so concurrent `areg` processes sharing one snapshot
/// apply their transactions one after another.
pub fn execute(command: Command, config: &CliConfig) -> anyhow::Result<Report> {
    let writes = command.mutates();
    let _lock = StateLock::acquire(&config.state_file, writes)?;
    let state = InMemoryWorldState::open_snapshot(&config.state_file).with_context(|| {
        format!("failed to load world state from {}", config.state_file.display())
    })?;
    let ledger = AssetLedger::new();

    match command {
        Command::Init(_) => {
            transact(&state, config, writes, |ctx| ledger.init_ledger(ctx))?;
            Ok(Report::Initialized {
                assets: areg_contract::seed_assets(),
            })
        }
        Command::Create(args) => {
            let content_hash = match (&args.content_hash, &args.file) {
                (_, Some(path)) => hash_file(path)?,
                (Some(hash), None) => hash.clone(),
                (None, None) => anyhow::bail!("either a content hash or --file is required"),
            };
            transact(&state, config, writes, |ctx| {
                ledger.create_asset(ctx, &args.id, &args.owner, &content_hash)
            })?;
            Ok(Report::Created(Asset::new(args.id, args.owner, content_hash)))
        }
        Command::Query(args) => {
            let asset = transact(&state, config, writes, |ctx| ledger.query_asset(ctx, &args.id))?;
            Ok(Report::Found(asset))
        }
        Command::Delete(args) => {
            transact(&state, config, writes, |ctx| ledger.delete_asset(ctx, &args.id))?;
            Ok(Report::Deleted { id: args.id })
        }
        Command::Exists(args) => {
            let exists = transact(&state, config, writes, |ctx| ledger.asset_exists(ctx, &args.id))?;
            Ok(Report::Exists { id: args.id, exists })
        }
        Command::List(_) => {
            let assets = transact(&state, config, writes, |ctx| ledger.get_all_assets(ctx))?;
            Ok(Report::Listed(assets))
        }
    }
}

fn transact<T>(
    state: &InMemoryWorldState,
    config: &CliConfig,
    writes: bool,
    f: impl FnOnce(&dyn TransactionContext) -> ContractResult<T>,
) -> anyhow::Result<T> {
    let tx_id = Uuid::now_v7().to_string();
    let value = state
        .transact(tx_id.as_str(), |tx| f(tx))
        .with_context(|| format!("transaction {tx_id} failed"))?;
    if writes {
        state.save_snapshot(&config.state_file).with_context(|| {
            format!("failed to save world state to {}", config.state_file.display())
        })?;
    }
    Ok(value)
}

/// Advisory lock on `<state file>.lock`, released when dropped.
struct StateLock {
    file: File,
    path: PathBuf,
}

impl StateLock {
    fn acquire(state_file: &Path, exclusive: bool) -> anyhow::Result<Self> {
        let path = lock_path(state_file);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("failed to open lock file {}", path.display()))?;
        let locked = if exclusive {
            FileExt::lock_exclusive(&file)
        } else {
            FileExt::lock_shared(&file)
        };
        locked.with_context(|| format!("failed to lock {}", path.display()))?;
        debug!(path = %path.display(), exclusive, "state lock acquired");
        Ok(Self { file, path })
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(path = %self.path.display(), error = %e, "state unlock failed");
        }
    }
}

fn lock_path(state_file: &Path) -> PathBuf {
    let mut name = OsString::from(state_file.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// BLAKE3 digest of a file, hex encoded.
fn hash_file(path: &Path) -> anyhow::Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = blake3::Hasher::new();
    std::io::copy(&mut file, &mut hasher)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let digest = hex::encode(hasher.finalize().as_bytes());
    debug!(path = %path.display(), digest = %digest, "hashed content file");
    Ok(digest)
}

pub fn render(report: &Report, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => render_json(report).to_string(),
        OutputFormat::Text => render_text(report),
    }
}

fn render_json(report: &Report) -> serde_json::Value {
    match report {
        Report::Initialized { assets } => json!({ "initialized": assets }),
        Report::Created(asset) => json!({ "created": asset }),
        Report::Found(asset) => json!(asset),
        Report::Deleted { id } => json!({ "deleted": id }),
        Report::Exists { id, exists } => json!({ "id": id, "exists": exists }),
        Report::Listed(assets) => json!(assets),
    }
}

fn render_text(report: &Report) -> String {
    match report {
        Report::Initialized { assets } => format!(
            "{} Ledger initialized with {} assets",
            "✓".green().bold(),
            assets.len().to_string().bold()
        ),
        Report::Created(asset) => format!(
            "{} Created asset {}\n{}",
            "✓".green().bold(),
            asset.id.yellow(),
            asset_lines(asset)
        ),
        Report::Found(asset) => format!("Asset {}\n{}", asset.id.yellow().bold(), asset_lines(asset)),
        Report::Deleted { id } => format!("{} Deleted asset {}", "✓".green().bold(), id.yellow()),
        Report::Exists { id, exists: true } => format!("Asset {} {}", id.yellow(), "exists".green()),
        Report::Exists { id, exists: false } => {
            format!("Asset {} {}", id.yellow(), "does not exist".red())
        }
        Report::Listed(assets) if assets.is_empty() => "No assets.".to_string(),
        Report::Listed(assets) => assets
            .iter()
            .map(|a| format!("{}  {}  {}", a.id.yellow(), a.owner.bold(), a.content_hash.dimmed()))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn asset_lines(asset: &Asset) -> String {
    format!("  Owner: {}\n  Hash:  {}", asset.owner.bold(), asset.content_hash.cyan())
}
