use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "areg",
    about = "Asset Registry: run registry operations against a local world state",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// World-state snapshot file (overrides the config file)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write the bootstrap asset set
    Init(InitArgs),
    /// Register a new asset
    Create(CreateArgs),
    /// Show one asset
    Query(QueryArgs),
    /// Remove an asset
    Delete(DeleteArgs),
    /// Check whether an asset id is taken
    Exists(ExistsArgs),
    /// List every asset
    List(ListArgs),
}

impl Command {
    /// Whether the command writes world state.
    pub fn mutates(&self) -> bool {
        matches!(self, Command::Init(_) | Command::Create(_) | Command::Delete(_))
    }
}

#[derive(Args)]
pub struct InitArgs {}

#[derive(Args)]
pub struct CreateArgs {
    pub id: String,
    pub owner: String,
    /// Opaque content hash recorded with the asset
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub content_hash: Option<String>,
    /// Hash this file (BLAKE3, hex) and record the digest
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct QueryArgs {
    pub id: String,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub id: String,
}

#[derive(Args)]
pub struct ExistsArgs {
    pub id: String,
}

#[derive(Args)]
pub struct ListArgs {}
