#![forbid(unsafe_code)]
#![allow(unreachable_pub)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use reward_cli::logging::{self, LogLevel};
use reward_cli::{IdentifierKind, RecipientList, RewardTree, TreeOptions};

mod build_tree;
mod claim;
mod proofs;
mod verify;

#[derive(Parser, Debug)]
#[command(name = "reward")]
#[command(about = "Merkle root and claim proof tools for quota rewards", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    BuildTree(build_tree::Cli),
    Claim(claim::Cli),
    Proofs(proofs::Cli),
    Verify(verify::Cli),
}

/// Options shared by every command that builds a tree from a recipient list.
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Recipient list JSON: {"recipients": [{"id": "..", "value": ".."}]}
    #[arg(short, long)]
    pub input: PathBuf,

    /// On-chain type of the recipient identifier
    #[arg(short, long, value_enum, default_value_t = IdentifierKind::Id)]
    pub kind: IdentifierKind,

    /// Log duplicate leaves or recipients instead of failing
    #[arg(long)]
    pub allow_duplicates: bool,
}

impl TreeArgs {
    pub fn load(&self) -> Result<RewardTree> {
        info!(path = ?self.input, "Reading recipients");
        let list = RecipientList::load(&self.input)
            .with_context(|| format!("Failed to load recipients from {:?}", self.input))?;

        let options = TreeOptions {
            kind: self.kind,
            allow_duplicates: self.allow_duplicates,
        };
        RewardTree::build(list.recipients, options).context("Failed to build Merkle tree")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LogLevel::Warn
    } else {
        LogLevel::from_verbosity(cli.verbose)
    };
    logging::try_init(level).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::BuildTree(args) => build_tree::run(args)?,
        Commands::Claim(args) => claim::run(args)?,
        Commands::Proofs(args) => proofs::run(args)?,
        Commands::Verify(args) => verify::run(args)?,
    }

    Ok(())
}
