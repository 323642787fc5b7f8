use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use reward_cli::{write_json, RootOutput};

use crate::TreeArgs;

/// Build the Merkle tree and write its root
#[derive(Args, Debug)]
pub struct Cli {
    #[command(flatten)]
    tree: TreeArgs,

    /// Output file for the Merkle root
    #[arg(short, long, default_value = "merkle-output.json")]
    output: PathBuf,
}

pub fn run(args: Cli) -> Result<()> {
    let tree = args.tree.load()?;
    let output = RootOutput::from_tree(&tree);

    info!(path = ?args.output, "Writing Merkle root");
    write_json(&args.output, &output).context("Failed to write root file")?;

    println!("Merkle root: {}", output.root);
    Ok(())
}
