use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use reward_cli::{write_json, RecipientProof};

use crate::TreeArgs;

/// Generate Merkle proofs for every recipient
#[derive(Args, Debug)]
pub struct Cli {
    #[command(flatten)]
    tree: TreeArgs,

    /// Output JSON file with one entry per recipient
    #[arg(short, long, default_value = "recipient-proofs.json")]
    output: PathBuf,
}

pub fn run(args: Cli) -> Result<()> {
    let tree = args.tree.load()?;
    let root = tree.root();

    let proofs = tree.proofs().context("Failed to generate Merkle proofs")?;
    let mut entries = Vec::with_capacity(proofs.len());
    for (leaf_index, proof) in proofs.iter().enumerate() {
        if !proof.verify(&tree.leaf(leaf_index)?, &root) {
            anyhow::bail!("Proof for leaf {} does not verify", leaf_index);
        }
        entries.push(RecipientProof::new(&tree, leaf_index, proof)?);

        if (leaf_index + 1) % 100_000 == 0 {
            info!(done = leaf_index + 1, "Generated proofs");
        }
    }

    info!(path = ?args.output, count = entries.len(), "Writing proofs");
    write_json(&args.output, &entries).context("Failed to write proofs file")?;

    println!("Merkle root: {}", reward_cli::hex_encode(root));
    println!("Proofs written: {}", entries.len());
    Ok(())
}
