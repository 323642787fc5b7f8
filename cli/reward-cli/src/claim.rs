use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use reward_cli::{write_json, RecipientProof};

use crate::TreeArgs;

/// Generate the Merkle proof for one recipient
#[derive(Args, Debug)]
pub struct Cli {
    #[command(flatten)]
    tree: TreeArgs,

    /// Recipient identifier (numeric id or address, per --kind)
    #[arg(long)]
    id: String,

    /// Recipient quota; must equal the recorded quota
    #[arg(long)]
    quota: String,

    /// Output JSON file; the claim is printed to stdout either way
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: Cli) -> Result<()> {
    let tree = args.tree.load()?;

    info!(id = %args.id, "Generating Merkle proof");
    let (leaf_index, proof) = tree
        .prove_claim(&args.id, &args.quota)
        .context("Failed to generate Merkle proof")?;
    if !proof.verify(&tree.leaf(leaf_index)?, &tree.root()) {
        anyhow::bail!("Generated proof for {} does not verify", args.id);
    }

    let claim = RecipientProof::new(&tree, leaf_index, &proof)?.with_root(tree.root());

    if let Some(path) = &args.output {
        info!(path = ?path, "Writing claim JSON");
        write_json(path, &claim).context("Failed to write claim file")?;
    }

    let json_output = serde_json::to_string_pretty(&claim).context("Failed to serialize JSON")?;
    println!("{json_output}");
    Ok(())
}
