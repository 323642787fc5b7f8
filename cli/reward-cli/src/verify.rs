use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use reward_cli::{
    encode_record_leaf, hex_encode, parse_hash, Identifier, IdentifierKind, RecipientProof,
};

/// Check a claim against a published root, as the claim contract would
#[derive(Args, Debug)]
pub struct Cli {
    /// Claim JSON, or a proofs file together with --id
    #[arg(short, long)]
    proof: PathBuf,

    /// Published Merkle root
    #[arg(short, long)]
    root: String,

    /// Claimed identifier; defaults to the one in the claim
    #[arg(long)]
    id: Option<String>,

    /// Claimed quota; defaults to the one in the claim
    #[arg(long)]
    quota: Option<String>,

    /// On-chain type of the recipient identifier
    #[arg(short, long, value_enum, default_value_t = IdentifierKind::Id)]
    kind: IdentifierKind,
}

fn load_entry(path: &Path, kind: IdentifierKind, id: Option<&str>) -> Result<RecipientProof> {
    let contents = fs::read_to_string(path).context("Failed to read proof file")?;
    let value: serde_json::Value =
        serde_json::from_str(&contents).context("Failed to parse proof JSON")?;
    if !value.is_array() {
        return serde_json::from_value(value).context("Failed to parse claim JSON");
    }

    let entries: Vec<RecipientProof> =
        serde_json::from_value(value).context("Failed to parse proofs JSON")?;
    let id = id.context("--id is required to pick an entry from a proofs file")?;
    let wanted = Identifier::parse(kind, id)?;
    entries
        .into_iter()
        .find(|entry| Identifier::parse(kind, &entry.id).ok() == Some(wanted))
        .with_context(|| format!("Recipient {id} not found in {path:?}"))
}

/// Returns the verified (identifier, quota) pair.
fn check_claim(args: &Cli) -> Result<(String, String)> {
    let root = parse_hash(&args.root).context("Invalid Merkle root")?;
    let entry = load_entry(&args.proof, args.kind, args.id.as_deref())?;

    if let Some(stored) = entry.root.as_deref() {
        if parse_hash(stored).ok() != Some(root) {
            warn!(stored, published = %hex_encode(root), "Claim file names a different root");
        }
    }

    let id = args.id.clone().unwrap_or_else(|| entry.id.clone());
    let quota = args.quota.clone().unwrap_or_else(|| entry.value.clone());
    let leaf = encode_record_leaf(args.kind, &id, &quota).context("Invalid claim")?;
    let proof = entry.to_proof().context("Invalid proof")?;

    info!(id = %id, quota = %quota, steps = proof.len(), "Verifying claim");
    if !proof.verify(&leaf, &root) {
        anyhow::bail!("Claim for {id} with quota {quota} is not in the Merkle tree");
    }
    Ok((id, quota))
}

pub fn run(args: Cli) -> Result<()> {
    let (id, quota) = check_claim(&args)?;
    println!("Proof valid for {id} (quota {quota})");
    Ok(())
}
