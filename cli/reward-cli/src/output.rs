//! JSON artifacts handed to the contract owner and to claim tooling.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{hex_encode, parse_hash, write_file_atomic, Hash};
use crate::error::{RewardError, Result};
use crate::leaf::IdentifierKind;
use crate::proof::{Position, Proof, ProofStep};
use crate::recipients::RewardTree;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootOutput {
    pub root: String,
    pub leaf_count: usize,
    pub height: usize,
    pub kind: IdentifierKind,
}

impl RootOutput {
    pub fn from_tree(tree: &RewardTree) -> Self {
        Self {
            root: hex_encode(tree.root()),
            leaf_count: tree.tree().leaf_count(),
            height: tree.tree().height(),
            kind: tree.kind(),
        }
    }
}

/// One recipient's claim material. `root` is only filled for single-claim
/// output; the batch file carries the root separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientProof {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    pub id: String,
    pub value: String,
    pub leaf: String,
    pub leaf_index: usize,
    pub proof: Vec<String>,
    pub positions: Vec<Position>,
}

impl RecipientProof {
    pub fn new(tree: &RewardTree, leaf_index: usize, proof: &Proof) -> Result<Self> {
        let record = tree
            .records()
            .get(leaf_index)
            .ok_or(RewardError::IndexOutOfRange {
                index: leaf_index,
                leaf_count: tree.records().len(),
            })?;
        Ok(Self {
            root: None,
            id: record.id.clone(),
            value: record.value.clone(),
            leaf: hex_encode(tree.leaf(leaf_index)?),
            leaf_index,
            proof: proof.siblings().iter().map(hex_encode).collect(),
            positions: proof.positions(),
        })
    }

    pub fn with_root(mut self, root: Hash) -> Self {
        self.root = Some(hex_encode(root));
        self
    }

    /// Rebuilds the typed proof from the hex fields.
    pub fn to_proof(&self) -> Result<Proof> {
        if self.proof.len() != self.positions.len() {
            return Err(RewardError::encoding(
                "proof",
                format!("{} siblings", self.proof.len()),
                format!("expected {} to match positions", self.positions.len()),
            ));
        }
        let steps = self
            .proof
            .iter()
            .zip(&self.positions)
            .map(|(sibling, position)| {
                Ok(ProofStep {
                    sibling: parse_hash(sibling)?,
                    position: *position,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Proof::new(steps))
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json_output = serde_json::to_string_pretty(value)?;
    write_file_atomic(path, &json_output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::RecipientRecord;
    use crate::recipients::TreeOptions;

    fn tree() -> RewardTree {
        let records = vec![
            RecipientRecord::new("1", "10000"),
            RecipientRecord::new("2", "5999"),
            RecipientRecord::new("3", "1"),
        ];
        RewardTree::build(records, TreeOptions::default()).unwrap()
    }

    #[test]
    fn test_root_output_fields() {
        let tree = tree();
        let output = RootOutput::from_tree(&tree);
        assert_eq!(output.leaf_count, 3);
        assert_eq!(output.height, 2);
        assert_eq!(output.root, hex_encode(tree.root()));

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["leafCount"], 3);
        assert_eq!(json["kind"], "id");
    }

    #[test]
    fn test_recipient_proof_rebuilds_typed_proof() {
        let tree = tree();
        let proof = tree.prove_by_index(2).unwrap();
        let entry = RecipientProof::new(&tree, 2, &proof).unwrap();
        assert_eq!(entry.id, "3");
        assert_eq!(entry.positions, vec![Position::Right, Position::Left]);
        assert_eq!(entry.to_proof().unwrap(), proof);
    }

    #[test]
    fn test_root_only_serialized_when_set() {
        let tree = tree();
        let proof = tree.prove_by_index(0).unwrap();
        let entry = RecipientProof::new(&tree, 0, &proof).unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("root").is_none());

        let json = serde_json::to_value(entry.with_root(tree.root())).unwrap();
        assert_eq!(json["root"], hex_encode(tree.root()));
    }

    #[test]
    fn test_mismatched_positions_rejected() {
        let tree = tree();
        let proof = tree.prove_by_index(0).unwrap();
        let mut entry = RecipientProof::new(&tree, 0, &proof).unwrap();
        entry.positions.pop();
        assert!(entry.to_proof().is_err());
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merkle-output.json");
        let output = RootOutput::from_tree(&tree());
        write_json(&path, &output).unwrap();
        let read: RootOutput =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, output);
    }
}
