use serde::{Deserialize, Serialize};

use crate::common::{hash_pair, Hash};
use crate::error::{RewardError, Result};
use crate::tree::MerkleTree;

/// Side on which a sibling sits when it is hashed with the running node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofStep {
    pub sibling: Hash,
    pub position: Position,
}

/// Authentication path from one leaf to the root, ordered root-ward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Proof {
    steps: Vec<ProofStep>,
}

impl Proof {
    pub fn new(steps: Vec<ProofStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sibling hashes alone, in the shape the claim contract takes.
    pub fn siblings(&self) -> Vec<Hash> {
        self.steps.iter().map(|step| step.sibling).collect()
    }

    pub fn positions(&self) -> Vec<Position> {
        self.steps.iter().map(|step| step.position).collect()
    }

    /// Folds the path over `leaf`, yielding the root it commits to.
    pub fn compute_root(&self, leaf: &Hash) -> Hash {
        self.steps.iter().fold(*leaf, |node, step| match step.position {
            Position::Left => hash_pair(&step.sibling, &node),
            Position::Right => hash_pair(&node, &step.sibling),
        })
    }

    pub fn verify(&self, leaf: &Hash, root: &Hash) -> bool {
        self.compute_root(leaf) == *root
    }
}

/// Generates the proof for the leaf at `leaf_index`.
///
/// At every level below the root the sibling is the node paired with the
/// current one; an odd trailing node is its own sibling, on the right.
pub fn prove_by_index(tree: &MerkleTree, leaf_index: usize) -> Result<Proof> {
    let leaf_count = tree.leaf_count();
    if leaf_index >= leaf_count {
        return Err(RewardError::IndexOutOfRange {
            index: leaf_index,
            leaf_count,
        });
    }

    let levels = tree.levels();
    let mut steps = Vec::with_capacity(tree.height());
    let mut current_index = leaf_index;

    for level in &levels[..levels.len() - 1] {
        let step = if current_index.is_multiple_of(2) {
            let sibling = level.get(current_index + 1).unwrap_or(&level[current_index]);
            ProofStep {
                sibling: *sibling,
                position: Position::Right,
            }
        } else {
            ProofStep {
                sibling: level[current_index - 1],
                position: Position::Left,
            }
        };
        steps.push(step);
        current_index /= 2;
    }

    Ok(Proof::new(steps))
}

/// Checks `leaf` against `root` through `proof`.
pub fn verify(leaf: &Hash, proof: &Proof, root: &Hash) -> bool {
    proof.verify(leaf, root)
}
