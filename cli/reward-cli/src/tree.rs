use tracing::debug;

use crate::common::{hash_pair, Hash};
use crate::error::{RewardError, Result};

/// A binary Keccak256 Merkle tree kept level by level.
///
/// `levels[0]` holds the leaves in input order and the last level holds the
/// root alone. When a level has an odd number of nodes its last node is
/// paired with itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Builds the tree bottom-up from an ordered, non-empty leaf sequence.
    pub fn build(leaves: Vec<Hash>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(RewardError::EmptyLeaves);
        }

        let mut levels: Vec<Vec<Hash>> = vec![leaves];
        while let Some(level) = levels.last().filter(|level| level.len() > 1) {
            let next_level: Vec<Hash> = level
                .chunks(2)
                .map(|chunk| {
                    let left = &chunk[0];
                    let right = chunk.get(1).unwrap_or(left);
                    hash_pair(left, right)
                })
                .collect();

            debug!(
                level = levels.len(),
                nodes = next_level.len(),
                "Built tree level"
            );
            levels.push(next_level);
        }

        Ok(Self { levels })
    }

    pub fn root(&self) -> Hash {
        // build() guarantees a final level with exactly one node
        self.levels[self.levels.len() - 1][0]
    }

    pub fn leaves(&self) -> &[Hash] {
        &self.levels[0]
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Number of hashing rounds between a leaf and the root, which is also
    /// the length of every proof: `ceil(log2(leaf_count))`.
    pub fn height(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn levels(&self) -> &[Vec<Hash>] {
        &self.levels
    }
}
