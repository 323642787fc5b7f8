use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::common::{hex_encode, Hash};
use crate::error::{RewardError, Result};
use crate::leaf::{EncodedRecord, Identifier, IdentifierKind, Quota, RecipientRecord};
use crate::proof::{prove_by_index, Proof};
use crate::tree::MerkleTree;

/// Input file layout: `{ "recipients": [ { "id": .., "value": .. }, .. ] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientList {
    pub recipients: Vec<RecipientRecord>,
}

impl RecipientList {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeOptions {
    pub kind: IdentifierKind,
    /// Log duplicates and keep going instead of failing the run.
    pub allow_duplicates: bool,
}

/// A duplicate observed while encoding in lenient mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Duplicate {
    Leaf { first: usize, second: usize },
    Recipient { first: usize, second: usize },
}

/// The Merkle tree for one generation run, with the records it was built
/// from and an identifier index for key lookups.
#[derive(Debug, Clone)]
pub struct RewardTree {
    kind: IdentifierKind,
    records: Vec<RecipientRecord>,
    encoded: Vec<EncodedRecord>,
    index: HashMap<Identifier, usize>,
    duplicates: Vec<Duplicate>,
    tree: MerkleTree,
}

impl RewardTree {
    pub fn build(records: Vec<RecipientRecord>, options: TreeOptions) -> Result<Self> {
        let encoded = records
            .iter()
            .map(|record| record.encode(options.kind))
            .collect::<Result<Vec<_>>>()?;

        let mut index: HashMap<Identifier, usize> = HashMap::with_capacity(encoded.len());
        let mut seen_leaves: HashMap<Hash, usize> = HashMap::with_capacity(encoded.len());
        let mut duplicates = Vec::new();

        for (position, entry) in encoded.iter().enumerate() {
            if let Some(&first) = seen_leaves.get(&entry.leaf) {
                if !options.allow_duplicates {
                    return Err(RewardError::DuplicateLeaf {
                        first,
                        second: position,
                        leaf: hex_encode(entry.leaf),
                    });
                }
                warn!(first, second = position, leaf = %hex_encode(entry.leaf), "Duplicate leaf");
                duplicates.push(Duplicate::Leaf {
                    first,
                    second: position,
                });
            } else {
                seen_leaves.insert(entry.leaf, position);
            }

            match index.entry(entry.identifier) {
                Entry::Vacant(slot) => {
                    slot.insert(position);
                }
                Entry::Occupied(slot) => {
                    let first = *slot.get();
                    if !options.allow_duplicates {
                        return Err(RewardError::DuplicateRecipient {
                            first,
                            second: position,
                            identifier: records[position].id.clone(),
                        });
                    }
                    warn!(
                        first,
                        second = position,
                        identifier = %records[position].id,
                        "Duplicate recipient; lookups by id resolve to the first occurrence, \
                         so the later entry is only provable by index or through `proofs`"
                    );
                    duplicates.push(Duplicate::Recipient {
                        first,
                        second: position,
                    });
                }
            }
        }

        let tree = MerkleTree::build(encoded.iter().map(|entry| entry.leaf).collect())?;
        info!(
            recipients = records.len(),
            height = tree.height(),
            root = %hex_encode(tree.root()),
            "Built reward tree"
        );

        Ok(Self {
            kind: options.kind,
            records,
            encoded,
            index,
            duplicates,
            tree,
        })
    }

    pub fn root(&self) -> Hash {
        self.tree.root()
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    pub fn tree(&self) -> &MerkleTree {
        &self.tree
    }

    pub fn records(&self) -> &[RecipientRecord] {
        &self.records
    }

    pub fn duplicates(&self) -> &[Duplicate] {
        &self.duplicates
    }

    pub fn leaf(&self, leaf_index: usize) -> Result<Hash> {
        self.encoded
            .get(leaf_index)
            .map(|entry| entry.leaf)
            .ok_or(RewardError::IndexOutOfRange {
                index: leaf_index,
                leaf_count: self.encoded.len(),
            })
    }

    /// Leaf position of `identifier`, in any spelling of its on-chain value.
    pub fn index_of(&self, identifier: &str) -> Result<usize> {
        let parsed = Identifier::parse(self.kind, identifier)?;
        self.index
            .get(&parsed)
            .copied()
            .ok_or_else(|| RewardError::UnknownRecipient(identifier.to_string()))
    }

    pub fn prove_by_index(&self, leaf_index: usize) -> Result<Proof> {
        prove_by_index(&self.tree, leaf_index)
    }

    pub fn prove_by_key(&self, identifier: &str) -> Result<Proof> {
        self.prove_by_index(self.index_of(identifier)?)
    }

    /// Proof for `(identifier, quota)`, refusing a quota that differs from
    /// the recorded one.
    pub fn prove_claim(&self, identifier: &str, quota: &str) -> Result<(usize, Proof)> {
        let leaf_index = self.index_of(identifier)?;
        let claimed = Quota::parse(quota)?;
        if claimed != self.encoded[leaf_index].quota {
            return Err(RewardError::QuotaMismatch {
                identifier: identifier.to_string(),
                recorded: self.records[leaf_index].value.clone(),
                claimed: quota.to_string(),
            });
        }
        Ok((leaf_index, self.prove_by_index(leaf_index)?))
    }

    /// One proof per record, in leaf order.
    pub fn proofs(&self) -> Result<Vec<Proof>> {
        (0..self.tree.leaf_count())
            .map(|leaf_index| self.prove_by_index(leaf_index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::encode_record_leaf;
    use crate::proof::verify;

    fn scenario() -> Vec<RecipientRecord> {
        vec![
            RecipientRecord::new("1", "10000"),
            RecipientRecord::new("2", "5999"),
        ]
    }

    #[test]
    fn test_scenario_two_recipients() {
        let tree = RewardTree::build(scenario(), TreeOptions::default()).unwrap();
        let proof = tree.prove_by_key("1").unwrap();
        assert_eq!(proof.len(), 1);

        let leaf_two = encode_record_leaf(IdentifierKind::Id, "2", "5999").unwrap();
        assert_eq!(proof.siblings(), vec![leaf_two]);

        let good = encode_record_leaf(IdentifierKind::Id, "1", "10000").unwrap();
        let bad = encode_record_leaf(IdentifierKind::Id, "1", "9999").unwrap();
        assert!(verify(&good, &proof, &tree.root()));
        assert!(!verify(&bad, &proof, &tree.root()));
    }

    #[test]
    fn test_lookup_accepts_equivalent_spelling() {
        let tree = RewardTree::build(scenario(), TreeOptions::default()).unwrap();
        assert_eq!(tree.index_of("0x02").unwrap(), 1);
    }

    #[test]
    fn test_unknown_recipient() {
        let tree = RewardTree::build(scenario(), TreeOptions::default()).unwrap();
        assert!(matches!(
            tree.prove_by_key("3"),
            Err(RewardError::UnknownRecipient(id)) if id == "3"
        ));
    }

    #[test]
    fn test_prove_claim_checks_quota() {
        let tree = RewardTree::build(scenario(), TreeOptions::default()).unwrap();
        let (index, proof) = tree.prove_claim("2", "5999").unwrap();
        assert_eq!(index, 1);
        assert!(proof.verify(&tree.leaf(1).unwrap(), &tree.root()));
        assert!(matches!(
            tree.prove_claim("2", "6000"),
            Err(RewardError::QuotaMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_records_rejected() {
        assert!(matches!(
            RewardTree::build(vec![], TreeOptions::default()),
            Err(RewardError::EmptyLeaves)
        ));
    }

    #[test]
    fn test_invalid_record_fails_build() {
        let records = vec![RecipientRecord::new("1", "ten")];
        assert!(matches!(
            RewardTree::build(records, TreeOptions::default()),
            Err(RewardError::Encoding { field: "quota", .. })
        ));
    }

    #[test]
    fn test_duplicate_leaf_strict() {
        let records = vec![
            RecipientRecord::new("1", "10"),
            RecipientRecord::new("2", "10"),
            RecipientRecord::new("0x01", "10"),
        ];
        let err = RewardTree::build(records, TreeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            RewardError::DuplicateLeaf {
                first: 0,
                second: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_recipient_strict() {
        let records = vec![
            RecipientRecord::new("1", "10"),
            RecipientRecord::new("1", "20"),
        ];
        let err = RewardTree::build(records, TreeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            RewardError::DuplicateRecipient {
                first: 0,
                second: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicates_lenient() {
        let records = vec![
            RecipientRecord::new("1", "10"),
            RecipientRecord::new("1", "10"),
            RecipientRecord::new("1", "20"),
        ];
        let options = TreeOptions {
            allow_duplicates: true,
            ..TreeOptions::default()
        };
        let tree = RewardTree::build(records, options).unwrap();
        assert_eq!(
            tree.duplicates(),
            &[
                Duplicate::Leaf { first: 0, second: 1 },
                Duplicate::Recipient { first: 0, second: 1 },
                Duplicate::Recipient { first: 0, second: 2 },
            ]
        );
        assert_eq!(tree.tree().leaf_count(), 3);
        assert_eq!(tree.index_of("1").unwrap(), 0);
    }

    #[test]
    fn test_lenient_later_duplicate_only_provable_by_index() {
        let records = vec![
            RecipientRecord::new("1", "10"),
            RecipientRecord::new("1", "20"),
        ];
        let options = TreeOptions {
            allow_duplicates: true,
            ..TreeOptions::default()
        };
        let tree = RewardTree::build(records, options).unwrap();

        assert!(matches!(
            tree.prove_claim("1", "20"),
            Err(RewardError::QuotaMismatch { .. })
        ));
        let (index, _) = tree.prove_claim("1", "10").unwrap();
        assert_eq!(index, 0);

        let proofs = tree.proofs().unwrap();
        let later = encode_record_leaf(IdentifierKind::Id, "1", "20").unwrap();
        assert_eq!(tree.leaf(1).unwrap(), later);
        assert!(verify(&later, &proofs[1], &tree.root()));
    }

    #[test]
    fn test_proofs_cover_every_record() {
        let records = (1..=7)
            .map(|i| RecipientRecord::new(i.to_string(), (i * 100).to_string()))
            .collect();
        let tree = RewardTree::build(records, TreeOptions::default()).unwrap();
        let proofs = tree.proofs().unwrap();
        assert_eq!(proofs.len(), 7);
        for (index, proof) in proofs.iter().enumerate() {
            assert!(proof.verify(&tree.leaf(index).unwrap(), &tree.root()));
        }
    }

    #[test]
    fn test_load_recipient_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reward.json");
        fs::write(
            &path,
            r#"{"recipients":[{"id":"1","value":"10000"},{"id":"2","value":5999}]}"#,
        )
        .unwrap();
        let list = RecipientList::load(&path).unwrap();
        assert_eq!(list.recipients, scenario());
    }

    #[test]
    fn test_load_missing_recipients_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reward.json");
        fs::write(&path, r#"{"leaves":[]}"#).unwrap();
        assert!(matches!(RecipientList::load(&path), Err(RewardError::Json(_))));
    }
}
