#![forbid(unsafe_code)]

pub mod common;
pub mod error;
pub mod leaf;
pub mod logging;
pub mod output;
pub mod proof;
pub mod recipients;
pub mod tree;

pub use common::{hash_pair, hex_encode, parse_address, parse_hash, write_file_atomic, Hash};
pub use error::{Result, RewardError};
pub use leaf::{
    encode_leaf, encode_record_leaf, leaf_preimage, EncodedRecord, Identifier, IdentifierKind,
    Quota, RecipientRecord,
};
pub use output::{write_json, RecipientProof, RootOutput};
pub use proof::{prove_by_index, verify, Position, Proof, ProofStep};
pub use recipients::{Duplicate, RecipientList, RewardTree, TreeOptions};
pub use tree::MerkleTree;
