use thiserror::Error;

#[derive(Error, Debug)]
pub enum RewardError {
    #[error("Invalid {field} {value:?}: {reason}")]
    Encoding {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("Cannot build a Merkle tree from an empty leaf set")]
    EmptyLeaves,
    #[error("Leaf index {index} is out of bounds for tree with {leaf_count} leaves")]
    IndexOutOfRange { index: usize, leaf_count: usize },
    #[error("Unknown recipient: {0}")]
    UnknownRecipient(String),
    #[error("Quota mismatch for {identifier}: recorded {recorded}, claimed {claimed}")]
    QuotaMismatch {
        identifier: String,
        recorded: String,
        claimed: String,
    },
    #[error("Records {first} and {second} encode to the same leaf {leaf}")]
    DuplicateLeaf {
        first: usize,
        second: usize,
        leaf: String,
    },
    #[error("Records {first} and {second} name the same recipient {identifier}")]
    DuplicateRecipient {
        first: usize,
        second: usize,
        identifier: String,
    },
    #[error("io Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serde Error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RewardError {
    pub(crate) fn encoding(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Encoding {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RewardError>;
