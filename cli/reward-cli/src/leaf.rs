//! Leaf encoding.
//!
//! A leaf is `keccak256(abi.encodePacked(identifier, quota))`, the same bytes
//! the claim contract rebuilds from its call arguments:
//!
//! | kind      | identifier bytes        | quota bytes             |
//! |-----------|-------------------------|-------------------------|
//! | `id`      | `uint256`, 32 bytes BE  | `uint256`, 32 bytes BE  |
//! | `address` | `address`, 20 raw bytes | `uint256`, 32 bytes BE  |

use std::fmt;

use clap::ValueEnum;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha3::{Digest, Keccak256};

use crate::common::{hex_encode, parse_address, parse_decimal_u256, parse_uint256, Hash};
use crate::error::Result;

/// On-chain type of the recipient identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    /// Numeric id packed as `uint256`
    #[default]
    Id,
    /// Ethereum account packed as `address`
    Address,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id => f.write_str("id"),
            Self::Address => f.write_str("address"),
        }
    }
}

/// A recipient identifier in its on-chain form.
///
/// Textual spellings that denote the same on-chain value ("1" and "0x01",
/// or two casings of one address) parse to the same `Identifier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identifier {
    Id([u8; 32]),
    Address([u8; 20]),
}

impl Identifier {
    pub fn parse(kind: IdentifierKind, value: &str) -> Result<Self> {
        match kind {
            IdentifierKind::Id => parse_uint256("identifier", value).map(Self::Id),
            IdentifierKind::Address => parse_address(value).map(Self::Address),
        }
    }

    pub fn kind(&self) -> IdentifierKind {
        match self {
            Self::Id(_) => IdentifierKind::Id,
            Self::Address(_) => IdentifierKind::Address,
        }
    }

    /// Packed encoding, as `abi.encodePacked` lays it out.
    pub fn packed(&self) -> &[u8] {
        match self {
            Self::Id(bytes) => bytes,
            Self::Address(bytes) => bytes,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex_encode(self.packed()))
    }
}

/// Maximum cumulative claimable amount, as a big-endian `uint256`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quota([u8; 32]);

impl Quota {
    /// Parses a decimal quota string.
    pub fn parse(value: &str) -> Result<Self> {
        parse_decimal_u256("quota", value).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Bytes fed to the hash for one leaf.
pub fn leaf_preimage(identifier: &Identifier, quota: &Quota) -> Vec<u8> {
    let mut packed = Vec::with_capacity(identifier.packed().len() + 32);
    packed.extend_from_slice(identifier.packed());
    packed.extend_from_slice(quota.as_bytes());
    packed
}

/// Hashes one (identifier, quota) pair into its leaf.
pub fn encode_leaf(identifier: &Identifier, quota: &Quota) -> Hash {
    Keccak256::new()
        .chain_update(identifier.packed())
        .chain_update(quota.as_bytes())
        .finalize()
        .into()
}

/// One entry of the recipient list, as it appears in the input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientRecord {
    #[serde(alias = "user", alias = "address")]
    pub id: String,
    #[serde(alias = "quota", deserialize_with = "decimal_string")]
    pub value: String,
}

/// A record after parsing, together with its leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedRecord {
    pub identifier: Identifier,
    pub quota: Quota,
    pub leaf: Hash,
}

impl RecipientRecord {
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }

    pub fn encode(&self, kind: IdentifierKind) -> Result<EncodedRecord> {
        let identifier = Identifier::parse(kind, &self.id)?;
        let quota = Quota::parse(&self.value)?;
        Ok(EncodedRecord {
            identifier,
            quota,
            leaf: encode_leaf(&identifier, &quota),
        })
    }
}

/// Convenience for callers holding raw strings.
pub fn encode_record_leaf(kind: IdentifierKind, id: &str, quota: &str) -> Result<Hash> {
    RecipientRecord::new(id, quota).encode(kind).map(|e| e.leaf)
}

// Quotas arrive either as decimal strings or as plain JSON integers of any
// width; `arbitrary_precision` keeps the integer's digits exact.
fn decimal_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => {
            let digits = number.to_string();
            if digits.bytes().all(|b| b.is_ascii_digit()) {
                Ok(digits)
            } else {
                Err(D::Error::custom(format!(
                    "quota must be a non-negative integer, got {digits}"
                )))
            }
        }
        other => Err(D::Error::custom(format!(
            "quota must be a decimal string or integer, got {other}"
        ))),
    }
}
