use sha3::{Digest, Keccak256};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{RewardError, Result};

/// A 32-byte Keccak256 digest: leaves, internal nodes and roots.
pub type Hash = [u8; 32];

/// Computes the parent of two sibling nodes as `keccak256(left || right)`.
///
/// The pair is hashed in position order, never sorted.
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    Keccak256::new()
        .chain_update(left)
        .chain_update(right)
        .finalize()
        .into()
}

/// Lower-case `0x`-prefixed hex.
pub fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parses a 32-byte hash from hex, with or without the "0x" prefix.
pub fn parse_hash(hash_str: &str) -> Result<Hash> {
    let trimmed = hash_str.trim();
    let cleaned = strip_hex_prefix(trimmed).unwrap_or(trimmed);
    if cleaned.len() != 64 {
        return Err(RewardError::encoding(
            "hash",
            hash_str,
            format!("expected 64 hex chars, got {}", cleaned.len()),
        ));
    }
    let mut hash = [0u8; 32];
    hex::decode_to_slice(cleaned, &mut hash)
        .map_err(|e| RewardError::encoding("hash", hash_str, e.to_string()))?;
    Ok(hash)
}

/// Parses an Ethereum address from a hex string.
///
/// # Arguments
/// * `addr_str` - The address string, with or without "0x" prefix
///
/// # Errors
/// Returns an encoding error if the address is not 40 hex characters,
/// contains invalid hex, or is the zero address
pub fn parse_address(addr_str: &str) -> Result<[u8; 20]> {
    let trimmed = addr_str.trim();
    let cleaned = strip_hex_prefix(trimmed).unwrap_or(trimmed);
    if cleaned.len() != 40 {
        return Err(RewardError::encoding(
            "address",
            addr_str,
            format!("expected 40 hex chars, got {}", cleaned.len()),
        ));
    }
    let mut address = [0u8; 20];
    hex::decode_to_slice(cleaned, &mut address)
        .map_err(|e| RewardError::encoding("address", addr_str, e.to_string()))?;
    if address == [0u8; 20] {
        return Err(RewardError::encoding(
            "address",
            addr_str,
            "zero address not allowed",
        ));
    }
    Ok(address)
}

/// Parses a base-10 `uint256` into its 32-byte big-endian form.
///
/// Only ASCII digits are accepted; signs, separators and values above
/// 2^256 - 1 are rejected.
pub fn parse_decimal_u256(field: &'static str, value: &str) -> Result<[u8; 32]> {
    let digits = value.trim();
    if digits.is_empty() {
        return Err(RewardError::encoding(field, value, "empty value"));
    }

    let mut out = [0u8; 32];
    for c in digits.chars() {
        let digit = c
            .to_digit(10)
            .ok_or_else(|| RewardError::encoding(field, value, format!("invalid digit {c:?}")))?;

        // out = out * 10 + digit, propagating the carry from the low byte up
        let mut carry = digit as u16;
        for byte in out.iter_mut().rev() {
            let v = u16::from(*byte) * 10 + carry;
            *byte = (v & 0xff) as u8;
            carry = v >> 8;
        }
        if carry != 0 {
            return Err(RewardError::encoding(
                field,
                value,
                "does not fit in 256 bits",
            ));
        }
    }
    Ok(out)
}

/// Parses a `uint256` written either in decimal or as `0x` hex.
pub fn parse_uint256(field: &'static str, value: &str) -> Result<[u8; 32]> {
    let trimmed = value.trim();
    let Some(hex_digits) = strip_hex_prefix(trimmed) else {
        return parse_decimal_u256(field, value);
    };
    if hex_digits.is_empty() || hex_digits.len() > 64 {
        return Err(RewardError::encoding(
            field,
            value,
            format!("expected 1 to 64 hex digits, got {}", hex_digits.len()),
        ));
    }
    let padded = format!("{hex_digits:0>64}");
    let mut out = [0u8; 32];
    hex::decode_to_slice(&padded, &mut out)
        .map_err(|e| RewardError::encoding(field, value, e.to_string()))?;
    Ok(out)
}

fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

/// Temp sibling used by [`write_file_atomic`]: the full file name plus `.tmp`.
fn temp_path_for(path: &Path) -> io::Result<PathBuf> {
    let mut file_name: OsString = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name"))?
        .to_owned();
    file_name.push(".tmp");
    Ok(path.with_file_name(file_name))
}

/// Writes `contents` to a temp sibling, flushes it, then renames over `path`.
///
/// The temp file is removed if any step fails.
pub fn write_file_atomic(path: &Path, contents: &str) -> Result<()> {
    let temp_path = temp_path_for(path)?;
    let written = (|| -> io::Result<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        fs::rename(&temp_path, path)
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}
