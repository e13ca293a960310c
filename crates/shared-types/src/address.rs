//! # Wallet Addresses
//!
//! All role assignments and votes are keyed by wallet address. Addresses
//! arrive from clients in mixed case (checksummed `0xAbC...` forms), so the
//! only way to build a `WalletAddress` is through [`normalize_address`],
//! which trims and lowercases the input.

use crate::errors::ValueError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A lowercase, trimmed wallet address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse and normalize a raw address.
    pub fn parse(raw: &str) -> Result<Self, ValueError> {
        normalize_address(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Normalize a raw wallet address: trim surrounding whitespace, reject
/// empty or whitespace-bearing input, and lowercase the result.
pub fn normalize_address(raw: &str) -> Result<WalletAddress, ValueError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValueError::EmptyAddress);
    }
    if trimmed
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(ValueError::InvalidAddress(trimmed.to_string()));
    }
    Ok(WalletAddress(trimmed.to_lowercase()))
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for WalletAddress {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_address(s)
    }
}

// Deserialization goes through normalization so stored documents and
// request bodies can never smuggle in a mixed-case address.
impl<'de> Deserialize<'de> for WalletAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        normalize_address(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_trims() {
        let addr = normalize_address("  0xAbCdEF01  ").unwrap();
        assert_eq!(addr.as_str(), "0xabcdef01");
    }

    #[test]
    fn test_same_wallet_different_case_is_equal() {
        let a = WalletAddress::parse("0xNEW").unwrap();
        let b = WalletAddress::parse("0xnew").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_empty_and_inner_whitespace() {
        assert_eq!(normalize_address("   "), Err(ValueError::EmptyAddress));
        assert!(matches!(
            normalize_address("0x12 34"),
            Err(ValueError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_deserialize_normalizes() {
        let addr: WalletAddress = serde_json::from_str("\"0xDEAD\"").unwrap();
        assert_eq!(addr.to_string(), "0xdead");

        let bad: Result<WalletAddress, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }
}
