use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Deref;

use crate::error::LedgerError;

// NativeAddress is the account key of the native address space.
// It is a 32 byte long unique identifier, resembling a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeAddress([u8; 32]);

impl fmt::Display for NativeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format as a hex string with a prefix of the first 6 bytes
        let prefix = hex::encode(&self.0[0..6]);
        write!(f, "sub:{}", prefix)
    }
}

impl Ord for NativeAddress {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for NativeAddress {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Default for NativeAddress {
    fn default() -> Self {
        NativeAddress([0; 32])
    }
}

impl Deref for NativeAddress {
    type Target = [u8; 32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl NativeAddress {
    /// The all-zero address, treated as "unset" in cross-account tuples.
    pub const ZERO: NativeAddress = NativeAddress([0; 32]);

    pub fn new(addr: [u8; 32]) -> Self {
        NativeAddress(addr)
    }

    /// Create a NativeAddress from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        NativeAddress(bytes)
    }

    /// Parse a NativeAddress from a hex string, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self, LedgerError> {
        let bytes = decode_hex(s, 32)?;
        let mut addr = [0u8; 32];
        addr.copy_from_slice(&bytes);
        Ok(NativeAddress(addr))
    }

    /// Get a reference to the internal bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Full lowercase hex encoding, without a prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Derive the Ethereum-space mirror of this address.
    ///
    /// The mapping is pure and deterministic: the first 20 bytes of a
    /// domain-separated SHA-256 over the native key. There is no reverse
    /// derivation; an Ethereum address not produced by this function
    /// denotes an independent foreign-only account.
    pub fn eth_mirror(&self) -> EthAddress {
        let mut hasher = Sha256::new();

        // Domain separator
        hasher.update(b"RFT_EthMirror");
        hasher.update(self.0);

        let digest = hasher.finalize();
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&digest[0..20]);
        EthAddress(addr)
    }
}

// EthAddress is the account key of the Ethereum-style address space,
// 20 bytes as in an EVM environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EthAddress([u8; 20]);

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = hex::encode(&self.0[0..6]);
        write!(f, "eth:{}", prefix)
    }
}

impl Ord for EthAddress {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for EthAddress {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Default for EthAddress {
    fn default() -> Self {
        EthAddress([0; 20])
    }
}

impl Deref for EthAddress {
    type Target = [u8; 20];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl EthAddress {
    /// The all-zero wire sentinel, standing in for mint and burn parties.
    pub const ZERO: EthAddress = EthAddress([0; 20]);

    /// The all-0xFF wire sentinel marking full-ownership consolidation.
    pub const FULL_OWNERSHIP: EthAddress = EthAddress([0xFF; 20]);

    pub fn new(addr: [u8; 20]) -> Self {
        EthAddress(addr)
    }

    /// Create an EthAddress from raw bytes
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        EthAddress(bytes)
    }

    /// Parse an EthAddress from a hex string, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self, LedgerError> {
        let bytes = decode_hex(s, 20)?;
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&bytes);
        Ok(EthAddress(addr))
    }

    /// Get a reference to the internal bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Full lowercase hex encoding, without a prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

/// Decode a hex string of exactly `len` bytes, tolerating a `0x` prefix
fn decode_hex(s: &str, len: usize) -> Result<Vec<u8>, LedgerError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped)
        .map_err(|e| LedgerError::InvalidArgument(format!("Bad hex address: {}", e)))?;
    if bytes.len() != len {
        return Err(LedgerError::InvalidArgument(format!(
            "Address must be {} bytes, got {}",
            len,
            bytes.len()
        )));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        let native = NativeAddress::new([0xAB; 32]);
        assert_eq!(native.to_string(), "sub:abababababab");

        let eth = EthAddress::new([0xCD; 20]);
        assert_eq!(eth.to_string(), "eth:cdcdcdcdcdcd");
    }

    #[test]
    fn test_from_hex_roundtrip() {
        let native = NativeAddress::new([7; 32]);
        let parsed = NativeAddress::from_hex(&native.to_hex()).unwrap();
        assert_eq!(parsed, native);

        // 0x prefix is accepted as well
        let prefixed = format!("0x{}", native.to_hex());
        assert_eq!(NativeAddress::from_hex(&prefixed).unwrap(), native);

        let eth = EthAddress::new([9; 20]);
        assert_eq!(EthAddress::from_hex(&eth.to_hex()).unwrap(), eth);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        // Wrong length
        assert!(NativeAddress::from_hex("0011").is_err());
        assert!(EthAddress::from_hex(&"00".repeat(32)).is_err());

        // Not hex at all
        assert!(NativeAddress::from_hex("zz").is_err());
    }

    #[test]
    fn test_eth_mirror_deterministic() {
        let native = NativeAddress::new([42; 32]);

        // Same input always yields the same mirror
        assert_eq!(native.eth_mirror(), native.eth_mirror());

        // Different inputs yield different mirrors
        let other = NativeAddress::new([43; 32]);
        assert_ne!(native.eth_mirror(), other.eth_mirror());
    }

    #[test]
    fn test_eth_mirror_is_not_a_sentinel() {
        let native = NativeAddress::new([1; 32]);
        let mirror = native.eth_mirror();
        assert_ne!(mirror, EthAddress::ZERO);
        assert_ne!(mirror, EthAddress::FULL_OWNERSHIP);
    }

    #[test]
    fn test_default_is_zero() {
        assert_eq!(NativeAddress::default(), NativeAddress::ZERO);
        assert_eq!(EthAddress::default(), EthAddress::ZERO);
        assert!(NativeAddress::default().is_zero());
        assert!(EthAddress::default().is_zero());
    }

    #[test]
    fn test_deref() {
        let eth = EthAddress::new([5; 20]);
        assert_eq!(*eth, [5u8; 20]);
    }
}
