use crate::addr::{EthAddress, NativeAddress};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An account identity spanning the two address spaces.
///
/// Exactly one variant is active per value. Every native address has a
/// deterministic Ethereum mirror (see [`NativeAddress::eth_mirror`]); the
/// two sides are kept distinct here and collapsed only at the ledger
/// boundary, for identities supplied through explicit cross-account calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CrossAccountId {
    /// Account keyed by its native 32 byte address
    Native(NativeAddress),

    /// Account keyed by its Ethereum-style 20 byte address
    Ethereum(EthAddress),
}

impl CrossAccountId {
    pub fn from_native(addr: NativeAddress) -> Self {
        CrossAccountId::Native(addr)
    }

    pub fn from_eth(addr: EthAddress) -> Self {
        CrossAccountId::Ethereum(addr)
    }

    /// Check if this identity lives in the native address space
    pub fn is_native(&self) -> bool {
        matches!(self, CrossAccountId::Native(_))
    }

    /// Check if this identity lives in the Ethereum address space
    pub fn is_eth(&self) -> bool {
        matches!(self, CrossAccountId::Ethereum(_))
    }

    /// Get the native address if this is a native identity
    pub fn as_native(&self) -> Option<&NativeAddress> {
        match self {
            CrossAccountId::Native(addr) => Some(addr),
            _ => None,
        }
    }

    /// Get the Ethereum address if this is an Ethereum identity
    pub fn as_eth(&self) -> Option<&EthAddress> {
        match self {
            CrossAccountId::Ethereum(addr) => Some(addr),
            _ => None,
        }
    }

    /// The identity as seen from the Ethereum wire.
    ///
    /// Native accounts are reported as their mirror address.
    pub fn eth_wire(&self) -> EthAddress {
        match self {
            CrossAccountId::Native(addr) => addr.eth_mirror(),
            CrossAccountId::Ethereum(addr) => *addr,
        }
    }
}

impl From<NativeAddress> for CrossAccountId {
    fn from(addr: NativeAddress) -> Self {
        CrossAccountId::Native(addr)
    }
}

impl From<EthAddress> for CrossAccountId {
    fn from(addr: EthAddress) -> Self {
        CrossAccountId::Ethereum(addr)
    }
}

impl fmt::Display for CrossAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossAccountId::Native(addr) => write!(f, "{}", addr),
            CrossAccountId::Ethereum(addr) => write!(f, "{}", addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_accessors() {
        let native_addr = NativeAddress::new([1; 32]);
        let eth_addr = EthAddress::new([2; 20]);

        let native = CrossAccountId::from_native(native_addr);
        assert!(native.is_native());
        assert!(!native.is_eth());
        assert_eq!(native.as_native(), Some(&native_addr));
        assert_eq!(native.as_eth(), None);

        let eth = CrossAccountId::from_eth(eth_addr);
        assert!(eth.is_eth());
        assert!(!eth.is_native());
        assert_eq!(eth.as_eth(), Some(&eth_addr));
        assert_eq!(eth.as_native(), None);
    }

    #[test]
    fn test_eth_wire_reports_mirror_for_native() {
        let native_addr = NativeAddress::new([3; 32]);
        let native = CrossAccountId::from_native(native_addr);
        assert_eq!(native.eth_wire(), native_addr.eth_mirror());

        let eth_addr = EthAddress::new([4; 20]);
        let eth = CrossAccountId::from_eth(eth_addr);
        assert_eq!(eth.eth_wire(), eth_addr);
    }

    #[test]
    fn test_mirror_identity_is_distinct_from_native() {
        // An Ethereum identity at the mirror address is a different key
        // than the native identity; collapsing the two is the ledger's
        // decision, not the identity's.
        let native_addr = NativeAddress::new([5; 32]);
        let native = CrossAccountId::from_native(native_addr);
        let mirrored = CrossAccountId::from_eth(native_addr.eth_mirror());
        assert_ne!(native, mirrored);
    }
}
