use crate::account::CrossAccountId;
use crate::token::TokenKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A party to a ledger event.
///
/// Mint, burn and full-ownership consolidation are tagged variants rather
/// than magic addresses; the sentinel encodings exist only on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventParty {
    /// An actual account
    Account(CrossAccountId),

    /// Source marker for pieces entering circulation
    Mint,

    /// Destination marker for pieces leaving circulation
    Burn,

    /// Destination marker announcing that a single owner now holds every
    /// piece of the token
    FullOwnership,
}

impl EventParty {
    /// Get the account if this party is an actual account
    pub fn as_account(&self) -> Option<&CrossAccountId> {
        match self {
            EventParty::Account(id) => Some(id),
            _ => None,
        }
    }
}

impl From<CrossAccountId> for EventParty {
    fn from(id: CrossAccountId) -> Self {
        EventParty::Account(id)
    }
}

impl fmt::Display for EventParty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventParty::Account(id) => write!(f, "{}", id),
            EventParty::Mint => write!(f, "mint"),
            EventParty::Burn => write!(f, "burn"),
            EventParty::FullOwnership => write!(f, "full-ownership"),
        }
    }
}

/// A normalized event emitted by the engine.
///
/// Both API surfaces produce this same schema for equivalent operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// Pieces moved between parties
    Transfer {
        token: TokenKey,
        from: EventParty,
        to: EventParty,
        amount: u128,
    },

    /// An owner set a spender's allowance
    Approval {
        token: TokenKey,
        owner: CrossAccountId,
        spender: CrossAccountId,
        amount: u128,
    },
}

impl LedgerEvent {
    /// The token this event concerns
    pub fn token(&self) -> TokenKey {
        match self {
            LedgerEvent::Transfer { token, .. } => *token,
            LedgerEvent::Approval { token, .. } => *token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::NativeAddress;
    use crate::token::{CollectionId, TokenId};

    #[test]
    fn test_token_accessor() {
        let key = TokenKey::new(CollectionId(1), TokenId(2));
        let owner = CrossAccountId::from_native(NativeAddress::new([1; 32]));

        let transfer = LedgerEvent::Transfer {
            token: key,
            from: EventParty::Mint,
            to: owner.into(),
            amount: 100,
        };
        assert_eq!(transfer.token(), key);

        let approval = LedgerEvent::Approval {
            token: key,
            owner,
            spender: owner,
            amount: 5,
        };
        assert_eq!(approval.token(), key);
    }

    #[test]
    fn test_party_accessors() {
        let owner = CrossAccountId::from_native(NativeAddress::new([2; 32]));
        let party = EventParty::from(owner);
        assert_eq!(party.as_account(), Some(&owner));
        assert_eq!(EventParty::Mint.as_account(), None);
        assert_eq!(EventParty::Burn.as_account(), None);
        assert_eq!(EventParty::FullOwnership.as_account(), None);
    }
}
