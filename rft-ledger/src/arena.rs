use std::collections::HashMap;

use rft_core::account::CrossAccountId;
use rft_core::addr::{EthAddress, NativeAddress};
use rft_core::error::LedgerError;
use rft_core::token::{CollectionId, TokenId, TokenKey};

use crate::state::TokenState;

/// The in-memory arena of all tokens, keyed by (collection, token), plus
/// the mirror index used to collapse cross-supplied Ethereum identities.
///
/// The arena itself is a plain state machine; serializing calls on top of
/// it is the engine's job.
#[derive(Debug, Default)]
pub struct TokenLedger {
    /// All live tokens
    tokens: HashMap<TokenKey, TokenState>,

    /// Next token id to assign, per collection
    next_token: HashMap<CollectionId, u32>,

    /// Mirrors of every native account that has passed through an
    /// operation, keyed by the derived Ethereum address
    mirrors: HashMap<EthAddress, NativeAddress>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The key the next `mint_token` call for `collection` will assign
    pub fn peek_next_token(&self, collection: CollectionId) -> TokenKey {
        let next = self.next_token.get(&collection).copied().unwrap_or(1);
        TokenKey::new(collection, TokenId(next))
    }

    /// Mint the next token of `collection` with `pieces` credited wholly
    /// to `owner`, returning the assigned key.
    ///
    /// Token ids are assigned sequentially per collection, starting at 1.
    pub fn mint_token(
        &mut self,
        collection: CollectionId,
        owner: CrossAccountId,
        pieces: u128,
    ) -> TokenKey {
        let next = self.next_token.entry(collection).or_insert(1);
        let key = TokenKey::new(collection, TokenId(*next));
        *next += 1;

        self.tokens.insert(key, TokenState::new(owner, pieces));
        key
    }

    /// Look up a token, if it exists
    pub fn token(&self, key: &TokenKey) -> Option<&TokenState> {
        self.tokens.get(key)
    }

    /// Look up a token or fail with `TokenNotFound`
    pub fn require(&self, key: &TokenKey) -> Result<&TokenState, LedgerError> {
        self.tokens.get(key).ok_or(LedgerError::TokenNotFound(*key))
    }

    /// Mutable token lookup or `TokenNotFound`
    pub fn require_mut(&mut self, key: &TokenKey) -> Result<&mut TokenState, LedgerError> {
        self.tokens
            .get_mut(key)
            .ok_or(LedgerError::TokenNotFound(*key))
    }

    /// Check whether a token exists
    pub fn contains(&self, key: &TokenKey) -> bool {
        self.tokens.contains_key(key)
    }

    /// Number of tokens in the arena
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Remember the mirror of a native account that took part in an
    /// operation. Ethereum identities have nothing to index.
    pub fn index_mirror(&mut self, account: &CrossAccountId) {
        if let CrossAccountId::Native(addr) = account {
            self.mirrors.insert(addr.eth_mirror(), *addr);
        }
    }

    /// Collapse a cross-supplied identity to its canonical ledger key.
    ///
    /// An Ethereum identity matching the mirror of an indexed native
    /// account resolves to that native account; anything else passes
    /// through unchanged. Identities supplied positionally on the plain
    /// Ethereum surface are never routed through here.
    pub fn resolve(&self, account: CrossAccountId) -> CrossAccountId {
        match account {
            CrossAccountId::Ethereum(addr) => match self.mirrors.get(&addr) {
                Some(native) => CrossAccountId::Native(*native),
                None => account,
            },
            CrossAccountId::Native(_) => account,
        }
    }
}
