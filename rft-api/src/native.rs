use std::sync::Arc;

use rft_core::account::CrossAccountId;
use rft_core::error::LedgerError;
use rft_core::event::LedgerEvent;
use rft_core::token::{CollectionId, TokenKey};
use rft_engine::TokenEngine;

/// Native chain surface over the piece ledger.
///
/// Calls take [`CrossAccountId`] directly and identities are always
/// resolved against the mirror index, so a caller may name a counterparty
/// by either side and reach the same bucket. Events come back normalized,
/// with no wire flattening.
pub struct NativeTokenApi {
    engine: Arc<TokenEngine>,
}

impl NativeTokenApi {
    pub fn new(engine: Arc<TokenEngine>) -> Self {
        Self { engine }
    }

    /// Create a token in a collection with its initial piece supply
    pub fn mint(
        &self,
        collection: CollectionId,
        to: CrossAccountId,
        pieces: u128,
    ) -> Result<(TokenKey, Vec<LedgerEvent>), LedgerError> {
        self.engine.mint(collection, to, pieces)
    }

    pub fn transfer(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        to: CrossAccountId,
        amount: u128,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.engine.transfer_cross(caller, token, to, amount)
    }

    pub fn approve(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        spender: CrossAccountId,
        amount: u128,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.engine.approve_cross(caller, token, spender, amount)
    }

    pub fn transfer_from(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        from: CrossAccountId,
        to: CrossAccountId,
        amount: u128,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.engine
            .transfer_from_cross(caller, token, from, to, amount)
    }

    pub fn burn_from(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        from: CrossAccountId,
        amount: u128,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.engine.burn_from_cross(caller, token, from, amount)
    }

    pub fn repartition(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        new_total: u128,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.engine.repartition(caller, token, new_total)
    }

    pub fn get_token_balance(&self, token: TokenKey, owner: CrossAccountId) -> u128 {
        self.engine.balance_of_cross(token, owner)
    }

    pub fn get_token_approved_pieces(
        &self,
        token: TokenKey,
        owner: CrossAccountId,
        spender: CrossAccountId,
    ) -> u128 {
        self.engine.approved_pieces_cross(token, owner, spender)
    }

    /// The ten largest holders, largest first. Ties keep the order in
    /// which the owners first acquired pieces.
    pub fn get_top_10_owners(&self, token: TokenKey) -> Vec<CrossAccountId> {
        self.engine
            .top_owners(token)
            .into_iter()
            .take(10)
            .map(|(owner, _)| owner)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eth::{EthCrossAccount, EthTokenApi};
    use rft_core::addr::NativeAddress;

    fn native(tag: u8) -> CrossAccountId {
        CrossAccountId::from_native(NativeAddress::new([tag; 32]))
    }

    fn setup(pieces: u128) -> (Arc<TokenEngine>, NativeTokenApi, TokenKey) {
        let engine = Arc::new(TokenEngine::new());
        let api = NativeTokenApi::new(engine.clone());
        let (token, _) = api.mint(CollectionId(1), native(1), pieces).unwrap();
        (engine, api, token)
    }

    #[test]
    fn test_top_10_owners_caps_the_list() {
        let (_, api, token) = setup(1000);

        // Spread pieces over eleven more owners, 20 up to 120
        for tag in 2..=12u8 {
            api.transfer(native(1), token, native(tag), tag as u128 * 10)
                .unwrap();
        }

        let top = api.get_top_10_owners(token);
        assert_eq!(top.len(), 10);
        // The original owner keeps 230, ahead of everyone
        assert_eq!(top[0], native(1));
        // The two smallest holders fall off the list
        assert!(!top.contains(&native(2)));
        assert!(!top.contains(&native(3)));
        assert!(top.contains(&native(4)));
    }

    #[test]
    fn test_approval_flow_matches_engine() {
        let (_, api, token) = setup(200);

        api.approve(native(1), token, native(2), 80).unwrap();
        assert_eq!(api.get_token_approved_pieces(token, native(1), native(2)), 80);

        api.transfer_from(native(2), token, native(1), native(3), 30)
            .unwrap();
        assert_eq!(api.get_token_approved_pieces(token, native(1), native(2)), 50);
        assert_eq!(api.get_token_balance(token, native(3)), 30);
    }

    #[test]
    fn test_both_surfaces_share_one_ledger() {
        let (engine, api, token) = setup(100);
        let eth_api = EthTokenApi::new(engine, token);

        // Move pieces through the Ethereum surface as the owner's mirror
        let owner = NativeAddress::new([1u8; 32]);
        eth_api
            .transfer_cross(
                owner.eth_mirror(),
                EthCrossAccount::from_sub(NativeAddress::new([2u8; 32])),
                25,
            )
            .unwrap();

        // The native surface sees the result
        assert_eq!(api.get_token_balance(token, native(1)), 75);
        assert_eq!(api.get_token_balance(token, native(2)), 25);
    }

    #[test]
    fn test_balances_agree_across_surfaces() {
        let (engine, api, token) = setup(300);
        let eth_api = EthTokenApi::new(engine, token);

        api.transfer(native(1), token, native(2), 120).unwrap();

        let owner = NativeAddress::new([2u8; 32]);
        let by_mirror = EthCrossAccount::from_eth(owner.eth_mirror());
        assert_eq!(
            eth_api.balance_of_cross(by_mirror).unwrap(),
            api.get_token_balance(token, native(2))
        );
    }

    #[test]
    fn test_burn_from_spends_allowance() {
        let (_, api, token) = setup(100);
        api.transfer(native(1), token, native(3), 30).unwrap();

        api.approve(native(1), token, native(2), 60).unwrap();
        let events = api.burn_from(native(2), token, native(1), 40).unwrap();

        // Burn plus the allowance it left behind
        assert_eq!(events.len(), 2);
        assert_eq!(api.get_token_balance(token, native(1)), 30);
        assert_eq!(api.get_token_approved_pieces(token, native(1), native(2)), 20);
    }
}
