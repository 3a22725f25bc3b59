use serde::{Deserialize, Serialize};
use std::sync::Arc;

use rft_core::account::CrossAccountId;
use rft_core::addr::{EthAddress, NativeAddress};
use rft_core::error::LedgerError;
use rft_core::event::{EventParty, LedgerEvent};
use rft_core::token::TokenKey;
use rft_engine::TokenEngine;

/// Cross-account argument as the Ethereum surface encodes it: a pair of
/// one Ethereum and one native address, exactly one of which is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthCrossAccount {
    pub eth: EthAddress,
    pub sub: NativeAddress,
}

impl EthCrossAccount {
    /// A pair carrying only the Ethereum side
    pub fn from_eth(eth: EthAddress) -> Self {
        Self {
            eth,
            sub: NativeAddress::ZERO,
        }
    }

    /// A pair carrying only the native side
    pub fn from_sub(sub: NativeAddress) -> Self {
        Self {
            eth: EthAddress::ZERO,
            sub,
        }
    }

    /// Decode the pair into a cross-account identity.
    ///
    /// Exactly one side must be set; an empty or doubly-set pair is
    /// malformed input.
    pub fn decode(&self) -> Result<CrossAccountId, LedgerError> {
        match (self.eth.is_zero(), self.sub.is_zero()) {
            (false, true) => Ok(CrossAccountId::from_eth(self.eth)),
            (true, false) => Ok(CrossAccountId::from_native(self.sub)),
            (true, true) => Err(LedgerError::InvalidArgument(
                "Cross account has neither side set".to_string(),
            )),
            (false, false) => Err(LedgerError::InvalidArgument(
                "Cross account has both sides set".to_string(),
            )),
        }
    }
}

/// Event as it appears on the Ethereum wire.
///
/// Parties are flat addresses: mint and burn are reported as the zero
/// address, full-ownership consolidation as the all-0xFF address, and
/// native accounts as their mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EthWireEvent {
    Transfer {
        collection: u32,
        token: u32,
        from: EthAddress,
        to: EthAddress,
        amount: u128,
    },
    Approval {
        collection: u32,
        token: u32,
        owner: EthAddress,
        spender: EthAddress,
        amount: u128,
    },
}

fn encode_party(party: &EventParty) -> EthAddress {
    match party {
        EventParty::Account(id) => id.eth_wire(),
        EventParty::Mint | EventParty::Burn => EthAddress::ZERO,
        EventParty::FullOwnership => EthAddress::FULL_OWNERSHIP,
    }
}

/// Encode a normalized event for the Ethereum wire
pub fn encode_event(event: &LedgerEvent) -> EthWireEvent {
    match event {
        LedgerEvent::Transfer {
            token,
            from,
            to,
            amount,
        } => EthWireEvent::Transfer {
            collection: token.collection.0,
            token: token.token.0,
            from: encode_party(from),
            to: encode_party(to),
            amount: *amount,
        },
        LedgerEvent::Approval {
            token,
            owner,
            spender,
            amount,
        } => EthWireEvent::Approval {
            collection: token.collection.0,
            token: token.token.0,
            owner: owner.eth_wire(),
            spender: spender.eth_wire(),
            amount: *amount,
        },
    }
}

fn wire(events: &[LedgerEvent]) -> Vec<EthWireEvent> {
    events.iter().map(encode_event).collect()
}

/// ERC-20 shaped view of one token.
///
/// The `caller` argument plays the role of the message sender. Plain
/// calls take addresses at face value; the `*_cross` calls take
/// [`EthCrossAccount`] pairs, whose identities are resolved against the
/// ledger's mirror index. The view holds no state of its own; any number
/// of views share one engine.
pub struct EthTokenApi {
    engine: Arc<TokenEngine>,
    token: TokenKey,
}

impl EthTokenApi {
    pub fn new(engine: Arc<TokenEngine>, token: TokenKey) -> Self {
        Self { engine, token }
    }

    /// The token this view is bound to
    pub fn token(&self) -> TokenKey {
        self.token
    }

    pub fn approve(
        &self,
        caller: EthAddress,
        spender: EthAddress,
        amount: u128,
    ) -> Result<Vec<EthWireEvent>, LedgerError> {
        let events = self.engine.approve(
            CrossAccountId::from_eth(caller),
            self.token,
            CrossAccountId::from_eth(spender),
            amount,
        )?;
        Ok(wire(&events))
    }

    pub fn approve_cross(
        &self,
        caller: EthAddress,
        spender: EthCrossAccount,
        amount: u128,
    ) -> Result<Vec<EthWireEvent>, LedgerError> {
        let spender = spender.decode()?;
        let events = self.engine.approve_cross(
            CrossAccountId::from_eth(caller),
            self.token,
            spender,
            amount,
        )?;
        Ok(wire(&events))
    }

    pub fn transfer(
        &self,
        caller: EthAddress,
        to: EthAddress,
        amount: u128,
    ) -> Result<Vec<EthWireEvent>, LedgerError> {
        let events = self.engine.transfer(
            CrossAccountId::from_eth(caller),
            self.token,
            CrossAccountId::from_eth(to),
            amount,
        )?;
        Ok(wire(&events))
    }

    pub fn transfer_cross(
        &self,
        caller: EthAddress,
        to: EthCrossAccount,
        amount: u128,
    ) -> Result<Vec<EthWireEvent>, LedgerError> {
        let to = to.decode()?;
        let events =
            self.engine
                .transfer_cross(CrossAccountId::from_eth(caller), self.token, to, amount)?;
        Ok(wire(&events))
    }

    pub fn transfer_from(
        &self,
        caller: EthAddress,
        from: EthAddress,
        to: EthAddress,
        amount: u128,
    ) -> Result<Vec<EthWireEvent>, LedgerError> {
        let events = self.engine.transfer_from(
            CrossAccountId::from_eth(caller),
            self.token,
            CrossAccountId::from_eth(from),
            CrossAccountId::from_eth(to),
            amount,
        )?;
        Ok(wire(&events))
    }

    pub fn transfer_from_cross(
        &self,
        caller: EthAddress,
        from: EthCrossAccount,
        to: EthCrossAccount,
        amount: u128,
    ) -> Result<Vec<EthWireEvent>, LedgerError> {
        let from = from.decode()?;
        let to = to.decode()?;
        let events = self.engine.transfer_from_cross(
            CrossAccountId::from_eth(caller),
            self.token,
            from,
            to,
            amount,
        )?;
        Ok(wire(&events))
    }

    pub fn burn_from_cross(
        &self,
        caller: EthAddress,
        from: EthCrossAccount,
        amount: u128,
    ) -> Result<Vec<EthWireEvent>, LedgerError> {
        let from = from.decode()?;
        let events =
            self.engine
                .burn_from_cross(CrossAccountId::from_eth(caller), self.token, from, amount)?;
        Ok(wire(&events))
    }

    pub fn repartition(
        &self,
        caller: EthAddress,
        new_total: u128,
    ) -> Result<Vec<EthWireEvent>, LedgerError> {
        let events =
            self.engine
                .repartition(CrossAccountId::from_eth(caller), self.token, new_total)?;
        Ok(wire(&events))
    }

    /// Balance of an address taken at face value
    pub fn balance_of(&self, owner: EthAddress) -> u128 {
        self.engine
            .balance_of(self.token, CrossAccountId::from_eth(owner))
    }

    /// Balance of a cross-account pair, resolved through the mirror index
    pub fn balance_of_cross(&self, owner: EthCrossAccount) -> Result<u128, LedgerError> {
        let owner = owner.decode()?;
        Ok(self.engine.balance_of_cross(self.token, owner))
    }
}
