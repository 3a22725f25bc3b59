use log::{debug, info};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rft_core::account::CrossAccountId;
use rft_core::error::LedgerError;
use rft_core::event::{EventParty, LedgerEvent};
use rft_core::token::{CollectionId, TokenKey};
use rft_ledger::arena::TokenLedger;
use rft_ledger::journal::FileEventJournal;

/// Serialized executor over the token arena.
///
/// Every mutating call locks the arena for its whole duration, validates
/// all preconditions first and only then mutates, so a rejected call
/// leaves no trace and no interleaving of two calls is observable.
/// Emitted events are journaled (when a journal is attached) before the
/// mutations land; since validation has already passed at that point, a
/// journaled operation always applies.
///
/// Plain operations take identities at face value. The `_cross` variants
/// additionally collapse Ethereum identities that mirror a known native
/// account onto that account, which is what keeps both address spaces
/// observing one ledger.
pub struct TokenEngine {
    /// The single shared arena
    ledger: Mutex<TokenLedger>,

    /// Optional append-only event journal
    journal: Option<FileEventJournal>,
}

impl TokenEngine {
    /// Create an engine over an empty arena, without a journal
    pub fn new() -> Self {
        Self {
            ledger: Mutex::new(TokenLedger::new()),
            journal: None,
        }
    }

    /// Create an engine that journals every emitted event to `path`
    pub fn with_journal(path: &Path) -> Result<Self, LedgerError> {
        let journal = FileEventJournal::new();
        journal.open(path)?;
        Ok(Self {
            ledger: Mutex::new(TokenLedger::new()),
            journal: Some(journal),
        })
    }

    /// The attached event journal, if any
    pub fn journal(&self) -> Option<&FileEventJournal> {
        self.journal.as_ref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, TokenLedger>, LedgerError> {
        self.ledger
            .lock()
            .map_err(|e| LedgerError::Other(format!("Failed to acquire ledger lock: {}", e)))
    }

    fn record(&self, events: &[LedgerEvent]) -> Result<(), LedgerError> {
        if let Some(journal) = &self.journal {
            journal.record(events)?;
        }
        Ok(())
    }

    // ---- Mutations ----

    /// Mint the next token of `collection` with `pieces` credited wholly
    /// to `to`, and emit the corresponding mint transfer.
    ///
    /// Token ids are assigned sequentially per collection, starting at 1.
    pub fn mint(
        &self,
        collection: CollectionId,
        to: CrossAccountId,
        pieces: u128,
    ) -> Result<(TokenKey, Vec<LedgerEvent>), LedgerError> {
        if pieces == 0 {
            return Err(LedgerError::InvalidArgument(
                "Cannot mint a token with zero pieces".to_string(),
            ));
        }

        let mut ledger = self.lock()?;
        let to = ledger.resolve(to);
        let token = ledger.peek_next_token(collection);

        let events = vec![LedgerEvent::Transfer {
            token,
            from: EventParty::Mint,
            to: to.into(),
            amount: pieces,
        }];
        self.record(&events)?;

        let token = ledger.mint_token(collection, to, pieces);
        ledger.index_mirror(&to);

        info!("Minted token {} with {} pieces to {}", token, pieces, to);
        Ok((token, events))
    }

    /// Move `amount` pieces of `token` from the caller to `to`.
    ///
    /// The caller must hold at least `amount` pieces and, regardless of
    /// the amount, must hold some pieces at all: a zero holder cannot
    /// transfer even zero. A zero-amount call by an actual holder is a
    /// legal no-op that still emits its event.
    pub fn transfer(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        to: CrossAccountId,
        amount: u128,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.transfer_inner(caller, token, to, amount, false)
    }

    /// Like [`transfer`](Self::transfer), with all identities resolved
    /// through the mirror index.
    pub fn transfer_cross(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        to: CrossAccountId,
        amount: u128,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.transfer_inner(caller, token, to, amount, true)
    }

    fn transfer_inner(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        to: CrossAccountId,
        amount: u128,
        resolve: bool,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let mut ledger = self.lock()?;
        let (caller, to) = if resolve {
            (ledger.resolve(caller), ledger.resolve(to))
        } else {
            (caller, to)
        };
        let state = ledger.require(&token)?;

        let held = state.balance_of(&caller);
        if held == 0 || held < amount {
            return Err(LedgerError::InsufficientBalance {
                held,
                needed: amount,
            });
        }
        let to_held = state.balance_of(&to);

        let events = vec![LedgerEvent::Transfer {
            token,
            from: caller.into(),
            to: to.into(),
            amount,
        }];
        self.record(&events)?;

        // A self transfer moves nothing
        if amount > 0 && caller != to {
            let state = ledger.require_mut(&token)?;
            state.set_balance(caller, held - amount);
            state.set_balance(to, to_held + amount);
        }

        ledger.index_mirror(&caller);
        ledger.index_mirror(&to);

        debug!(
            "Transferred {} pieces of token {} from {} to {}",
            amount, token, caller, to
        );
        Ok(events)
    }

    /// Set the allowance of `spender` over the caller's pieces of `token`.
    ///
    /// Approving is bounded by the caller's balance at approval time; it
    /// overwrites any previous allowance and re-approving the same value
    /// still emits an event.
    pub fn approve(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        spender: CrossAccountId,
        amount: u128,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.approve_inner(caller, token, spender, amount, false)
    }

    /// Like [`approve`](Self::approve), with all identities resolved
    /// through the mirror index.
    pub fn approve_cross(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        spender: CrossAccountId,
        amount: u128,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.approve_inner(caller, token, spender, amount, true)
    }

    fn approve_inner(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        spender: CrossAccountId,
        amount: u128,
        resolve: bool,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let mut ledger = self.lock()?;
        let (caller, spender) = if resolve {
            (ledger.resolve(caller), ledger.resolve(spender))
        } else {
            (caller, spender)
        };
        let state = ledger.require(&token)?;

        let held = state.balance_of(&caller);
        if amount > held {
            return Err(LedgerError::CantApproveMoreThanOwned {
                held,
                requested: amount,
            });
        }

        let events = vec![LedgerEvent::Approval {
            token,
            owner: caller,
            spender,
            amount,
        }];
        self.record(&events)?;

        let state = ledger.require_mut(&token)?;
        state.set_approval(caller, spender, amount);

        ledger.index_mirror(&caller);
        ledger.index_mirror(&spender);

        debug!(
            "Approved {} pieces of token {} for spender {} by {}",
            amount, token, spender, caller
        );
        Ok(events)
    }

    /// Move `amount` pieces of `token` from `from` to `to` on the
    /// caller's allowance.
    ///
    /// The allowance is checked before the balance and decremented by the
    /// amount moved; the trailing event reports what remains of it. A
    /// caller spending their own pieces needs no allowance and gets no
    /// trailing event.
    pub fn transfer_from(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        from: CrossAccountId,
        to: CrossAccountId,
        amount: u128,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.transfer_from_inner(caller, token, from, to, amount, false)
    }

    /// Like [`transfer_from`](Self::transfer_from), with all identities
    /// resolved through the mirror index.
    pub fn transfer_from_cross(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        from: CrossAccountId,
        to: CrossAccountId,
        amount: u128,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.transfer_from_inner(caller, token, from, to, amount, true)
    }

    fn transfer_from_inner(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        from: CrossAccountId,
        to: CrossAccountId,
        amount: u128,
        resolve: bool,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let mut ledger = self.lock()?;
        let (caller, from, to) = if resolve {
            (
                ledger.resolve(caller),
                ledger.resolve(from),
                ledger.resolve(to),
            )
        } else {
            (caller, from, to)
        };
        let state = ledger.require(&token)?;

        // Spending your own pieces needs no allowance
        let consumed = if caller != from {
            let approved = state.approval_of(&from, &caller);
            if approved < amount {
                return Err(LedgerError::ApprovedValueTooLow {
                    approved,
                    needed: amount,
                });
            }
            Some(approved - amount)
        } else {
            None
        };

        let held = state.balance_of(&from);
        if held == 0 || held < amount {
            return Err(LedgerError::InsufficientBalance {
                held,
                needed: amount,
            });
        }
        let to_held = state.balance_of(&to);

        let mut events = vec![LedgerEvent::Transfer {
            token,
            from: from.into(),
            to: to.into(),
            amount,
        }];
        if let Some(remaining) = consumed {
            events.push(LedgerEvent::Approval {
                token,
                owner: from,
                spender: caller,
                amount: remaining,
            });
        }
        self.record(&events)?;

        let state = ledger.require_mut(&token)?;
        if amount > 0 && from != to {
            state.set_balance(from, held - amount);
            state.set_balance(to, to_held + amount);
        }
        if let Some(remaining) = consumed {
            state.set_approval(from, caller, remaining);
        }

        ledger.index_mirror(&caller);
        ledger.index_mirror(&from);
        ledger.index_mirror(&to);

        debug!(
            "Transferred {} pieces of token {} from {} to {} by {}",
            amount, token, from, to, caller
        );
        Ok(events)
    }

    /// Burn `amount` pieces of `token` out of `from`'s balance on the
    /// caller's allowance, shrinking the circulating total.
    ///
    /// Gating works exactly as in [`transfer_from`](Self::transfer_from),
    /// with the burn sink as destination. If afterwards a single account
    /// holds every remaining piece, a consolidation transfer to the
    /// full-ownership marker is emitted on top. Burning the last piece
    /// drops all approvals of the token.
    pub fn burn_from(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        from: CrossAccountId,
        amount: u128,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.burn_from_inner(caller, token, from, amount, false)
    }

    /// Like [`burn_from`](Self::burn_from), with all identities resolved
    /// through the mirror index.
    pub fn burn_from_cross(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        from: CrossAccountId,
        amount: u128,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.burn_from_inner(caller, token, from, amount, true)
    }

    fn burn_from_inner(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        from: CrossAccountId,
        amount: u128,
        resolve: bool,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let mut ledger = self.lock()?;
        let (caller, from) = if resolve {
            (ledger.resolve(caller), ledger.resolve(from))
        } else {
            (caller, from)
        };
        let state = ledger.require(&token)?;

        let consumed = if caller != from {
            let approved = state.approval_of(&from, &caller);
            if approved < amount {
                return Err(LedgerError::ApprovedValueTooLow {
                    approved,
                    needed: amount,
                });
            }
            Some(approved - amount)
        } else {
            None
        };

        let held = state.balance_of(&from);
        if held == 0 || held < amount {
            return Err(LedgerError::InsufficientBalance {
                held,
                needed: amount,
            });
        }

        let post_from = held - amount;
        let post_total = state.total_pieces() - amount;

        // Who, if anyone, holds every remaining piece once the burn lands
        let consolidated = if post_total == 0 {
            None
        } else if post_from == 0 {
            if state.owner_count() == 2 {
                state
                    .owners_ranked()
                    .into_iter()
                    .map(|(owner, _)| owner)
                    .find(|owner| *owner != from)
            } else {
                None
            }
        } else if state.sole_owner() == Some(from) {
            Some(from)
        } else {
            None
        };

        let mut events = vec![LedgerEvent::Transfer {
            token,
            from: from.into(),
            to: EventParty::Burn,
            amount,
        }];
        if let Some(remaining) = consumed {
            events.push(LedgerEvent::Approval {
                token,
                owner: from,
                spender: caller,
                amount: remaining,
            });
        }
        if let Some(owner) = consolidated {
            events.push(LedgerEvent::Transfer {
                token,
                from: owner.into(),
                to: EventParty::FullOwnership,
                amount: post_total,
            });
        }
        self.record(&events)?;

        let state = ledger.require_mut(&token)?;
        state.set_balance(from, post_from);
        state.set_total(post_total);
        if let Some(remaining) = consumed {
            state.set_approval(from, caller, remaining);
        }
        if post_total == 0 {
            state.clear_approvals();
        }

        ledger.index_mirror(&caller);
        ledger.index_mirror(&from);

        debug!(
            "Burned {} pieces of token {} from {} by {}",
            amount, token, from, caller
        );
        Ok(events)
    }

    /// Change the circulating total of `token` to `new_total`, minting or
    /// burning the delta against the caller's balance.
    ///
    /// Only the sole owner holding every piece may repartition; partial
    /// owners are rejected before anything mutates, and a token burned
    /// down to zero pieces has no owner left to repartition it back.
    /// Repartitioning to the current total succeeds without an event, and
    /// repartitioning to zero is legal and burns the whole holding.
    pub fn repartition(
        &self,
        caller: CrossAccountId,
        token: TokenKey,
        new_total: u128,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let mut ledger = self.lock()?;
        let caller = ledger.resolve(caller);
        let state = ledger.require(&token)?;

        let total = state.total_pieces();
        if state.sole_owner() != Some(caller) {
            return Err(LedgerError::RepartitionWhileNotOwningAllPieces(token));
        }
        if new_total == total {
            // Nothing to mint or burn
            return Ok(Vec::new());
        }

        let events = if new_total > total {
            vec![LedgerEvent::Transfer {
                token,
                from: EventParty::Mint,
                to: caller.into(),
                amount: new_total - total,
            }]
        } else {
            vec![LedgerEvent::Transfer {
                token,
                from: caller.into(),
                to: EventParty::Burn,
                amount: total - new_total,
            }]
        };
        self.record(&events)?;

        let state = ledger.require_mut(&token)?;
        state.set_balance(caller, new_total);
        state.set_total(new_total);
        if new_total == 0 {
            state.clear_approvals();
        }

        ledger.index_mirror(&caller);

        info!(
            "Repartitioned token {} from {} to {} pieces",
            token, total, new_total
        );
        Ok(events)
    }

    // ---- Queries ----
    //
    // Queries never error: unknown tokens and owners read as zero or
    // empty, matching how the ledger is observed from the outside.

    /// Check whether a token exists
    pub fn token_exists(&self, token: TokenKey) -> bool {
        match self.lock() {
            Ok(ledger) => ledger.contains(&token),
            Err(_) => false,
        }
    }

    /// Circulating total of a token; 0 for an unknown token
    pub fn total_pieces(&self, token: TokenKey) -> u128 {
        match self.lock() {
            Ok(ledger) => ledger
                .token(&token)
                .map(|state| state.total_pieces())
                .unwrap_or(0),
            Err(_) => 0,
        }
    }

    /// Pieces of `token` held by `owner`, taken at face value
    pub fn balance_of(&self, token: TokenKey, owner: CrossAccountId) -> u128 {
        match self.lock() {
            Ok(ledger) => ledger
                .token(&token)
                .map(|state| state.balance_of(&owner))
                .unwrap_or(0),
            Err(_) => 0,
        }
    }

    /// Pieces of `token` held by `owner`, with the identity resolved
    /// through the mirror index
    pub fn balance_of_cross(&self, token: TokenKey, owner: CrossAccountId) -> u128 {
        match self.lock() {
            Ok(ledger) => {
                let owner = ledger.resolve(owner);
                ledger
                    .token(&token)
                    .map(|state| state.balance_of(&owner))
                    .unwrap_or(0)
            }
            Err(_) => 0,
        }
    }

    /// Allowance of `spender` over `owner`'s pieces, taken at face value
    pub fn approved_pieces(
        &self,
        token: TokenKey,
        owner: CrossAccountId,
        spender: CrossAccountId,
    ) -> u128 {
        match self.lock() {
            Ok(ledger) => ledger
                .token(&token)
                .map(|state| state.approval_of(&owner, &spender))
                .unwrap_or(0),
            Err(_) => 0,
        }
    }

    /// Allowance of `spender` over `owner`'s pieces, with both identities
    /// resolved through the mirror index
    pub fn approved_pieces_cross(
        &self,
        token: TokenKey,
        owner: CrossAccountId,
        spender: CrossAccountId,
    ) -> u128 {
        match self.lock() {
            Ok(ledger) => {
                let owner = ledger.resolve(owner);
                let spender = ledger.resolve(spender);
                ledger
                    .token(&token)
                    .map(|state| state.approval_of(&owner, &spender))
                    .unwrap_or(0)
            }
            Err(_) => 0,
        }
    }

    /// All owners of a token with their balances, ranked by pieces
    /// descending, ties broken by first appearance
    pub fn top_owners(&self, token: TokenKey) -> Vec<(CrossAccountId, u128)> {
        match self.lock() {
            Ok(ledger) => ledger
                .token(&token)
                .map(|state| state.owners_ranked())
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }
}

impl Default for TokenEngine {
    fn default() -> Self {
        Self::new()
    }
}
