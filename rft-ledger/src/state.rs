use indexmap::IndexMap;
use std::collections::HashMap;

use rft_core::account::CrossAccountId;

/// Per-token piece accounting: the circulating total, who holds how many
/// pieces, and which spenders are approved for how much.
///
/// The owner table is insertion ordered; when two owners hold equal piece
/// counts, the earlier entrant ranks first. Zero balances and zero
/// allowances are never stored.
///
/// This is a plain state machine: all reads and writes are infallible, and
/// validation (balance checks, allowance checks) belongs to the engine
/// driving it.
#[derive(Debug, Clone, Default)]
pub struct TokenState {
    /// Total pieces in circulation for this token
    total_pieces: u128,

    /// Pieces held per owner
    owners: IndexMap<CrossAccountId, u128>,

    /// Live approvals keyed by (owner, spender)
    allowances: HashMap<(CrossAccountId, CrossAccountId), u128>,
}

impl TokenState {
    /// Create a token with `total` pieces credited wholly to `owner`
    pub fn new(owner: CrossAccountId, total: u128) -> Self {
        let mut owners = IndexMap::new();
        if total > 0 {
            owners.insert(owner, total);
        }
        Self {
            total_pieces: total,
            owners,
            allowances: HashMap::new(),
        }
    }

    /// Total pieces in circulation
    pub fn total_pieces(&self) -> u128 {
        self.total_pieces
    }

    /// Replace the circulating total.
    ///
    /// Callers keep the conservation invariant themselves: the owner table
    /// must be adjusted to sum to the new total in the same operation.
    pub fn set_total(&mut self, total: u128) {
        self.total_pieces = total;
    }

    /// Pieces held by `owner`; 0 for an unknown owner
    pub fn balance_of(&self, owner: &CrossAccountId) -> u128 {
        self.owners.get(owner).copied().unwrap_or(0)
    }

    /// Set an owner's balance outright.
    ///
    /// A zero balance removes the entry; the positions of the remaining
    /// entries are preserved. A new nonzero owner enters at the end of the
    /// table, an existing owner keeps its position.
    pub fn set_balance(&mut self, owner: CrossAccountId, amount: u128) {
        if amount == 0 {
            self.owners.shift_remove(&owner);
        } else {
            self.owners.insert(owner, amount);
        }
    }

    /// Number of accounts currently holding pieces
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// The sole holder, if exactly one account holds pieces
    pub fn sole_owner(&self) -> Option<CrossAccountId> {
        if self.owners.len() == 1 {
            self.owners.keys().next().copied()
        } else {
            None
        }
    }

    /// Owners and their balances, ranked by pieces descending.
    ///
    /// The sort is stable, so equal balances rank by first appearance in
    /// the owner table.
    pub fn owners_ranked(&self) -> Vec<(CrossAccountId, u128)> {
        let mut ranked: Vec<(CrossAccountId, u128)> =
            self.owners.iter().map(|(k, v)| (*k, *v)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Sum of all owner balances
    pub fn held_pieces(&self) -> u128 {
        self.owners.values().sum()
    }

    /// Allowance of `spender` over `owner`'s pieces; 0 if absent
    pub fn approval_of(&self, owner: &CrossAccountId, spender: &CrossAccountId) -> u128 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Overwrite the (owner, spender) allowance.
    ///
    /// Last write wins; amounts never accumulate. Zero clears the entry,
    /// which reads back as zero either way.
    pub fn set_approval(&mut self, owner: CrossAccountId, spender: CrossAccountId, amount: u128) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    /// Number of live allowance entries
    pub fn approval_count(&self) -> usize {
        self.allowances.len()
    }

    /// Drop every allowance of this token.
    ///
    /// Used when the last piece leaves circulation; approvals over a token
    /// with no pieces are meaningless.
    pub fn clear_approvals(&mut self) {
        self.allowances.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rft_core::addr::NativeAddress;

    fn account(tag: u8) -> CrossAccountId {
        CrossAccountId::from_native(NativeAddress::new([tag; 32]))
    }

    #[test]
    fn test_new_credits_whole_total() {
        let owner = account(1);
        let state = TokenState::new(owner, 100);

        assert_eq!(state.total_pieces(), 100);
        assert_eq!(state.balance_of(&owner), 100);
        assert_eq!(state.owner_count(), 1);
        assert_eq!(state.held_pieces(), state.total_pieces());
    }

    #[test]
    fn test_new_with_zero_total_has_no_owners() {
        let state = TokenState::new(account(1), 0);
        assert_eq!(state.owner_count(), 0);
        assert_eq!(state.total_pieces(), 0);
    }

    #[test]
    fn test_set_balance_zero_removes_entry() {
        let owner = account(1);
        let mut state = TokenState::new(owner, 10);

        state.set_balance(owner, 0);
        assert_eq!(state.balance_of(&owner), 0);
        assert_eq!(state.owner_count(), 0);

        // Removing an absent owner is a no-op
        state.set_balance(account(2), 0);
        assert_eq!(state.owner_count(), 0);
    }

    #[test]
    fn test_unknown_owner_reads_zero() {
        let state = TokenState::new(account(1), 10);
        assert_eq!(state.balance_of(&account(9)), 0);
    }

    #[test]
    fn test_owners_ranked_descending_with_insertion_tiebreak() {
        let a = account(1);
        let b = account(2);
        let c = account(3);
        let d = account(4);

        let mut state = TokenState::new(a, 100);
        state.set_balance(a, 30);
        state.set_balance(b, 50);
        state.set_balance(c, 30);
        state.set_balance(d, 5);
        state.set_total(115);

        // b first on balance; a before c on insertion order despite the tie
        let ranked = state.owners_ranked();
        assert_eq!(ranked, vec![(b, 50), (a, 30), (c, 30), (d, 5)]);
    }

    #[test]
    fn test_existing_owner_keeps_rank_position() {
        let a = account(1);
        let b = account(2);

        let mut state = TokenState::new(a, 10);
        state.set_balance(a, 5);
        state.set_balance(b, 5);
        state.set_total(10);

        // Updating a's balance in place must not move it behind b
        state.set_balance(a, 5);
        assert_eq!(state.owners_ranked(), vec![(a, 5), (b, 5)]);
    }

    #[test]
    fn test_approval_overwrite_not_accumulation() {
        let owner = account(1);
        let spender = account(2);
        let mut state = TokenState::new(owner, 100);

        state.set_approval(owner, spender, 100);
        state.set_approval(owner, spender, 100);
        assert_eq!(state.approval_of(&owner, &spender), 100);

        state.set_approval(owner, spender, 40);
        assert_eq!(state.approval_of(&owner, &spender), 40);
    }

    #[test]
    fn test_zero_approval_clears_entry() {
        let owner = account(1);
        let spender = account(2);
        let mut state = TokenState::new(owner, 100);

        state.set_approval(owner, spender, 25);
        assert_eq!(state.approval_count(), 1);

        state.set_approval(owner, spender, 0);
        assert_eq!(state.approval_of(&owner, &spender), 0);
        assert_eq!(state.approval_count(), 0);
    }

    #[test]
    fn test_clear_approvals() {
        let owner = account(1);
        let mut state = TokenState::new(owner, 100);

        state.set_approval(owner, account(2), 10);
        state.set_approval(owner, account(3), 20);
        state.clear_approvals();

        assert_eq!(state.approval_count(), 0);
        assert_eq!(state.approval_of(&owner, &account(2)), 0);
    }

    #[test]
    fn test_approvals_keyed_per_spender() {
        let owner = account(1);
        let mut state = TokenState::new(owner, 100);

        state.set_approval(owner, account(2), 10);
        state.set_approval(owner, account(3), 20);

        assert_eq!(state.approval_of(&owner, &account(2)), 10);
        assert_eq!(state.approval_of(&owner, &account(3)), 20);
        assert_eq!(state.approval_of(&account(2), &owner), 0);
    }
}
