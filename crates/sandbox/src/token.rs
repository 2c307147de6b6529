//! In-memory asset ledger

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use gateway_core::{Address, Amount, AssetId};
use ledgers::AssetLedger;
use tokio::sync::Mutex;

/// Mutating ledger calls that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOp {
    /// Matched against the recipient
    Transfer,
    /// Matched against the account debited
    TransferFrom,
    /// Matched against the owner
    Approve,
    /// Matched against the holder
    Clawback,
}

#[derive(Debug, Clone)]
struct Fault {
    op: LedgerOp,
    account: Address,
    remaining: u32,
}

/// Balances and allowances with zero entries dropped, for before/after
/// comparisons
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerSnapshot {
    pub balances: BTreeMap<Address, Amount>,
    pub allowances: BTreeMap<(Address, Address), Amount>,
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<Address, Amount>,
    /// (owner, spender) -> amount
    allowances: HashMap<(Address, Address), Amount>,
    /// (operator, holder) -> transferred and not yet clawed back
    sent: HashMap<(Address, Address), Amount>,
    faults: Vec<Fault>,
}

impl LedgerState {
    fn balance(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn take_fault(&mut self, op: LedgerOp, account: &Address) -> bool {
        let Some(pos) = self
            .faults
            .iter()
            .position(|f| f.op == op && &f.account == account)
        else {
            return false;
        };

        self.faults[pos].remaining -= 1;
        if self.faults[pos].remaining == 0 {
            self.faults.remove(pos);
        }
        tracing::debug!(?op, account = %account, "Sandbox ledger: injected failure");
        true
    }

    fn move_balance(&mut self, from: &Address, to: &Address, amount: Amount) -> bool {
        let available = self.balance(from);
        if available < amount {
            return false;
        }
        if from == to {
            return true;
        }
        let Some(credited) = self.balance(to).checked_add(amount) else {
            return false;
        };
        self.balances.insert(from.clone(), available - amount);
        self.balances.insert(to.clone(), credited);
        true
    }
}

/// Ledger of one asset held entirely in memory
pub struct InMemoryAssetLedger {
    asset: AssetId,
    decimals: u8,
    state: Mutex<LedgerState>,
}

impl InMemoryAssetLedger {
    pub fn new(asset: AssetId, decimals: u8) -> Self {
        Self {
            asset,
            decimals,
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Create `amount` out of thin air for `holder`
    pub async fn mint(&self, holder: &Address, amount: Amount) {
        let mut state = self.state.lock().await;
        let balance = state.balance(holder).saturating_add(amount);
        state.balances.insert(holder.clone(), balance);
    }

    /// Make the next `times` calls of `op` touching `account` return `false`
    pub async fn fail_next(&self, op: LedgerOp, account: &Address, times: u32) {
        if times == 0 {
            return;
        }
        let mut state = self.state.lock().await;
        state.faults.push(Fault {
            op,
            account: account.clone(),
            remaining: times,
        });
    }

    pub async fn clear_faults(&self) {
        self.state.lock().await.faults.clear();
    }

    pub async fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.lock().await;
        LedgerSnapshot {
            balances: state
                .balances
                .iter()
                .filter(|(_, amount)| **amount > 0)
                .map(|(holder, amount)| (holder.clone(), *amount))
                .collect(),
            allowances: state
                .allowances
                .iter()
                .filter(|(_, amount)| **amount > 0)
                .map(|(key, amount)| (key.clone(), *amount))
                .collect(),
        }
    }
}

#[async_trait]
impl AssetLedger for InMemoryAssetLedger {
    fn asset(&self) -> AssetId {
        self.asset.clone()
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    async fn balance_of(&self, holder: &Address) -> Amount {
        self.state.lock().await.balance(holder)
    }

    async fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        let state = self.state.lock().await;
        state
            .allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    async fn transfer(&self, sender: &Address, to: &Address, amount: Amount) -> bool {
        let mut state = self.state.lock().await;
        if state.take_fault(LedgerOp::Transfer, to) || !state.move_balance(sender, to, amount) {
            return false;
        }
        let sent = state.sent.entry((sender.clone(), to.clone())).or_insert(0);
        *sent = sent.saturating_add(amount);
        true
    }

    async fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> bool {
        let mut state = self.state.lock().await;
        if state.take_fault(LedgerOp::TransferFrom, from) {
            return false;
        }

        let key = (from.clone(), spender.clone());
        let allowed = state.allowances.get(&key).copied().unwrap_or(0);
        if allowed < amount || !state.move_balance(from, to, amount) {
            return false;
        }
        state.allowances.insert(key, allowed - amount);
        true
    }

    async fn approve(&self, owner: &Address, spender: &Address, amount: Amount) -> bool {
        let mut state = self.state.lock().await;
        if state.take_fault(LedgerOp::Approve, owner) {
            return false;
        }
        state
            .allowances
            .insert((owner.clone(), spender.clone()), amount);
        true
    }

    async fn clawback(&self, operator: &Address, holder: &Address, amount: Amount) -> bool {
        let mut state = self.state.lock().await;
        if state.take_fault(LedgerOp::Clawback, holder) {
            return false;
        }

        let key = (operator.clone(), holder.clone());
        let credit = state.sent.get(&key).copied().unwrap_or(0);
        if credit < amount || !state.move_balance(holder, operator, amount) {
            return false;
        }
        state.sent.insert(key, credit - amount);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::from_low_u64(1)
    }

    fn bob() -> Address {
        Address::from_low_u64(2)
    }

    fn token() -> InMemoryAssetLedger {
        InMemoryAssetLedger::new(AssetId::Token(Address::from_low_u64(0x7c4)), 18)
    }

    #[tokio::test]
    async fn test_transfer_moves_balance() {
        let ledger = token();
        ledger.mint(&alice(), 100).await;

        assert!(ledger.transfer(&alice(), &bob(), 60).await);
        assert!(!ledger.transfer(&alice(), &bob(), 41).await);
        assert_eq!(ledger.balance_of(&alice()).await, 40);
        assert_eq!(ledger.balance_of(&bob()).await, 60);
    }

    #[tokio::test]
    async fn test_transfer_from_spends_allowance() {
        let ledger = token();
        ledger.mint(&alice(), 100).await;

        assert!(!ledger.transfer_from(&bob(), &alice(), &bob(), 10).await);
        assert!(ledger.approve(&alice(), &bob(), 30).await);
        assert!(ledger.transfer_from(&bob(), &alice(), &bob(), 20).await);
        assert_eq!(ledger.allowance(&alice(), &bob()).await, 10);
        assert!(!ledger.transfer_from(&bob(), &alice(), &bob(), 20).await);
    }

    #[tokio::test]
    async fn test_clawback_bounded_by_transfers() {
        let ledger = token();
        ledger.mint(&alice(), 100).await;
        ledger.mint(&bob(), 500).await;

        assert!(ledger.transfer(&alice(), &bob(), 10).await);
        assert!(!ledger.clawback(&alice(), &bob(), 11).await);
        assert!(ledger.clawback(&alice(), &bob(), 10).await);
        assert!(!ledger.clawback(&alice(), &bob(), 1).await);
        assert_eq!(ledger.balance_of(&alice()).await, 100);
        assert_eq!(ledger.balance_of(&bob()).await, 500);
    }

    #[tokio::test]
    async fn test_injected_fault_fires_once() {
        let ledger = token();
        ledger.mint(&alice(), 100).await;
        ledger.fail_next(LedgerOp::Transfer, &bob(), 1).await;

        assert!(!ledger.transfer(&alice(), &bob(), 1).await);
        assert!(ledger.transfer(&alice(), &bob(), 1).await);
    }

    #[tokio::test]
    async fn test_snapshot_ignores_emptied_entries() {
        let ledger = token();
        let before = ledger.snapshot().await;

        ledger.mint(&alice(), 5).await;
        assert!(ledger.approve(&alice(), &bob(), 5).await);
        assert_ne!(ledger.snapshot().await, before);

        assert!(ledger.transfer_from(&bob(), &alice(), &bob(), 5).await);
        assert!(ledger.transfer(&bob(), &alice(), 5).await);

        let after = ledger.snapshot().await;
        assert_eq!(after.balances.get(&alice()), Some(&5));
        assert!(after.allowances.is_empty());
    }
}
