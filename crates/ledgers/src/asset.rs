//! Asset ledger interface
//!
//! One ledger per asset. Every mutating call names the account it acts for
//! and reports failure through its boolean result rather than by erroring,
//! so callers must check every return value.

use gateway_core::{Address, Amount, AssetId};

#[mockall::automock]
#[async_trait::async_trait]
pub trait AssetLedger: Send + Sync {
    /// The asset this ledger keeps balances for.
    fn asset(&self) -> AssetId;

    /// Decimal places of one whole unit.
    fn decimals(&self) -> u8;

    async fn balance_of(&self, holder: &Address) -> Amount;

    async fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    /// Moves `amount` from `sender` to `to`.
    async fn transfer(&self, sender: &Address, to: &Address, amount: Amount) -> bool;

    /// Moves `amount` from `from` to `to`, spending `spender`'s allowance.
    async fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> bool;

    /// Sets `spender`'s allowance over `owner`'s balance to `amount`.
    async fn approve(&self, owner: &Address, spender: &Address, amount: Amount) -> bool;

    /// Returns to `operator` up to `amount` that `operator` previously
    /// transferred to `holder` and that has not been clawed back yet.
    async fn clawback(&self, operator: &Address, holder: &Address, amount: Amount) -> bool;
}
