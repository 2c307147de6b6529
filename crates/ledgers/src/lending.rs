//! Lending ledger interface

use gateway_core::{Address, Amount, AssetId, LoanId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A loan request as recorded by its lending ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTarget {
    pub ledger: Address,
    pub loan_id: LoanId,
    pub requested_principal: Amount,
    pub current_funded_amount: Amount,
}

impl LoanTarget {
    /// Principal still open to lenders
    pub fn remaining(&self) -> Amount {
        self.requested_principal
            .saturating_sub(self.current_funded_amount)
    }

    pub fn is_fully_funded(&self) -> bool {
        self.current_funded_amount >= self.requested_principal
    }
}

/// Record of one successful `fund_loan` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingReceipt {
    pub loan_id: LoanId,
    pub funder: Address,
    pub beneficiary: Address,
    /// Amount added to the loan's funded total
    pub amount: Amount,
    /// Funded total after this call
    pub funded_after: Amount,
    /// Whether this call completed the principal (ownership moved to the beneficiary)
    pub fully_funded: bool,
}

/// Lending-ledger failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LendingError {
    #[error("Unknown loan {0}")]
    UnknownLoan(LoanId),

    #[error("Loan {loan_id} is no longer open for funding")]
    Closed { loan_id: LoanId },

    #[error("Loan {loan_id} needs {remaining}, {requested} offered")]
    ExceedsRemaining {
        loan_id: LoanId,
        requested: Amount,
        remaining: Amount,
    },

    #[error("Principal payment of {amount} for loan {loan_id} failed")]
    PaymentFailed { loan_id: LoanId, amount: Amount },
}

/// A ledger of loan requests funded in its principal asset.
///
/// `fund_loan` pulls the principal from `funder` through the funder's
/// allowance to [`LendingLedger::address`] and pays it to the borrower.
/// Partial funding leaves the loan open. The call that completes the
/// principal makes `beneficiary` the loan's owner.
#[mockall::automock]
#[async_trait::async_trait]
pub trait LendingLedger: Send + Sync {
    fn address(&self) -> Address;

    /// Asset every loan in this ledger is denominated in.
    fn principal_asset(&self) -> AssetId;

    async fn loan(&self, loan_id: LoanId) -> Option<LoanTarget>;

    async fn fund_loan(
        &self,
        funder: &Address,
        loan_id: LoanId,
        amount: Amount,
        beneficiary: &Address,
    ) -> Result<FundingReceipt, LendingError>;

    /// Reverses a funding recorded in `receipt`: restores the funded total and
    /// owner and returns `receipt.amount` to `funder`.
    async fn unfund_loan(&self, funder: &Address, receipt: &FundingReceipt) -> bool;

    async fn owner_of(&self, loan_id: LoanId) -> Option<Address>;
}
