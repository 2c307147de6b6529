//! Loan State Fetching
//!
//! Reads loan requests from a lending ledger. Values are never cached:
//! every operation re-reads what it needs.

use gateway_core::{GatewayError, LoanId};
use ledgers::{LendingLedger, LoanTarget};

use crate::state::LoanView;

/// Fetch a loan request
pub async fn fetch_loan_target(
    ledger: &dyn LendingLedger,
    loan_id: LoanId,
) -> Result<LoanTarget, GatewayError> {
    ledger
        .loan(loan_id)
        .await
        .ok_or_else(|| GatewayError::LoanNotFound {
            ledger: ledger.address().to_string(),
            loan_id,
        })
}

/// Fetch a loan request that still accepts funding
pub async fn fetch_open_loan(
    ledger: &dyn LendingLedger,
    loan_id: LoanId,
) -> Result<LoanTarget, GatewayError> {
    let target = fetch_loan_target(ledger, loan_id).await?;
    if target.is_fully_funded() {
        tracing::debug!(
            ledger = %target.ledger,
            loan_id,
            principal = target.requested_principal,
            "Loan already fully funded"
        );
        return Err(GatewayError::LoanAlreadyFunded { loan_id });
    }
    Ok(target)
}

/// Fetch a loan request and its owner
pub async fn fetch_loan_view(
    ledger: &dyn LendingLedger,
    loan_id: LoanId,
) -> Result<LoanView, GatewayError> {
    let target = fetch_loan_target(ledger, loan_id).await?;
    let owner = ledger.owner_of(loan_id).await;
    Ok(LoanView { target, owner })
}
