//! Loan funding
//!
//! Funds a loan from the journal operator's custody. The ledger pulls the
//! principal through an allowance that is granted for exactly the funded
//! amount and restored afterwards.

use gateway_core::{Address, Amount, AssetId, GatewayError, LoanId};
use ledgers::{Compensation, FundingReceipt, Journal, LendingError, LendingLedger};

/// Fund `amount` of `loan_id`, naming `beneficiary` as the prospective owner.
///
/// Fails unless the ledger records exactly `amount`. A ledger that refuses
/// because the loan closed or shrank in the meantime reports
/// [`GatewayError::LoanAlreadyFunded`].
pub async fn fund_loan(
    journal: &mut Journal<'_>,
    ledger: &dyn LendingLedger,
    loan_id: LoanId,
    amount: Amount,
    beneficiary: &Address,
) -> Result<FundingReceipt, GatewayError> {
    let operator = journal.operator().clone();
    let ledger_address = ledger.address();
    let principal_asset = ledger.principal_asset();
    let principal = journal.registry().asset(&principal_asset)?;

    let previous = principal.allowance(&operator, &ledger_address).await;
    if !principal.approve(&operator, &ledger_address, amount).await {
        return Err(GatewayError::TransferFailed {
            asset: principal_asset,
            amount,
            operation: "approve lending ledger".to_string(),
        });
    }
    journal.record(Compensation::RestoreAllowance {
        asset: principal_asset.clone(),
        spender: ledger_address.clone(),
        previous,
    });

    let receipt = ledger
        .fund_loan(&operator, loan_id, amount, beneficiary)
        .await
        .map_err(|e| map_lending_error(e, &ledger_address, &principal_asset))?;

    journal.record(Compensation::UnfundLoan {
        ledger: ledger_address.clone(),
        receipt: receipt.clone(),
    });

    if receipt.loan_id != loan_id || receipt.amount != amount {
        tracing::error!(
            loan_id,
            requested = amount,
            recorded = receipt.amount,
            "Lending ledger recorded a different funding"
        );
        return Err(GatewayError::TransferFailed {
            asset: principal_asset,
            amount,
            operation: format!("fund loan {}", loan_id),
        });
    }

    if !principal.approve(&operator, &ledger_address, previous).await {
        return Err(GatewayError::TransferFailed {
            asset: principal_asset,
            amount: previous,
            operation: "restore lending ledger allowance".to_string(),
        });
    }

    tracing::info!(
        ledger = %ledger_address,
        loan_id,
        amount,
        funded_after = receipt.funded_after,
        fully_funded = receipt.fully_funded,
        "Loan funded"
    );

    Ok(receipt)
}

fn map_lending_error(
    err: LendingError,
    ledger: &Address,
    principal_asset: &AssetId,
) -> GatewayError {
    match err {
        LendingError::UnknownLoan(loan_id) => GatewayError::LoanNotFound {
            ledger: ledger.to_string(),
            loan_id,
        },
        LendingError::Closed { loan_id } | LendingError::ExceedsRemaining { loan_id, .. } => {
            GatewayError::LoanAlreadyFunded { loan_id }
        }
        LendingError::PaymentFailed { loan_id, amount } => GatewayError::TransferFailed {
            asset: principal_asset.clone(),
            amount,
            operation: format!("principal payment for loan {}", loan_id),
        },
    }
}
