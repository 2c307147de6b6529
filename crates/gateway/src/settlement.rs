//! Refund/settlement path
//!
//! Sweeps what the loan did not absorb back to the payer. Each refund is a
//! single transfer, attempted once.

use gateway_core::{Address, Amount, AssetId, GatewayError};
use ledgers::{Compensation, Journal};

use crate::SettlementOutcome;

/// Pay out both refunds of `outcome` to `payer`.
///
/// The destination-asset surplus goes first, then the unconsumed source.
/// A refund of zero is skipped.
pub async fn settle(
    journal: &mut Journal<'_>,
    outcome: &SettlementOutcome,
    payer: &Address,
    source_asset: &AssetId,
    dest_asset: &AssetId,
) -> Result<(), GatewayError> {
    refund(
        journal,
        dest_asset,
        outcome.amount_refunded_to_payer,
        payer,
        "refund surplus",
    )
    .await?;
    refund(
        journal,
        source_asset,
        outcome.amount_refunded_in_source_asset,
        payer,
        "refund unconsumed source",
    )
    .await
}

async fn refund(
    journal: &mut Journal<'_>,
    asset: &AssetId,
    amount: Amount,
    payer: &Address,
    operation: &str,
) -> Result<(), GatewayError> {
    if amount == 0 {
        return Ok(());
    }

    let ledger = journal.registry().asset(asset)?;
    let operator = journal.operator().clone();
    if !ledger.transfer(&operator, payer, amount).await {
        return Err(GatewayError::TransferFailed {
            asset: asset.clone(),
            amount,
            operation: operation.to_string(),
        });
    }

    tracing::debug!(asset = %asset, amount, payer = %payer, "{}", operation);
    journal.record(Compensation::ClawbackRefund {
        asset: asset.clone(),
        payer: payer.clone(),
        amount,
    });
    Ok(())
}
