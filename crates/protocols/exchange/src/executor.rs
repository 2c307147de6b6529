//! Swap execution
//!
//! Runs one conversion for the journal's operator, which must already hold
//! `source_amount` of the source asset. Every completed side effect is
//! journaled before the next one starts.

use gateway_core::{Address, GatewayError, Rate};
use ledgers::{Compensation, ExchangeAdapter, ExchangeError, Journal, TradeReceipt};

use crate::calculator::realized_slippage_bps;
use crate::oracle::within_quote;
use crate::state::{ConversionRequest, QuotedRate, SwapResult};

/// Execute a quoted conversion.
///
/// Native sources are transferred to the exchange before trading. Token
/// sources are approved for exactly `source_amount` and the prior allowance
/// is restored afterwards. Accounting uses the exchange's receipt, never
/// balance differences, so concurrent operations on the same ledgers do not
/// interfere.
pub async fn execute(
    journal: &mut Journal<'_>,
    exchange: &dyn ExchangeAdapter,
    request: &ConversionRequest,
    quote: &QuotedRate,
) -> Result<SwapResult, GatewayError> {
    let registry = journal.registry();
    let operator = journal.operator().clone();
    let exchange_address = exchange.address();
    let source_ledger = registry.asset(&request.source_asset)?;
    let dest_ledger = registry.asset(&request.dest_asset)?;

    let previous_allowance = if request.source_asset.is_native() {
        if !source_ledger
            .transfer(&operator, &exchange_address, request.source_amount)
            .await
        {
            return Err(GatewayError::TransferFailed {
                asset: request.source_asset.clone(),
                amount: request.source_amount,
                operation: "attach value to trade".to_string(),
            });
        }
        None
    } else {
        let previous = source_ledger
            .allowance(&operator, &exchange_address)
            .await;
        if !source_ledger
            .approve(&operator, &exchange_address, request.source_amount)
            .await
        {
            return Err(GatewayError::TransferFailed {
                asset: request.source_asset.clone(),
                amount: request.source_amount,
                operation: "approve exchange".to_string(),
            });
        }
        journal.record(Compensation::RestoreAllowance {
            asset: request.source_asset.clone(),
            spender: exchange_address.clone(),
            previous,
        });
        Some(previous)
    };

    let receipt = exchange
        .trade(
            &operator,
            &request.source_asset,
            &request.dest_asset,
            request.source_amount,
            quote.worst_acceptable_rate,
            &operator,
        )
        .await
        .map_err(map_trade_error)?;

    check_receipt(journal, &exchange_address, request, receipt.clone())?;

    let realized = Rate::implied(
        receipt.source_consumed,
        receipt.dest_received,
        source_ledger.decimals(),
        dest_ledger.decimals(),
    )
    .unwrap_or(Rate::ZERO);

    // The exchange enforces the floor; a receipt below it is not trusted.
    if !within_quote(
        quote,
        receipt.source_consumed,
        receipt.dest_received,
        source_ledger.decimals(),
        dest_ledger.decimals(),
    ) {
        return Err(GatewayError::SlippageExceeded {
            realized: realized.to_string(),
            minimum: quote.worst_acceptable_rate.to_string(),
        });
    }

    tracing::info!(
        exchange = %exchange_address,
        source_consumed = receipt.source_consumed,
        dest_received = receipt.dest_received,
        realized_rate = %realized,
        slippage_bps = realized_slippage_bps(quote.expected_rate, realized),
        "Swap executed"
    );

    if let Some(previous) = previous_allowance {
        if !source_ledger
            .approve(&operator, &exchange_address, previous)
            .await
        {
            return Err(GatewayError::TransferFailed {
                asset: request.source_asset.clone(),
                amount: previous,
                operation: "restore exchange allowance".to_string(),
            });
        }
    }

    Ok(SwapResult {
        dest_amount_received: receipt.dest_received,
        refund_source_amount: request.source_amount - receipt.source_consumed,
    })
}

fn map_trade_error(err: ExchangeError) -> GatewayError {
    match err {
        ExchangeError::RateBelowMinimum { realized, minimum } => GatewayError::SlippageExceeded {
            realized: realized.to_string(),
            minimum: minimum.to_string(),
        },
        other => GatewayError::ExecutionFailed {
            reason: other.to_string(),
        },
    }
}

/// Journal the trade, then reject receipts that do not match the request
fn check_receipt(
    journal: &mut Journal<'_>,
    exchange_address: &Address,
    request: &ConversionRequest,
    receipt: TradeReceipt,
) -> Result<(), GatewayError> {
    let mismatch = if receipt.source_asset != request.source_asset
        || receipt.dest_asset != request.dest_asset
    {
        Some(format!(
            "receipt is for {} -> {}",
            receipt.source_asset, receipt.dest_asset
        ))
    } else if receipt.source_consumed > request.source_amount {
        Some(format!(
            "exchange consumed {} of {} offered",
            receipt.source_consumed, request.source_amount
        ))
    } else if receipt.dest_received == 0 {
        Some("exchange delivered nothing".to_string())
    } else {
        None
    };

    // A foreign-pair receipt says nothing about what was taken from us, so the
    // exchange is asked to return everything it was offered
    let receipt = if receipt.source_asset == request.source_asset
        && receipt.dest_asset == request.dest_asset
    {
        receipt
    } else {
        TradeReceipt {
            source_asset: request.source_asset.clone(),
            dest_asset: request.dest_asset.clone(),
            source_consumed: request.source_amount,
            dest_received: 0,
        }
    };
    journal.record(Compensation::UnwindTrade {
        exchange: exchange_address.clone(),
        receipt,
    });

    match mismatch {
        Some(reason) => Err(GatewayError::ExecutionFailed { reason }),
        None => Ok(()),
    }
}
