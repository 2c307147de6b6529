//! Exchange adapter interface

use gateway_core::{Address, Amount, AssetId, Rate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rates reported by the exchange for a prospective trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedRate {
    /// Rate the trade would execute at right now
    pub expected: Rate,
    /// The exchange's own worst-case rate for the same size
    pub worst: Rate,
}

/// What the exchange reports for a completed trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub source_asset: AssetId,
    pub dest_asset: AssetId,
    /// Source taken by the exchange; anything offered beyond this stays with (or is
    /// returned to) the trader
    pub source_consumed: Amount,
    /// Destination delivered to the recipient
    pub dest_received: Amount,
}

/// Exchange-side failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    #[error("No liquidity for {source_asset} -> {dest_asset}")]
    NoLiquidity {
        source_asset: AssetId,
        dest_asset: AssetId,
    },

    #[error("Realized rate {realized} below minimum {minimum}")]
    RateBelowMinimum { realized: Rate, minimum: Rate },

    #[error("Trade rejected: {0}")]
    Rejected(String),
}

/// A third-party exchange the gateway converts through.
///
/// Trading a native source asset expects the value to have been transferred to
/// [`ExchangeAdapter::address`] beforehand. A failed trade leaves no effect:
/// attached native value is returned to the trader before the error is
/// reported. For token sources the exchange pulls what it consumes through
/// the trader's allowance.
#[mockall::automock]
#[async_trait::async_trait]
pub trait ExchangeAdapter: Send + Sync {
    fn address(&self) -> Address;

    async fn get_expected_rate(
        &self,
        source_asset: &AssetId,
        dest_asset: &AssetId,
        source_amount: Amount,
    ) -> Result<ExpectedRate, ExchangeError>;

    /// Converts up to `source_amount` and delivers the proceeds to
    /// `recipient`. Fails without effect if the realized rate is below
    /// `min_rate`.
    async fn trade(
        &self,
        trader: &Address,
        source_asset: &AssetId,
        dest_asset: &AssetId,
        source_amount: Amount,
        min_rate: Rate,
        recipient: &Address,
    ) -> Result<TradeReceipt, ExchangeError>;

    /// Reverses a completed trade once `receipt.dest_received` has been
    /// transferred back to the exchange: `receipt.source_consumed` is returned
    /// to `trader`.
    async fn unwind(&self, trader: &Address, receipt: &TradeReceipt) -> bool;
}
