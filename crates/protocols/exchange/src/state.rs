//! Exchange State Types
//!
//! Data structures for conversion requests, quotes, and results.

use gateway_core::{constants::BPS_DENOMINATOR, Amount, AssetId, GatewayError, Rate};
use serde::{Deserialize, Serialize};

/// One conversion the gateway wants to perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub source_asset: AssetId,
    pub dest_asset: AssetId,
    pub source_amount: Amount,
    /// Tolerated gap between quoted and realized rate, in basis points
    pub max_slippage_bps: u16,
}

impl ConversionRequest {
    pub fn new(
        source_asset: AssetId,
        dest_asset: AssetId,
        source_amount: Amount,
        max_slippage_bps: u16,
    ) -> Self {
        Self {
            source_asset,
            dest_asset,
            source_amount,
            max_slippage_bps,
        }
    }

    /// Reject requests no exchange should see
    pub fn validate(&self, max_allowed_bps: u16) -> Result<(), GatewayError> {
        if self.source_amount == 0 {
            return Err(GatewayError::InvalidRequest {
                message: "Source amount must be greater than zero".to_string(),
            });
        }

        if self.source_asset == self.dest_asset {
            return Err(GatewayError::InvalidRequest {
                message: format!(
                    "Source and destination asset are both {}",
                    self.source_asset
                ),
            });
        }

        let limit = max_allowed_bps.min(BPS_DENOMINATOR as u16);
        if self.max_slippage_bps > limit {
            return Err(GatewayError::InvalidRequest {
                message: format!(
                    "Max slippage {} bps exceeds the allowed {} bps",
                    self.max_slippage_bps, limit
                ),
            });
        }

        Ok(())
    }
}

/// Rates a conversion is quoted at.
///
/// Invariant: `worst_acceptable_rate <= expected_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedRate {
    pub expected_rate: Rate,
    /// Floor passed to the exchange; the trade reverts below it
    pub worst_acceptable_rate: Rate,
}

/// Quote with the destination quantities it implies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionQuote {
    pub rate: QuotedRate,
    /// Destination amount at the expected rate
    pub expected_dest_amount: Amount,
    /// Destination amount at the worst acceptable rate
    pub min_dest_amount: Amount,
}

/// Outcome of an executed conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapResult {
    /// Destination actually delivered, as reported by the exchange
    pub dest_amount_received: Amount,
    /// Source the exchange did not consume
    pub refund_source_amount: Amount,
}
