//! Rate discovery
//!
//! Asks the exchange for its current rate and derives the floor the trade
//! will be submitted with.

use gateway_core::{Amount, GatewayError, Rate};
use ledgers::ExchangeAdapter;

use crate::calculator::{estimate_dest_amount, worst_acceptable_rate};
use crate::state::{ConversionQuote, ConversionRequest, QuotedRate};

/// Quote a conversion.
///
/// The worst acceptable rate is the expected rate reduced by the request's
/// slippage tolerance. The exchange's own worst-case figure is only logged.
/// A zero expected rate means the exchange cannot serve the pair at this size.
pub async fn quote(
    exchange: &dyn ExchangeAdapter,
    request: &ConversionRequest,
) -> Result<QuotedRate, GatewayError> {
    let reported = exchange
        .get_expected_rate(
            &request.source_asset,
            &request.dest_asset,
            request.source_amount,
        )
        .await
        .map_err(|e| GatewayError::RateUnavailable {
            source_asset: request.source_asset.clone(),
            dest_asset: request.dest_asset.clone(),
            reason: e.to_string(),
        })?;

    if reported.expected.is_zero() {
        return Err(GatewayError::RateUnavailable {
            source_asset: request.source_asset.clone(),
            dest_asset: request.dest_asset.clone(),
            reason: "exchange quoted a zero rate".to_string(),
        });
    }

    let worst = worst_acceptable_rate(reported.expected, request.max_slippage_bps);

    tracing::debug!(
        exchange = %exchange.address(),
        source_asset = %request.source_asset,
        dest_asset = %request.dest_asset,
        source_amount = request.source_amount,
        expected_rate = %reported.expected,
        exchange_worst_rate = %reported.worst,
        worst_acceptable_rate = %worst,
        "Quoted conversion"
    );

    Ok(QuotedRate {
        expected_rate: reported.expected,
        worst_acceptable_rate: worst,
    })
}

/// Quote a conversion and the destination amounts it implies
pub async fn quote_conversion(
    exchange: &dyn ExchangeAdapter,
    request: &ConversionRequest,
    source_decimals: u8,
    dest_decimals: u8,
) -> Result<ConversionQuote, GatewayError> {
    let rate = quote(exchange, request).await?;

    let expected_dest_amount = estimate_dest_amount(
        rate.expected_rate,
        request.source_amount,
        source_decimals,
        dest_decimals,
    );
    let min_dest_amount = estimate_dest_amount(
        rate.worst_acceptable_rate,
        request.source_amount,
        source_decimals,
        dest_decimals,
    );

    Ok(ConversionQuote {
        rate,
        expected_dest_amount,
        min_dest_amount,
    })
}

/// Whether an executed conversion honours a quote.
///
/// The delivered amount is compared with the worst rate applied to the
/// consumed amount, rounded down the way exchanges round their output.
pub fn within_quote(
    quote: &QuotedRate,
    source_consumed: Amount,
    dest_received: Amount,
    source_decimals: u8,
    dest_decimals: u8,
) -> bool {
    quote
        .worst_acceptable_rate
        .convert(source_consumed, source_decimals, dest_decimals)
        .is_some_and(|floor| dest_received >= floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::{Address, AssetId};
    use ledgers::{ExchangeError, ExpectedRate, MockExchangeAdapter};

    const E18: u128 = 1_000_000_000_000_000_000;

    fn token() -> AssetId {
        AssetId::Token(Address::from_low_u64(0x7c4))
    }

    fn exchange_quoting(rate: Rate) -> MockExchangeAdapter {
        let mut exchange = MockExchangeAdapter::new();
        exchange
            .expect_address()
            .return_const(Address::from_low_u64(0xe1));
        exchange
            .expect_get_expected_rate()
            .returning(move |_, _, _| {
                Ok(ExpectedRate {
                    expected: rate,
                    worst: rate,
                })
            });
        exchange
    }

    #[tokio::test]
    async fn test_quote_applies_slippage() {
        let exchange = exchange_quoting(Rate::from_units(5000));
        let request = ConversionRequest::new(AssetId::Native, token(), E18, 300);

        let quoted = quote(&exchange, &request).await.unwrap();
        assert_eq!(quoted.expected_rate, Rate::from_units(5000));
        assert_eq!(quoted.worst_acceptable_rate, Rate::from_units(4850));
        assert!(within_quote(&quoted, E18, 4900 * E18, 18, 18));
        assert!(within_quote(&quoted, E18, 4850 * E18, 18, 18));
        assert!(!within_quote(&quoted, E18, 4800 * E18, 18, 18));
    }

    #[test]
    fn test_within_quote_uses_rounded_down_floor() {
        let quoted = QuotedRate {
            expected_rate: Rate::from_ratio(1, 2).unwrap(),
            worst_acceptable_rate: Rate::from_ratio(1, 2).unwrap(),
        };
        // 3 at 0.5 is 1.5, so 1 unit honours the floor even though 1/3 < 0.5
        assert!(within_quote(&quoted, 3, 1, 0, 0));
        assert!(!within_quote(&quoted, 3, 0, 0, 0));
        assert!(within_quote(&quoted, 4, 2, 0, 0));
        assert!(!within_quote(&quoted, 4, 1, 0, 0));
    }

    #[tokio::test]
    async fn test_quote_zero_rate_is_unavailable() {
        let exchange = exchange_quoting(Rate::ZERO);
        let request = ConversionRequest::new(AssetId::Native, token(), E18, 300);

        let err = quote(&exchange, &request).await.unwrap_err();
        assert_eq!(err.error_code(), "rate_unavailable");
    }

    #[tokio::test]
    async fn test_quote_exchange_error_is_unavailable() {
        let mut exchange = MockExchangeAdapter::new();
        exchange.expect_get_expected_rate().returning(|src, dest, _| {
            Err(ExchangeError::NoLiquidity {
                source_asset: src.clone(),
                dest_asset: dest.clone(),
            })
        });
        let request = ConversionRequest::new(AssetId::Native, token(), E18, 300);

        let err = quote(&exchange, &request).await.unwrap_err();
        match err {
            GatewayError::RateUnavailable { reason, .. } => {
                assert!(reason.contains("No liquidity"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_quote_conversion_amounts() {
        let exchange = exchange_quoting(Rate::from_units(5000));
        // 0.4002 native at 5000 = 2001 tokens
        let request = ConversionRequest::new(AssetId::Native, token(), 400_200_000_000_000_000, 300);

        let conversion = quote_conversion(&exchange, &request, 18, 18).await.unwrap();
        assert_eq!(conversion.expected_dest_amount, 2001 * E18);
        assert_eq!(conversion.min_dest_amount, 194_097 * E18 / 100);
    }
}
