//! Deterministic mock exchange
//!
//! Converts at whatever rate the test sets. The quoted rate and the rate a
//! trade actually executes at can differ, which is how slippage is
//! simulated. A lot size leaves part of the offered source unconsumed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use gateway_core::{Address, Amount, AssetId, Rate};
use ledgers::{AssetLedger, ExchangeAdapter, ExchangeError, ExpectedRate, TradeReceipt};
use tokio::sync::Mutex;

/// Conversion settings of one directed pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairSettings {
    /// Rate reported by `get_expected_rate`
    pub quoted_rate: Rate,
    /// Rate trades execute at
    pub execution_rate: Rate,
    /// Source is consumed in multiples of this
    pub lot_size: Amount,
}

impl PairSettings {
    pub fn at(rate: Rate) -> Self {
        Self {
            quoted_rate: rate,
            execution_rate: rate,
            lot_size: 1,
        }
    }
}

#[derive(Default)]
struct ExchangeState {
    pairs: HashMap<(AssetId, AssetId), PairSettings>,
    rejection: Option<String>,
}

pub struct MockExchange {
    address: Address,
    ledgers: HashMap<AssetId, Arc<dyn AssetLedger>>,
    state: Mutex<ExchangeState>,
}

impl MockExchange {
    pub fn new(address: Address, ledgers: impl IntoIterator<Item = Arc<dyn AssetLedger>>) -> Self {
        Self {
            address,
            ledgers: ledgers
                .into_iter()
                .map(|ledger| (ledger.asset(), ledger))
                .collect(),
            state: Mutex::new(ExchangeState::default()),
        }
    }

    /// Quote and execute `source -> dest` at `rate`
    pub async fn set_rate(&self, source: &AssetId, dest: &AssetId, rate: Rate) {
        let mut state = self.state.lock().await;
        let pair = state
            .pairs
            .entry((source.clone(), dest.clone()))
            .or_insert_with(|| PairSettings::at(rate));
        pair.quoted_rate = rate;
        pair.execution_rate = rate;
    }

    /// Execute at `rate` while still quoting the previous rate
    pub async fn set_execution_rate(&self, source: &AssetId, dest: &AssetId, rate: Rate) {
        let mut state = self.state.lock().await;
        state
            .pairs
            .entry((source.clone(), dest.clone()))
            .or_insert_with(|| PairSettings::at(Rate::ZERO))
            .execution_rate = rate;
    }

    pub async fn set_lot_size(&self, source: &AssetId, dest: &AssetId, lot_size: Amount) {
        let mut state = self.state.lock().await;
        state
            .pairs
            .entry((source.clone(), dest.clone()))
            .or_insert_with(|| PairSettings::at(Rate::ZERO))
            .lot_size = lot_size.max(1);
    }

    pub async fn pair(&self, source: &AssetId, dest: &AssetId) -> Option<PairSettings> {
        let state = self.state.lock().await;
        state.pairs.get(&(source.clone(), dest.clone())).copied()
    }

    /// Reject every trade with `reason` until called with `None`
    pub async fn reject_trades(&self, reason: Option<String>) {
        self.state.lock().await.rejection = reason;
    }

    fn ledger(&self, asset: &AssetId) -> Result<&Arc<dyn AssetLedger>, ExchangeError> {
        self.ledgers
            .get(asset)
            .ok_or_else(|| ExchangeError::Rejected(format!("unsupported asset {}", asset)))
    }

    #[allow(clippy::too_many_arguments)]
    async fn try_trade(
        &self,
        state: &ExchangeState,
        trader: &Address,
        source_asset: &AssetId,
        dest_asset: &AssetId,
        source_amount: Amount,
        min_rate: Rate,
        recipient: &Address,
    ) -> Result<TradeReceipt, ExchangeError> {
        if let Some(reason) = &state.rejection {
            return Err(ExchangeError::Rejected(reason.clone()));
        }

        let no_liquidity = || ExchangeError::NoLiquidity {
            source_asset: source_asset.clone(),
            dest_asset: dest_asset.clone(),
        };
        let pair = state
            .pairs
            .get(&(source_asset.clone(), dest_asset.clone()))
            .copied()
            .ok_or_else(no_liquidity)?;
        let source = self.ledger(source_asset)?;
        let dest = self.ledger(dest_asset)?;

        let consumed = source_amount - source_amount % pair.lot_size.max(1);
        let dest_out = pair
            .execution_rate
            .convert(consumed, source.decimals(), dest.decimals())
            .ok_or_else(|| ExchangeError::Rejected("output overflows".to_string()))?;
        if consumed == 0 || dest_out == 0 {
            return Err(ExchangeError::Rejected(
                "below minimum trade size".to_string(),
            ));
        }

        let floor = min_rate
            .convert(consumed, source.decimals(), dest.decimals())
            .unwrap_or(Amount::MAX);
        if dest_out < floor {
            return Err(ExchangeError::RateBelowMinimum {
                realized: Rate::implied(consumed, dest_out, source.decimals(), dest.decimals())
                    .unwrap_or(Rate::ZERO),
                minimum: min_rate,
            });
        }
        if dest.balance_of(&self.address).await < dest_out {
            return Err(no_liquidity());
        }

        let native = source_asset.is_native();
        if !native
            && !source
                .transfer_from(&self.address, trader, &self.address, consumed)
                .await
        {
            return Err(ExchangeError::Rejected("source payment failed".to_string()));
        }

        if !dest.transfer(&self.address, recipient, dest_out).await {
            if !native && !source.transfer(&self.address, trader, consumed).await {
                tracing::error!(trader = %trader, consumed, "Mock exchange: could not return source");
            }
            return Err(ExchangeError::Rejected("destination payment failed".to_string()));
        }

        // Attached native value the trade did not use goes back to the trader
        let unused = source_amount - consumed;
        if native && unused > 0 && !source.transfer(&self.address, trader, unused).await {
            tracing::error!(trader = %trader, unused, "Mock exchange: could not return unused value");
        }

        Ok(TradeReceipt {
            source_asset: source_asset.clone(),
            dest_asset: dest_asset.clone(),
            source_consumed: consumed,
            dest_received: dest_out,
        })
    }
}

#[async_trait]
impl ExchangeAdapter for MockExchange {
    fn address(&self) -> Address {
        self.address.clone()
    }

    async fn get_expected_rate(
        &self,
        source_asset: &AssetId,
        dest_asset: &AssetId,
        _source_amount: Amount,
    ) -> Result<ExpectedRate, ExchangeError> {
        let state = self.state.lock().await;
        match state.pairs.get(&(source_asset.clone(), dest_asset.clone())) {
            Some(pair) if !pair.quoted_rate.is_zero() => Ok(ExpectedRate {
                expected: pair.quoted_rate,
                // 3% below the quoted rate
                worst: Rate::new(pair.quoted_rate.raw() / 100 * 97),
            }),
            _ => Err(ExchangeError::NoLiquidity {
                source_asset: source_asset.clone(),
                dest_asset: dest_asset.clone(),
            }),
        }
    }

    async fn trade(
        &self,
        trader: &Address,
        source_asset: &AssetId,
        dest_asset: &AssetId,
        source_amount: Amount,
        min_rate: Rate,
        recipient: &Address,
    ) -> Result<TradeReceipt, ExchangeError> {
        let state = self.state.lock().await;
        let outcome = self
            .try_trade(
                &state,
                trader,
                source_asset,
                dest_asset,
                source_amount,
                min_rate,
                recipient,
            )
            .await;

        match &outcome {
            Ok(receipt) => tracing::debug!(
                consumed = receipt.source_consumed,
                received = receipt.dest_received,
                "Mock exchange: trade settled"
            ),
            Err(e) => {
                tracing::debug!(error = %e, "Mock exchange: trade failed");
                // Attached value is returned on every failure
                if source_asset.is_native() {
                    if let Ok(source) = self.ledger(source_asset) {
                        if !source.transfer(&self.address, trader, source_amount).await {
                            tracing::error!(trader = %trader, "Mock exchange: could not return attached value");
                        }
                    }
                }
            }
        }

        outcome
    }

    async fn unwind(&self, trader: &Address, receipt: &TradeReceipt) -> bool {
        let _state = self.state.lock().await;
        let Ok(source) = self.ledger(&receipt.source_asset) else {
            return false;
        };
        source
            .transfer(&self.address, trader, receipt.source_consumed)
            .await
    }
}
