//! gateway: Swap-and-fund gateway
//!
//! Accepts a payment in one asset, converts it through an exchange into a
//! loan's principal asset, funds the loan with the proceeds, and refunds
//! whatever the loan did not absorb. The exchange and the lending ledger are
//! independent systems; [`ledgers::Journal`] ties them into one logical
//! operation.

pub mod coordinator;
pub mod settlement;

use exchange::{ConversionQuote, ConversionRequest};
use gateway_core::{Address, Amount, AssetId, GatewayConfig, GatewayError, LoanId};
use ledgers::{AssetLedger, Registry};
use lending::{FundingPlan, LoanView};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

pub use coordinator::FundingCoordinator;
pub use settlement::settle;

/// How one `lend` disbursed the payer's money
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub amount_applied_to_loan: Amount,
    /// Surplus returned in the loan's principal asset
    pub amount_refunded_to_payer: Amount,
    /// Source the exchange did not consume
    pub amount_refunded_in_source_asset: Amount,
}

/// Arguments of a `lend` call; the payer is passed separately
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendRequest {
    pub exchange: Address,
    pub ledger: Address,
    pub loan_id: LoanId,
    pub source_asset: AssetId,
    pub source_amount: Amount,
    /// Falls back to [`GatewayConfig::default_slippage_bps`]
    #[serde(default)]
    pub max_slippage_bps: Option<u16>,
}

/// Read-only preview of a `lend`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendQuote {
    pub loan_id: LoanId,
    pub dest_asset: AssetId,
    pub max_slippage_bps: u16,
    pub conversion: ConversionQuote,
    /// Split if the trade executes at the expected rate
    pub projected: FundingPlan,
    /// Split if the trade executes at the worst acceptable rate
    pub worst_case: FundingPlan,
}

/// Entry point. Holds only configuration and collaborator handles, so one
/// instance serves any number of concurrent operations.
#[derive(Clone)]
pub struct Gateway {
    config: GatewayConfig,
    registry: Registry,
}

impl Gateway {
    pub fn new(config: GatewayConfig, registry: Registry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn address(&self) -> &Address {
        &self.config.address
    }

    /// Convert `request.source_amount` from `payer` and fund the loan.
    ///
    /// The payer must have approved the gateway for the source amount.
    pub async fn lend(
        &self,
        payer: &Address,
        request: &LendRequest,
    ) -> Result<SettlementOutcome, GatewayError> {
        let operation_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "lend",
            %operation_id,
            payer = %payer,
            ledger = %request.ledger,
            loan_id = request.loan_id,
        );

        async move {
            tracing::info!(
                exchange = %request.exchange,
                source_asset = %request.source_asset,
                source_amount = request.source_amount,
                "Lend requested"
            );

            let result = self.lend_inner(payer, request).await;
            match &result {
                Ok(outcome) => tracing::info!(
                    applied = outcome.amount_applied_to_loan,
                    refunded = outcome.amount_refunded_to_payer,
                    refunded_source = outcome.amount_refunded_in_source_asset,
                    "Lend settled"
                ),
                Err(e) => tracing::warn!(code = e.error_code(), error = %e, "Lend failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn lend_inner(
        &self,
        payer: &Address,
        request: &LendRequest,
    ) -> Result<SettlementOutcome, GatewayError> {
        let adapter = self.registry.exchange(&request.exchange)?;
        let ledger = self.registry.lending_ledger(&request.ledger)?;
        let conversion = self.conversion_request(request, ledger.principal_asset())?;
        self.registry.asset(&conversion.source_asset)?;
        self.registry.asset(&conversion.dest_asset)?;

        let target = lending::fetch_open_loan(ledger.as_ref(), request.loan_id).await?;

        FundingCoordinator::new(&self.registry, self.config.address.clone(), adapter, ledger)
            .fund(
                &target,
                &conversion.source_asset,
                conversion.source_amount,
                conversion.max_slippage_bps,
                payer,
            )
            .await
    }

    /// Preview a `lend` without touching any ledger
    pub async fn quote(&self, request: &LendRequest) -> Result<LendQuote, GatewayError> {
        let adapter = self.registry.exchange(&request.exchange)?;
        let ledger = self.registry.lending_ledger(&request.ledger)?;
        let conversion = self.conversion_request(request, ledger.principal_asset())?;
        let source = self.registry.asset(&conversion.source_asset)?;
        let dest = self.registry.asset(&conversion.dest_asset)?;

        let target = lending::fetch_open_loan(ledger.as_ref(), request.loan_id).await?;
        let needed = lending::needed(&target);

        let quote = exchange::quote_conversion(
            adapter.as_ref(),
            &conversion,
            source.decimals(),
            dest.decimals(),
        )
        .await?;

        Ok(LendQuote {
            loan_id: request.loan_id,
            dest_asset: conversion.dest_asset,
            max_slippage_bps: conversion.max_slippage_bps,
            projected: lending::plan_allocation(quote.expected_dest_amount, needed),
            worst_case: lending::plan_allocation(quote.min_dest_amount, needed),
            conversion: quote,
        })
    }

    /// Current state of a loan
    pub async fn loan(&self, ledger: &Address, loan_id: LoanId) -> Result<LoanView, GatewayError> {
        let lending_ledger = self.registry.lending_ledger(ledger)?;
        lending::fetch_loan_view(lending_ledger.as_ref(), loan_id).await
    }

    fn conversion_request(
        &self,
        request: &LendRequest,
        dest_asset: AssetId,
    ) -> Result<ConversionRequest, GatewayError> {
        let conversion = ConversionRequest::new(
            request.source_asset.clone(),
            dest_asset,
            request.source_amount,
            request
                .max_slippage_bps
                .unwrap_or(self.config.default_slippage_bps),
        );
        conversion.validate(self.config.max_slippage_bps)?;
        Ok(conversion)
    }
}
