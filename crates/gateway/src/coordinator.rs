//! Funding coordinator
//!
//! Drives one swap-and-fund operation end to end. Every side effect is
//! journaled; any failure replays the journal backwards so that, from the
//! payer's point of view, either the whole operation happened or none of it.

use std::sync::Arc;

use exchange::{ConversionRequest, QuotedRate, SwapResult};
use gateway_core::{Address, Amount, AssetId, GatewayError};
use ledgers::{Compensation, ExchangeAdapter, Journal, LendingLedger, LoanTarget, Registry};
use lending::{plan_allocation, FundingPlan};

use crate::settlement::settle;
use crate::SettlementOutcome;

/// Collaborators of one operation
pub struct FundingCoordinator<'a> {
    registry: &'a Registry,
    operator: Address,
    exchange: Arc<dyn ExchangeAdapter>,
    lending: Arc<dyn LendingLedger>,
}

impl<'a> FundingCoordinator<'a> {
    pub fn new(
        registry: &'a Registry,
        operator: Address,
        exchange: Arc<dyn ExchangeAdapter>,
        lending: Arc<dyn LendingLedger>,
    ) -> Self {
        Self {
            registry,
            operator,
            exchange,
            lending,
        }
    }

    /// Convert `source_amount` of `source_asset` from `payer` and fund
    /// `target` with the proceeds.
    ///
    /// Returns how the proceeds were split. On error every completed step
    /// has been compensated, or the error is
    /// [`GatewayError::RollbackIncomplete`].
    pub async fn fund(
        &self,
        target: &LoanTarget,
        source_asset: &AssetId,
        source_amount: Amount,
        max_slippage_bps: u16,
        payer: &Address,
    ) -> Result<SettlementOutcome, GatewayError> {
        let needed = target.remaining();
        if needed == 0 {
            return Err(GatewayError::LoanAlreadyFunded {
                loan_id: target.loan_id,
            });
        }

        let request = ConversionRequest::new(
            source_asset.clone(),
            self.lending.principal_asset(),
            source_amount,
            max_slippage_bps,
        );
        let quote = exchange::quote(self.exchange.as_ref(), &request).await?;

        let mut journal = Journal::new(self.registry, self.operator.clone());
        match self
            .run(&mut journal, target, &request, &quote, needed, payer)
            .await
        {
            Ok(outcome) => {
                journal.commit();
                Ok(outcome)
            }
            Err(e) => Err(journal.rollback(e).await),
        }
    }

    async fn run(
        &self,
        journal: &mut Journal<'_>,
        target: &LoanTarget,
        request: &ConversionRequest,
        quote: &QuotedRate,
        needed: Amount,
        payer: &Address,
    ) -> Result<SettlementOutcome, GatewayError> {
        self.take_custody(journal, request, payer).await?;

        let swap: SwapResult =
            exchange::execute(journal, self.exchange.as_ref(), request, quote).await?;

        let plan: FundingPlan = plan_allocation(swap.dest_amount_received, needed);
        tracing::debug!(
            needed,
            received = swap.dest_amount_received,
            applied = plan.applied,
            refund = plan.refund,
            "Funding plan"
        );

        lending::fund_loan(
            journal,
            self.lending.as_ref(),
            target.loan_id,
            plan.applied,
            payer,
        )
        .await?;

        let outcome = SettlementOutcome {
            amount_applied_to_loan: plan.applied,
            amount_refunded_to_payer: plan.refund,
            amount_refunded_in_source_asset: swap.refund_source_amount,
        };
        settle(
            journal,
            &outcome,
            payer,
            &request.source_asset,
            &request.dest_asset,
        )
        .await?;

        Ok(outcome)
    }

    /// Pull the payment into the operator's custody
    async fn take_custody(
        &self,
        journal: &mut Journal<'_>,
        request: &ConversionRequest,
        payer: &Address,
    ) -> Result<(), GatewayError> {
        let ledger = self.registry.asset(&request.source_asset)?;
        if !ledger
            .transfer_from(&self.operator, payer, &self.operator, request.source_amount)
            .await
        {
            return Err(GatewayError::TransferFailed {
                asset: request.source_asset.clone(),
                amount: request.source_amount,
                operation: "take payment".to_string(),
            });
        }

        journal.record(Compensation::ReturnCustody {
            asset: request.source_asset.clone(),
            payer: payer.clone(),
            amount: request.source_amount,
        });
        Ok(())
    }
}
