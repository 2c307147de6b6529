//! Compensation journal
//!
//! The collaborators are independent systems with no shared transaction, so
//! a gateway operation cannot be made atomic by the environment. Instead each
//! side effect that completes is recorded here together with the action that
//! undoes it. When a later step fails, the journal replays those actions in
//! reverse order, leaving every ledger as it was before the operation.
//!
//! Compensations are attempted exactly once. A compensation that fails is
//! reported but does not stop the remaining ones.

use std::fmt;

use gateway_core::{Address, Amount, AssetId, GatewayError};

use crate::exchange::TradeReceipt;
use crate::lending::FundingReceipt;
use crate::registry::Registry;

/// The undo action for one completed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Payer funds pulled into gateway custody: send them back
    ReturnCustody {
        asset: AssetId,
        payer: Address,
        amount: Amount,
    },
    /// Allowance changed by the gateway: restore the previous value
    RestoreAllowance {
        asset: AssetId,
        spender: Address,
        previous: Amount,
    },
    /// Trade executed: hand the proceeds back and have the exchange return
    /// the consumed source
    UnwindTrade {
        exchange: Address,
        receipt: TradeReceipt,
    },
    /// Loan funded: have the lending ledger reverse the funding
    UnfundLoan {
        ledger: Address,
        receipt: FundingReceipt,
    },
    /// Refund paid to the payer: claw it back
    ClawbackRefund {
        asset: AssetId,
        payer: Address,
        amount: Amount,
    },
}

impl fmt::Display for Compensation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReturnCustody {
                asset,
                payer,
                amount,
            } => write!(f, "return custody of {} {} to {}", amount, asset, payer),
            Self::RestoreAllowance {
                asset,
                spender,
                previous,
            } => write!(f, "restore {} allowance of {} to {}", asset, spender, previous),
            Self::UnwindTrade { exchange, receipt } => write!(
                f,
                "unwind trade on {} ({} {} -> {} {})",
                exchange,
                receipt.source_consumed,
                receipt.source_asset,
                receipt.dest_received,
                receipt.dest_asset
            ),
            Self::UnfundLoan { ledger, receipt } => write!(
                f,
                "unfund loan {} on {} ({})",
                receipt.loan_id, ledger, receipt.amount
            ),
            Self::ClawbackRefund {
                asset,
                payer,
                amount,
            } => write!(f, "claw back refund of {} {} from {}", amount, asset, payer),
        }
    }
}

/// Per-operation log of completed side effects
pub struct Journal<'a> {
    registry: &'a Registry,
    operator: Address,
    entries: Vec<Compensation>,
}

impl<'a> Journal<'a> {
    /// Start an empty journal for an operation run by `operator`
    pub fn new(registry: &'a Registry, operator: Address) -> Self {
        Self {
            registry,
            operator,
            entries: Vec::new(),
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn operator(&self) -> &Address {
        &self.operator
    }

    pub fn record(&mut self, compensation: Compensation) {
        tracing::debug!(step = %compensation, "Journal: recorded compensation");
        self.entries.push(compensation);
    }

    pub fn entries(&self) -> &[Compensation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finish the operation successfully; nothing will be undone
    pub fn commit(self) {
        tracing::debug!(steps = self.entries.len(), "Journal: committed");
    }

    /// Undo every recorded step, newest first, and return the error the
    /// caller should see.
    ///
    /// Returns `cause` unchanged when every compensation succeeds, otherwise
    /// [`GatewayError::RollbackIncomplete`] listing the ones that failed.
    pub async fn rollback(self, cause: GatewayError) -> GatewayError {
        tracing::warn!(
            error = %cause,
            steps = self.entries.len(),
            "Rolling back operation"
        );

        let mut failed_steps = Vec::new();
        for compensation in self.entries.iter().rev() {
            if self.compensate(compensation).await {
                tracing::debug!(step = %compensation, "Compensation applied");
            } else {
                tracing::error!(step = %compensation, "Compensation failed");
                failed_steps.push(compensation.to_string());
            }
        }

        if failed_steps.is_empty() {
            cause
        } else {
            GatewayError::RollbackIncomplete {
                cause: Box::new(cause),
                failed_steps,
            }
        }
    }

    async fn compensate(&self, compensation: &Compensation) -> bool {
        let operator = &self.operator;
        match compensation {
            Compensation::ReturnCustody {
                asset,
                payer,
                amount,
            } => match self.registry.asset(asset) {
                Ok(ledger) => ledger.transfer(operator, payer, *amount).await,
                Err(_) => false,
            },
            Compensation::RestoreAllowance {
                asset,
                spender,
                previous,
            } => match self.registry.asset(asset) {
                Ok(ledger) => ledger.approve(operator, spender, *previous).await,
                Err(_) => false,
            },
            Compensation::UnwindTrade { exchange, receipt } => {
                let (Ok(dest_ledger), Ok(adapter)) = (
                    self.registry.asset(&receipt.dest_asset),
                    self.registry.exchange(exchange),
                ) else {
                    return false;
                };
                if receipt.dest_received > 0
                    && !dest_ledger
                        .transfer(operator, exchange, receipt.dest_received)
                        .await
                {
                    return false;
                }
                adapter.unwind(operator, receipt).await
            }
            Compensation::UnfundLoan { ledger, receipt } => {
                match self.registry.lending_ledger(ledger) {
                    Ok(lending) => lending.unfund_loan(operator, receipt).await,
                    Err(_) => false,
                }
            }
            Compensation::ClawbackRefund {
                asset,
                payer,
                amount,
            } => match self.registry.asset(asset) {
                Ok(ledger) => ledger.clawback(operator, payer, *amount).await,
                Err(_) => false,
            },
        }
    }
}
