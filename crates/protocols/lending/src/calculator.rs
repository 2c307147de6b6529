//! Lending Calculator
//!
//! Pure allocation math. No I/O.

use gateway_core::Amount;
use ledgers::LoanTarget;

use crate::state::FundingPlan;

/// Principal a loan still needs
pub fn needed(target: &LoanTarget) -> Amount {
    target.remaining()
}

/// Split `dest_received` between the loan and a refund.
///
/// applied = min(dest_received, needed), refund = dest_received - applied.
/// Nothing is lost: `applied + refund == dest_received`.
pub fn plan_allocation(dest_received: Amount, needed: Amount) -> FundingPlan {
    let applied = dest_received.min(needed);
    FundingPlan {
        needed,
        applied,
        refund: dest_received - applied,
    }
}
