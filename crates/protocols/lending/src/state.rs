//! Lending State Types

use gateway_core::{Address, Amount};
use ledgers::LoanTarget;
use serde::{Deserialize, Serialize};

/// How converted proceeds are split between a loan and the payer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FundingPlan {
    /// Principal the loan still needed when the plan was made
    pub needed: Amount,
    /// Goes to the loan
    pub applied: Amount,
    /// Goes back to the payer in the principal asset
    pub refund: Amount,
}

impl FundingPlan {
    /// Whether the applied amount completes the loan
    pub fn completes_loan(&self) -> bool {
        self.needed > 0 && self.applied == self.needed
    }
}

/// A loan together with its current owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanView {
    pub target: LoanTarget,
    /// Set once the principal is fully funded
    pub owner: Option<Address>,
}

impl LoanView {
    pub fn needed(&self) -> Amount {
        self.target.remaining()
    }
}
