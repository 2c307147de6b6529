//! Lending Protocol Implementation
//!
//! Reads loan requests from a [`ledgers::LendingLedger`], splits conversion
//! proceeds between a loan and the payer, and funds loans with every step
//! journaled.
//!
//! # Funding model
//!
//! A loan requests a principal in the ledger's principal asset. Lenders fund
//! it in one or more calls; the call that completes the principal transfers
//! ownership of the loan to its beneficiary. The ledger refuses funding
//! beyond the remaining principal, which is what serializes competing
//! lenders.

pub mod calculator;
pub mod fetch;
pub mod funder;
pub mod state;

// Re-exports
pub use calculator::*;
pub use fetch::*;
pub use funder::*;
pub use state::*;
