//! ledgers: Capability interfaces for the gateway's external collaborators
//!
//! The gateway never owns balances, rates, or loans. It talks to three kinds
//! of independently-owned systems through the traits in this crate:
//!
//! - [`AssetLedger`]: balances and allowances of one asset
//! - [`ExchangeAdapter`]: rate quotes and trades
//! - [`LendingLedger`]: loan requests and their funding
//!
//! Collaborators are injected through a [`Registry`]. Side effects made on
//! them during one operation are tracked by a [`Journal`] so a failed
//! operation can be compensated step by step.

pub mod asset;
pub mod exchange;
pub mod journal;
pub mod lending;
pub mod registry;

pub use asset::{AssetLedger, MockAssetLedger};
pub use exchange::{ExchangeAdapter, ExchangeError, ExpectedRate, MockExchangeAdapter, TradeReceipt};
pub use journal::{Compensation, Journal};
pub use lending::{FundingReceipt, LendingError, LendingLedger, LoanTarget, MockLendingLedger};
pub use registry::Registry;
