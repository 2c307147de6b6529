//! Exchange Protocol Implementation
//!
//! Quotes and executes conversions through an [`ledgers::ExchangeAdapter`].
//!
//! - [`oracle`]: rate discovery with a slippage-bounded floor
//! - [`executor`]: the trade itself, journaled for compensation
//! - [`calculator`]: pure rate math

pub mod calculator;
pub mod executor;
pub mod oracle;
pub mod state;

// Re-exports
pub use calculator::{estimate_dest_amount, realized_slippage_bps, worst_acceptable_rate};
pub use executor::execute;
pub use oracle::{quote, quote_conversion, within_quote};
pub use state::{ConversionQuote, ConversionRequest, QuotedRate, SwapResult};
