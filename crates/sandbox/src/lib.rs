//! sandbox: Reference collaborators for tests and local runs
//!
//! Everything here keeps its state in memory behind a `tokio::sync::Mutex`.
//! Bookkeeping is deliberately minimal: enough to exercise the gateway end to
//! end, including injected failures.
//!
//! - [`InMemoryAssetLedger`]: balances, allowances, clawback credit
//! - [`MockExchange`]: deterministic rates set by the test
//! - [`ReferenceLendingLedger`]: loans that escrow principal until fully funded
//! - [`World`]: all of the above seeded from a [`gateway_core::SandboxConfig`]

pub mod exchange;
pub mod lending;
pub mod token;
pub mod world;

pub use exchange::{MockExchange, PairSettings};
pub use lending::ReferenceLendingLedger;
pub use token::{InMemoryAssetLedger, LedgerOp, LedgerSnapshot};
pub use world::{World, WorldSnapshot};
