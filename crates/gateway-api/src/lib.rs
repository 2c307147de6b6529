//! gateway-api: HTTP API layer for the swap-and-fund gateway
//!
//! Exposes quoting, lending and loan lookup over JSON.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::{ApiError, AppState};
