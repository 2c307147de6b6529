//! Error types for the gateway

use thiserror::Error;

use crate::types::{Amount, AssetId, LoanId};

/// Top-level errors for the gateway binaries
#[derive(Debug, Error)]
pub enum Error {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failures of a single gateway operation.
///
/// Every variant is a whole-operation failure: by the time a caller sees it,
/// all balance changes made during the invocation have been undone (or
/// [`GatewayError::RollbackIncomplete`] says which could not be).
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("No rate available for {source_asset} -> {dest_asset}: {reason}")]
    RateUnavailable {
        source_asset: AssetId,
        dest_asset: AssetId,
        reason: String,
    },

    #[error("Realized rate {realized} below minimum acceptable {minimum}")]
    SlippageExceeded { realized: String, minimum: String },

    #[error("Swap execution failed: {reason}")]
    ExecutionFailed { reason: String },

    #[error("Loan {loan_id} has no remaining principal to fund")]
    LoanAlreadyFunded { loan_id: LoanId },

    #[error("Transfer of {amount} {asset} failed during {operation}")]
    TransferFailed {
        asset: AssetId,
        amount: Amount,
        operation: String,
    },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Loan {loan_id} not found in ledger {ledger}")]
    LoanNotFound { ledger: String, loan_id: LoanId },

    #[error("No {kind} registered at {address}")]
    UnknownCollaborator { kind: &'static str, address: String },

    #[error("{cause}; rollback incomplete, failed compensations: {}", .failed_steps.join(", "))]
    RollbackIncomplete {
        cause: Box<GatewayError>,
        failed_steps: Vec<String>,
    },
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RateUnavailable { .. } => "rate_unavailable",
            Self::SlippageExceeded { .. } => "slippage_exceeded",
            Self::ExecutionFailed { .. } => "execution_failed",
            Self::LoanAlreadyFunded { .. } => "loan_already_funded",
            Self::TransferFailed { .. } => "transfer_failed",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::LoanNotFound { .. } => "loan_not_found",
            Self::UnknownCollaborator { .. } => "unknown_collaborator",
            Self::RollbackIncomplete { .. } => "rollback_incomplete",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest { .. } => 400,
            Self::LoanNotFound { .. } | Self::UnknownCollaborator { .. } => 404,
            Self::LoanAlreadyFunded { .. } => 409,
            Self::SlippageExceeded { .. } | Self::TransferFailed { .. } => 422,
            Self::ExecutionFailed { .. } => 502,
            Self::RateUnavailable { .. } => 503,
            Self::RollbackIncomplete { .. } => 500,
        }
    }

    /// The failure that started the rollback, looking through
    /// [`GatewayError::RollbackIncomplete`]
    pub fn root_cause(&self) -> &GatewayError {
        match self {
            Self::RollbackIncomplete { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}
