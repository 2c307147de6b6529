//! Application state shared across API handlers

use std::sync::Arc;

use axum::{http::StatusCode, Json};
use gateway::Gateway;
use gateway_core::{AppConfig, GatewayError};
use thiserror::Error;

use crate::dto;

/// Errors that can occur in the API layer
#[derive(Debug, Error)]
pub enum ApiError {
    /// A request field could not be parsed
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ApiError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidField { .. } => "bad_request",
            Self::Gateway(e) => e.error_code(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidField { .. } => StatusCode::BAD_REQUEST,
            Self::Gateway(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Status and JSON body returned to the client
    pub fn into_rejection(self) -> (StatusCode, Json<dto::ApiError>) {
        (
            self.status_code(),
            Json(dto::ApiError::new(self.error_code(), self.to_string())),
        )
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    gateway: Gateway,
}

impl AppState {
    /// Serve `gateway`, built from `config`
    pub fn new(config: AppConfig, gateway: Gateway) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, gateway }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn gateway(&self) -> &Gateway {
        &self.inner.gateway
    }
}
