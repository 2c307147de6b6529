//! Swap-and-fund endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::dto::{ApiError, LendRequestBody, QuoteRequest, QuoteResponse, SettlementResponse};
use crate::AppState;

/// POST /quote - Preview how a payment would be split
pub async fn quote(
    State(state): State<AppState>,
    Json(body): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, (StatusCode, Json<ApiError>)> {
    let request = body.to_lend_request().map_err(|e| e.into_rejection())?;

    let preview = state
        .gateway()
        .quote(&request)
        .await
        .map_err(|e| crate::ApiError::from(e).into_rejection())?;

    Ok(Json(preview.into()))
}

/// POST /lend - Convert the payer's payment and fund the loan
pub async fn lend(
    State(state): State<AppState>,
    Json(body): Json<LendRequestBody>,
) -> Result<Json<SettlementResponse>, (StatusCode, Json<ApiError>)> {
    let (payer, request) = body.parse().map_err(|e| e.into_rejection())?;

    let outcome = state
        .gateway()
        .lend(&payer, &request)
        .await
        .map_err(|e| crate::ApiError::from(e).into_rejection())?;

    Ok(Json(outcome.into()))
}
