//! Loan lookup endpoint

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use gateway_core::LoanId;

use crate::dto::{parse_address, ApiError, LoanResponse};
use crate::AppState;

/// GET /loans/{ledger}/{loan_id} - Funding state and owner of one loan
pub async fn get_loan(
    State(state): State<AppState>,
    Path((ledger, loan_id)): Path<(String, LoanId)>,
) -> Result<Json<LoanResponse>, (StatusCode, Json<ApiError>)> {
    let ledger = parse_address("ledger", &ledger).map_err(|e| e.into_rejection())?;

    let view = state
        .gateway()
        .loan(&ledger, loan_id)
        .await
        .map_err(|e| crate::ApiError::from(e).into_rejection())?;

    Ok(Json(view.into()))
}
