//! Data Transfer Objects for API requests and responses
//!
//! Amounts travel as decimal strings of base units so that 128-bit values
//! survive JSON clients that parse numbers as doubles.

use gateway::{LendQuote, LendRequest, SettlementOutcome};
use gateway_core::{Address, Amount, AssetId, LoanId};
use lending::{FundingPlan, LoanView};
use serde::{Deserialize, Serialize};

use crate::state;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Body of `POST /quote`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub exchange: String,
    pub ledger: String,
    pub loan_id: LoanId,
    /// `native` or a token address
    pub source_asset: String,
    pub source_amount: String,
    #[serde(default)]
    pub max_slippage_bps: Option<u16>,
}

impl QuoteRequest {
    pub fn to_lend_request(&self) -> Result<LendRequest, state::ApiError> {
        Ok(LendRequest {
            exchange: parse_address("exchange", &self.exchange)?,
            ledger: parse_address("ledger", &self.ledger)?,
            loan_id: self.loan_id,
            source_asset: AssetId::parse(&self.source_asset)
                .map_err(|e| state::ApiError::invalid("source_asset", e.to_string()))?,
            source_amount: parse_amount("source_amount", &self.source_amount)?,
            max_slippage_bps: self.max_slippage_bps,
        })
    }
}

/// Body of `POST /lend`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendRequestBody {
    /// Account that approved the gateway for the source amount
    pub payer: String,
    #[serde(flatten)]
    pub request: QuoteRequest,
}

impl LendRequestBody {
    pub fn parse(&self) -> Result<(Address, LendRequest), state::ApiError> {
        let payer = parse_address("payer", &self.payer)?;
        Ok((payer, self.request.to_lend_request()?))
    }
}

/// Response of `POST /lend`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementResponse {
    pub amount_applied_to_loan: String,
    pub amount_refunded_to_payer: String,
    pub amount_refunded_in_source_asset: String,
}

impl From<SettlementOutcome> for SettlementResponse {
    fn from(outcome: SettlementOutcome) -> Self {
        Self {
            amount_applied_to_loan: outcome.amount_applied_to_loan.to_string(),
            amount_refunded_to_payer: outcome.amount_refunded_to_payer.to_string(),
            amount_refunded_in_source_asset: outcome.amount_refunded_in_source_asset.to_string(),
        }
    }
}

/// Split of the converted amount between loan and payer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationInfo {
    pub applied: String,
    pub refund: String,
    pub completes_loan: bool,
}

impl From<FundingPlan> for AllocationInfo {
    fn from(plan: FundingPlan) -> Self {
        Self {
            applied: plan.applied.to_string(),
            refund: plan.refund.to_string(),
            completes_loan: plan.completes_loan(),
        }
    }
}

/// Response of `POST /quote`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub loan_id: LoanId,
    pub dest_asset: String,
    pub max_slippage_bps: u16,
    /// Whole destination units per whole source unit
    pub expected_rate: String,
    pub worst_acceptable_rate: String,
    pub expected_dest_amount: String,
    pub min_dest_amount: String,
    pub needed: String,
    pub projected: AllocationInfo,
    pub worst_case: AllocationInfo,
}

impl From<LendQuote> for QuoteResponse {
    fn from(quote: LendQuote) -> Self {
        Self {
            loan_id: quote.loan_id,
            dest_asset: quote.dest_asset.to_string(),
            max_slippage_bps: quote.max_slippage_bps,
            expected_rate: quote.conversion.rate.expected_rate.to_string(),
            worst_acceptable_rate: quote.conversion.rate.worst_acceptable_rate.to_string(),
            expected_dest_amount: quote.conversion.expected_dest_amount.to_string(),
            min_dest_amount: quote.conversion.min_dest_amount.to_string(),
            needed: quote.projected.needed.to_string(),
            projected: quote.projected.into(),
            worst_case: quote.worst_case.into(),
        }
    }
}

/// Response of `GET /loans/{ledger}/{loan_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanResponse {
    pub ledger: String,
    pub loan_id: LoanId,
    pub requested_principal: String,
    pub current_funded_amount: String,
    pub remaining: String,
    pub fully_funded: bool,
    pub owner: Option<String>,
}

impl From<LoanView> for LoanResponse {
    fn from(view: LoanView) -> Self {
        Self {
            remaining: view.needed().to_string(),
            fully_funded: view.target.is_fully_funded(),
            ledger: view.target.ledger.to_string(),
            loan_id: view.target.loan_id,
            requested_principal: view.target.requested_principal.to_string(),
            current_funded_amount: view.target.current_funded_amount.to_string(),
            owner: view.owner.map(|owner| owner.to_string()),
        }
    }
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

pub fn parse_address(field: &'static str, raw: &str) -> Result<Address, state::ApiError> {
    Address::parse(raw).map_err(|e| state::ApiError::invalid(field, e.to_string()))
}

/// Parse a decimal string of base units
pub fn parse_amount(field: &'static str, raw: &str) -> Result<Amount, state::ApiError> {
    raw.trim()
        .parse::<Amount>()
        .map_err(|e| state::ApiError::invalid(field, format!("'{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote_request() -> QuoteRequest {
        QuoteRequest {
            exchange: Address::from_low_u64(0xe1).to_string(),
            ledger: Address::from_low_u64(0x1e4d).to_string(),
            loan_id: 0,
            source_asset: "native".to_string(),
            source_amount: "400200000000000000".to_string(),
            max_slippage_bps: None,
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("source_amount", " 42 ").unwrap(), 42);
        assert_eq!(
            parse_amount("source_amount", "340282366920938463463374607431768211455").unwrap(),
            u128::MAX
        );
        assert!(parse_amount("source_amount", "0.4").is_err());
        assert!(parse_amount("source_amount", "-1").is_err());
    }

    #[test]
    fn test_lend_body_is_flat() {
        let json = serde_json::json!({
            "payer": Address::from_low_u64(3).to_string(),
            "exchange": Address::from_low_u64(0xe1).to_string(),
            "ledger": Address::from_low_u64(0x1e4d).to_string(),
            "loan_id": 7,
            "source_asset": "native",
            "source_amount": "1000",
            "max_slippage_bps": 150
        });
        let body: LendRequestBody = serde_json::from_value(json).unwrap();
        let (payer, request) = body.parse().unwrap();

        assert_eq!(payer, Address::from_low_u64(3));
        assert_eq!(request.loan_id, 7);
        assert_eq!(request.source_asset, AssetId::Native);
        assert_eq!(request.source_amount, 1000);
        assert_eq!(request.max_slippage_bps, Some(150));
    }

    #[test]
    fn test_bad_field_is_named() {
        let mut request = quote_request();
        request.ledger = "0x1234".to_string();
        let err = request.to_lend_request().unwrap_err();
        assert_eq!(err.error_code(), "bad_request");
        assert!(err.to_string().starts_with("Invalid ledger"));
    }

    #[test]
    fn test_settlement_amounts_are_strings() {
        let response = SettlementResponse::from(SettlementOutcome {
            amount_applied_to_loan: 2_000_000_000_000_000_000_000,
            amount_refunded_to_payer: 1,
            amount_refunded_in_source_asset: 0,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["amount_applied_to_loan"], "2000000000000000000000");
        assert_eq!(json["amount_refunded_in_source_asset"], "0");
    }
}
