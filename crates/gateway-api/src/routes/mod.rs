//! API route handlers

pub mod health;
pub mod lend;
pub mod loans;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/quote", post(lend::quote))
        .route("/lend", post(lend::lend))
        .route("/loans/:ledger/:loan_id", get(loans::get_loan))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use gateway::Gateway;
    use gateway_core::{Address, Amount, AppConfig, AssetId, Rate};
    use ledgers::AssetLedger;
    use sandbox::World;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{create_app, AppState};

    const E18: Amount = 1_000_000_000_000_000_000;

    fn payer() -> Address {
        Address::from_low_u64(3)
    }

    async fn setup() -> (AppConfig, World, AppState) {
        let config = AppConfig::default();
        let world = World::seed(&config.sandbox).await;
        let gateway = Gateway::new(config.gateway.clone(), world.registry());
        let state = AppState::new(config.clone(), gateway);
        (config, world, state)
    }

    async fn fund_payer(config: &AppConfig, world: &World, amount: Amount) {
        world.native.mint(&payer(), E18).await;
        assert!(
            world
                .native
                .approve(&payer(), &config.gateway.address, amount)
                .await
        );
    }

    fn lend_body(config: &AppConfig, loan_id: u64, amount: &str) -> Value {
        json!({
            "payer": payer().to_string(),
            "exchange": config.sandbox.exchange.to_string(),
            "ledger": config.sandbox.lending_ledger.to_string(),
            "loan_id": loan_id,
            "source_asset": "native",
            "source_amount": amount,
        })
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = create_app(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post(state: &AppState, uri: &str, body: &Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(state, request).await
    }

    async fn get(state: &AppState, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        send(state, request).await
    }

    #[tokio::test]
    async fn test_health() {
        let (_, _, state) = setup().await;
        let (status, body) = get(&state, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_lend_then_read_loan() {
        let (config, world, state) = setup().await;
        let loan_id = world
            .lending
            .create_loan(&Address::from_low_u64(2), 2000 * E18)
            .await;
        fund_payer(&config, &world, 400_200_000_000_000_000).await;

        let (status, body) = post(
            &state,
            "/lend",
            &lend_body(&config, loan_id, "400200000000000000"),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["amount_applied_to_loan"], "2000000000000000000000");
        assert_eq!(body["amount_refunded_to_payer"], "1000000000000000000");
        assert_eq!(body["amount_refunded_in_source_asset"], "0");

        let uri = format!("/loans/{}/{}", config.sandbox.lending_ledger, loan_id);
        let (status, body) = get(&state, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fully_funded"], true);
        assert_eq!(body["remaining"], "0");
        assert_eq!(body["owner"], payer().to_string());
    }

    #[tokio::test]
    async fn test_quote() {
        let (config, world, state) = setup().await;
        let loan_id = world
            .lending
            .create_loan(&Address::from_low_u64(2), 2000 * E18)
            .await;

        let mut body = lend_body(&config, loan_id, "400200000000000000");
        body.as_object_mut().unwrap().remove("payer");
        let (status, body) = post(&state, "/quote", &body).await;

        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["expected_rate"], "5000");
        assert_eq!(body["worst_acceptable_rate"], "4850");
        assert_eq!(body["expected_dest_amount"], "2001000000000000000000");
        assert_eq!(body["min_dest_amount"], "1940970000000000000000");
        assert_eq!(body["projected"]["refund"], "1000000000000000000");
        assert_eq!(body["projected"]["completes_loan"], true);
        assert_eq!(body["worst_case"]["completes_loan"], false);
    }

    #[tokio::test]
    async fn test_gateway_errors_keep_their_status() {
        let (config, world, state) = setup().await;
        let loan_id = world
            .lending
            .create_loan(&Address::from_low_u64(2), 2000 * E18)
            .await;

        let (status, body) = post(
            &state,
            "/lend",
            &lend_body(&config, loan_id + 1, "400200000000000000"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "loan_not_found");

        world
            .exchange
            .set_execution_rate(
                &AssetId::Native,
                &world.principal_asset(),
                Rate::from_units(4800),
            )
            .await;
        fund_payer(&config, &world, 400_000_000_000_000_000).await;
        let (status, body) = post(
            &state,
            "/lend",
            &lend_body(&config, loan_id, "400000000000000000"),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "slippage_exceeded");
    }

    #[tokio::test]
    async fn test_malformed_fields_are_bad_requests() {
        let (config, _, state) = setup().await;

        let (status, body) = post(&state, "/lend", &lend_body(&config, 0, "0.4")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "bad_request");

        let (status, body) = get(&state, "/loans/not-an-address/0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "bad_request");
    }
}
