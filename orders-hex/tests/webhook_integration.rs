//! HTTP-level integration tests for the checkout and webhook surface.
//!
//! These drive the full router (middleware stack included) against an
//! in-memory SQLite repository, with the transfer gateway stubbed out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use orders_gateways::{CardCheckoutAdapter, WebhookNotifier, signature::sign_payload};
use orders_hex::{
    CheckoutService, Reconciler,
    inbound::{AppState, HttpServer, RateGuard},
};
use orders_repo::SqliteOrderRepo;
use orders_types::{
    ChargeCreated, ChargeGateway, ChargeRequest, ChargeStatus, GatewayError, PlanPrice,
    PriceTable, TransferStatus,
};

const WEBHOOK_SECRET: &str = "test-webhook-secret";
const ADMIN_TOKEN: &str = "test-admin-token";

/// Transfer gateway stub: charges succeed, status is always unpaid.
struct StubTransferGateway;

#[async_trait]
impl ChargeGateway for StubTransferGateway {
    async fn create_charge(&self, req: ChargeRequest) -> Result<ChargeCreated, GatewayError> {
        Ok(ChargeCreated {
            correlation_id: req.correlation_id,
            qr_code: "data:image/png;base64,stub".into(),
            copy_paste_code: "00020126stubbrcode".into(),
        })
    }

    async fn charge_status(&self, _correlation_id: &str) -> Result<ChargeStatus, GatewayError> {
        Ok(ChargeStatus {
            status: TransferStatus::Active,
            paid_at: None,
            value_cents: 4990,
        })
    }
}

fn price_table() -> PriceTable {
    let mut plans = HashMap::new();
    plans.insert(
        "basic".to_string(),
        PlanPrice {
            amount_cents: 4990,
            description: "Basic plan".into(),
        },
    );
    PriceTable::new(plans).unwrap()
}

async fn test_server(rate_limit: u32) -> HttpServer<SqliteOrderRepo> {
    let repo = Arc::new(SqliteOrderRepo::new("sqlite::memory:").await.unwrap());
    let notifier = Arc::new(WebhookNotifier::new(None).unwrap());

    let state = Arc::new(AppState {
        checkout: CheckoutService::new(
            repo.clone(),
            price_table(),
            Some(Arc::new(StubTransferGateway)),
        ),
        reconciler: Reconciler::new(repo, notifier),
        card: CardCheckoutAdapter::new(WEBHOOK_SECRET),
        aggregator: None,
        admin_token: ADMIN_TOKEN.to_string(),
    });

    let guard = Arc::new(RateGuard::new(rate_limit, Duration::from_secs(60), false));
    HttpServer::new(state, guard)
}

fn checkout_request() -> Request<Body> {
    let body = serde_json::json!({
        "service": { "id": "basic", "type": "standard" },
        "details": {
            "name": "Maria Silva",
            "email": "maria@example.com",
            "phone": "(11) 98765-4321"
        }
    });
    Request::builder()
        .method(Method::POST)
        .uri("/api/checkout/pix")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn pix_webhook_request(reference: &str) -> Request<Body> {
    let body = serde_json::json!({
        "event": "OPENPIX:CHARGE_COMPLETED",
        "charge": {
            "correlationID": reference,
            "status": "COMPLETED",
            "paymentID": "pix-pay-1"
        }
    });
    Request::builder()
        .method(Method::POST)
        .uri("/webhooks/pix")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Creates an order through the API, returning its correlation reference.
async fn create_order(app: &axum::Router) -> String {
    let response = app.clone().oneshot(checkout_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await;
    json["correlation_reference"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn checkout_returns_transfer_instructions() {
    let app = test_server(100).await.router();

    let response = app.clone().oneshot(checkout_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = json_body(response).await;
    assert!(json["order_id"].as_str().is_some());
    assert!(json["correlation_reference"].as_str().is_some());
    assert_eq!(
        json["transfer_instructions"]["copy_paste_code"],
        "00020126stubbrcode"
    );
}

#[tokio::test]
async fn checkout_validation_failure_lists_fields() {
    let app = test_server(100).await.router();

    let body = serde_json::json!({
        "service": { "id": "basic", "type": "standard" },
        "details": { "name": "", "email": "not-an-email", "phone": "123" }
    });
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/checkout/pix")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert!(json["fields"].as_array().is_some_and(|f| f.len() >= 2));
}

#[tokio::test]
async fn pix_webhook_pays_order_and_duplicate_is_acknowledged() {
    let server = test_server(100).await;
    let app = server.router();

    let reference = create_order(&app).await;

    let response = app
        .clone()
        .oneshot(pix_webhook_request(&reference))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["received"], true);

    // Redelivery still acks with 200.
    let response = app
        .clone()
        .oneshot(pix_webhook_request(&reference))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Admin listing confirms the order is paid with the gateway id.
    let request = Request::builder()
        .uri("/api/orders?status=paid")
        .header("Authorization", format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let orders = json_body(response).await;
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["external_reference"], reference.as_str());
    assert_eq!(orders[0]["gateway_payment_id"], "pix-pay-1");
}

#[tokio::test]
async fn card_webhook_with_bad_signature_is_rejected() {
    let app = test_server(100).await.router();

    let payload = serde_json::json!({
        "event": "checkout.completed",
        "data": { "id": "card-1", "reference": "ref-1", "status": "completed" }
    })
    .to_string();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/webhooks/card")
        .header("Content-Type", "application/json")
        .header("x-signature", "deadbeef")
        .body(Body::from(payload))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signed_card_webhook_is_acknowledged() {
    let server = test_server(100).await;
    let app = server.router();

    let reference = create_order(&app).await;
    let payload = serde_json::json!({
        "event": "checkout.completed",
        "data": { "id": "card-1", "reference": reference, "status": "completed" }
    })
    .to_string();
    let signature = sign_payload(payload.as_bytes(), WEBHOOK_SECRET);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/webhooks/card")
        .header("Content-Type", "application/json")
        .header("x-signature", signature)
        .body(Body::from(payload))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["received"], true);
}

#[tokio::test]
async fn unknown_reference_webhook_still_acks() {
    let app = test_server(100).await.router();

    let response = app
        .oneshot(pix_webhook_request("no-such-reference"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["received"], true);
}

#[tokio::test]
async fn non_json_webhook_body_is_still_acknowledged() {
    let app = test_server(100).await.router();

    for uri in ["/webhooks/pix", "/webhooks/aggregator"] {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from("not json at all"))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(json_body(response).await["received"], true, "{uri}");
    }
}

#[tokio::test]
async fn checkout_is_rate_limited_with_retry_hint() {
    let app = test_server(2).await.router();

    for _ in 0..2 {
        let response = app.clone().oneshot(checkout_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app.clone().oneshot(checkout_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let json = json_body(response).await;
    assert!(json["retry_after_seconds"].as_u64().is_some_and(|s| s >= 1));
}

#[tokio::test]
async fn forwarded_header_cannot_reset_the_quota() {
    let app = test_server(1).await.router();

    let with_forwarded = |ip: &str| {
        let mut request = checkout_request();
        request
            .headers_mut()
            .insert("x-forwarded-for", ip.parse().unwrap());
        request
    };

    let response = app.clone().oneshot(with_forwarded("203.0.113.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Rotating the header does not mint a fresh quota: the client's
    // real address is the key.
    let response = app.clone().oneshot(with_forwarded("203.0.113.2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn webhooks_are_not_rate_limited() {
    let app = test_server(1).await.router();

    // Exhaust the checkout quota for this client.
    let _ = app.clone().oneshot(checkout_request()).await.unwrap();

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(pix_webhook_request("any-reference"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn pix_status_requires_correlation_id() {
    let app = test_server(100).await.router();

    let request = Request::builder()
        .uri("/api/pix/status")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_routes_require_bearer_token() {
    let app = test_server(100).await.router();

    let request = Request::builder()
        .uri("/api/orders/stats")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/orders/stats")
        .header("Authorization", "Bearer wrong-token")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/orders/stats")
        .header("Authorization", format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn admin_patch_updates_order_status() {
    let server = test_server(100).await;
    let app = server.router();

    let reference = create_order(&app).await;

    // Find the order id through the admin listing.
    let request = Request::builder()
        .uri("/api/orders")
        .header("Authorization", format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let orders = json_body(response).await;
    let order = &orders.as_array().unwrap()[0];
    assert_eq!(order["external_reference"], reference.as_str());
    let order_id = order["id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method(Method::PATCH)
        .uri(format!("/api/orders/{order_id}"))
        .header("Authorization", format!("Bearer {ADMIN_TOKEN}"))
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"status": "completed"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "completed");
}
