//! HTTP request handlers.
//!
//! Webhook handlers always acknowledge receipt once the payload has
//! been read, whatever happens downstream; failing the HTTP response to
//! a gateway causes redelivery amplification, not recovery. The one
//! exception is a card webhook that fails signature verification, which
//! is rejected at the transport layer before normalization.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use orders_gateways::{AggregatorClient, CardCheckoutAdapter, PixClient, pix};
use orders_types::{
    AdminOrderPatch, AppError, CheckoutRequest, GatewayError, OrderFilter, OrderId,
    OrderRepository, PaymentEvent, PaymentMethod, WebhookAck,
};

use crate::{CheckoutService, Reconciler};

/// Application state shared across handlers.
pub struct AppState<R: OrderRepository> {
    pub checkout: CheckoutService<R>,
    pub reconciler: Reconciler<R>,
    pub card: CardCheckoutAdapter,
    pub aggregator: Option<AggregatorClient>,
    pub admin_token: String,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": "validation failed", "fields": errors, "code": 400 }),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg, "code": 400 }),
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": msg, "code": 404 }),
            ),
            AppError::RateLimited {
                retry_after_seconds,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                serde_json::json!({
                    "error": "Rate limit exceeded. Please try again later.",
                    "retry_after_seconds": retry_after_seconds,
                }),
            ),
            AppError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": "invalid webhook signature", "code": 401 }),
            ),
            AppError::UpstreamGateway(msg) => {
                tracing::error!(error = %msg, "upstream gateway failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "payment gateway unavailable", "code": 500 }),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "internal server error", "code": 500 }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Checkout
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state, req))]
pub async fn create_pix_order<R: OrderRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.checkout.create_pix_order(req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Pull-style status check for a transfer charge. A completed or
/// expired charge observed here is fed through the reconciler too, so
/// polling settles the order even when the webhook is delayed.
#[tracing::instrument(skip(state, params))]
pub async fn pix_status<R: OrderRepository>(
    State(state): State<Arc<AppState<R>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let correlation_id = params
        .get("correlationID")
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest("correlationID query parameter is required".into()))?
        .clone();

    let poll = state.checkout.transfer_status(&correlation_id).await?;

    if poll.is_paid || poll.is_expired {
        let event = PaymentEvent {
            external_reference: Some(correlation_id),
            gateway_payment_id: None,
            gateway_status: pix::normalize_transfer_status(poll.status),
            method_hint: PaymentMethod::Pix,
        };
        if let Err(e) = state.reconciler.apply(event).await {
            tracing::error!(error = %e, "reconciliation from status poll failed");
        }
    }

    Ok(Json(poll))
}

// ─────────────────────────────────────────────────────────────────────────────
// Webhooks
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip_all)]
pub async fn card_webhook<R: OrderRepository>(
    State(state): State<Arc<AppState<R>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get("x-signature")
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    let event = match state.card.normalize(&body, signature) {
        Ok(event) => event,
        Err(GatewayError::InvalidSignature) => {
            tracing::warn!("card webhook rejected: bad signature");
            return Err(AppError::InvalidSignature.into());
        }
        Err(e) => {
            // Malformed or otherwise unusable payload: acknowledged so
            // the gateway stops redelivering, diagnostics in the log.
            tracing::error!(error = %e, "card webhook payload not usable");
            return Ok(Json(WebhookAck::received()));
        }
    };

    apply_and_ack(&state.reconciler, event).await;
    Ok(Json(WebhookAck::received()))
}

#[tracing::instrument(skip_all)]
pub async fn aggregator_webhook<R: OrderRepository>(
    State(state): State<Arc<AppState<R>>>,
    body: Bytes,
) -> Json<WebhookAck> {
    // Parsed by hand rather than through the Json extractor: a body we
    // cannot read is acked too, once received.
    let Some(payload) = parse_webhook_body(&body) else {
        return Json(WebhookAck::received());
    };

    let Some(client) = &state.aggregator else {
        tracing::warn!("aggregator webhook received but gateway is not configured");
        return Json(WebhookAck::received());
    };

    let Some(payment_id) = AggregatorClient::payment_id_from_webhook(&payload) else {
        tracing::debug!("aggregator webhook carries no payment id, ignoring");
        return Json(WebhookAck::received());
    };

    // The lookup is the retryable part: on upstream failure we still
    // acknowledge and rely on the gateway redelivering.
    match client.fetch_event(&payment_id).await {
        Ok(event) => apply_and_ack(&state.reconciler, event).await,
        Err(e) => {
            tracing::error!(payment_id, error = %e, "aggregator payment lookup failed")
        }
    }

    Json(WebhookAck::received())
}

#[tracing::instrument(skip_all)]
pub async fn pix_webhook<R: OrderRepository>(
    State(state): State<Arc<AppState<R>>>,
    body: Bytes,
) -> Json<WebhookAck> {
    let Some(payload) = parse_webhook_body(&body) else {
        return Json(WebhookAck::received());
    };

    match PixClient::normalize_webhook(&payload) {
        Ok(event) => apply_and_ack(&state.reconciler, event).await,
        Err(e) => tracing::error!(error = %e, "pix webhook payload not usable"),
    }

    Json(WebhookAck::received())
}

fn parse_webhook_body(body: &[u8]) -> Option<serde_json::Value> {
    match serde_json::from_slice(body) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::error!(error = %e, "webhook body is not valid JSON");
            None
        }
    }
}

/// Every failure inside webhook processing is caught and logged; the
/// transport response to the gateway stays a success.
async fn apply_and_ack<R: OrderRepository>(reconciler: &Reconciler<R>, event: PaymentEvent) {
    if let Err(e) = reconciler.apply(event).await {
        tracing::error!(error = %e, "payment event processing failed");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state))]
pub async fn list_orders<R: OrderRepository>(
    State(state): State<Arc<AppState<R>>>,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state.checkout.list_orders(filter).await?;
    Ok(Json(orders))
}

#[tracing::instrument(skip(state), fields(order_id = %id))]
pub async fn get_order<R: OrderRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id: OrderId = id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid order ID".into()))?;

    let order = state.checkout.get_order(order_id).await?;
    Ok(Json(order))
}

#[tracing::instrument(skip(state))]
pub async fn order_stats<R: OrderRepository>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.checkout.order_stats().await?;
    Ok(Json(stats))
}

#[tracing::instrument(skip(state, patch), fields(order_id = %id))]
pub async fn patch_order<R: OrderRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    Json(patch): Json<AdminOrderPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id: OrderId = id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid order ID".into()))?;

    let order = state.checkout.patch_order(order_id, patch).await?;
    Ok(Json(order))
}
