//! Card checkout gateway adapter.
//!
//! This gateway signs every webhook delivery with HMAC-SHA256 over the
//! raw request body. Verification happens before the payload is parsed;
//! a payload that fails verification never reaches the reconciler.

use serde::Deserialize;

use orders_types::{GatewayError, GatewayStatus, PaymentEvent, PaymentMethod};

use crate::signature::verify_signature;

/// Native webhook shape of the card checkout gateway.
#[derive(Debug, Deserialize)]
struct CardWebhook {
    event: String,
    data: CardWebhookData,
}

#[derive(Debug, Deserialize)]
struct CardWebhookData {
    id: String,
    reference: Option<String>,
    status: String,
}

pub struct CardCheckoutAdapter {
    secret: String,
}

impl CardCheckoutAdapter {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    /// Verifies the signature over the raw body, then normalizes the
    /// payload into a `PaymentEvent`.
    pub fn normalize(&self, raw_body: &[u8], signature: &str) -> Result<PaymentEvent, GatewayError> {
        if !verify_signature(raw_body, signature, &self.secret) {
            return Err(GatewayError::InvalidSignature);
        }

        let webhook: CardWebhook = serde_json::from_slice(raw_body)
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        let gateway_status = map_card_status(&webhook.event, &webhook.data.status)?;

        Ok(PaymentEvent {
            external_reference: webhook.data.reference,
            gateway_payment_id: Some(webhook.data.id),
            gateway_status,
            method_hint: PaymentMethod::Card,
        })
    }
}

/// Completed/settled deliveries map to approved; everything the gateway
/// classifies as dead maps to cancelled.
fn map_card_status(event: &str, status: &str) -> Result<GatewayStatus, GatewayError> {
    match (event, status) {
        ("checkout.completed", _) | (_, "completed") | (_, "settled") => Ok(GatewayStatus::Approved),
        (_, "pending") | (_, "processing") => Ok(GatewayStatus::Pending),
        ("checkout.expired", _) | (_, "expired") | (_, "failed") | (_, "refused") => {
            Ok(GatewayStatus::Cancelled)
        }
        (event, status) => Err(GatewayError::Malformed(format!(
            "unrecognized card event {event} with status {status}"
        ))),
    }
}
