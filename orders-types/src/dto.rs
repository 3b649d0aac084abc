//! Data Transfer Objects for the API boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{OrderId, OrderStatus, PaymentMethod};

// ─────────────────────────────────────────────────────────────────────────────
// Checkout DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Body of the checkout creation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub service: ServiceSelection,
    pub details: CheckoutDetails,
}

/// Which plan is being purchased. Only the id is trusted; pricing comes
/// from the server-side table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSelection {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
}

/// Customer-supplied form fields. All free text is sanitized before it
/// is persisted or echoed into a gateway payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub message: Option<String>,
    /// Required for gender-reveal items: "unknown", "boy" or "girl"
    #[serde(default)]
    pub revealed_gender: Option<String>,
    /// Required when `revealed_gender` is a concrete selection
    #[serde(default)]
    pub baby_name: Option<String>,
}

/// Successful checkout creation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order_id: OrderId,
    pub correlation_reference: String,
    pub transfer_instructions: TransferInstructions,
}

/// What the customer needs to complete a real-time transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferInstructions {
    pub qr_code: String,
    pub copy_paste_code: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Transfer gateway DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to open a charge with the transfer gateway.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub correlation_id: String,
    pub amount_cents: i64,
    pub customer_name: String,
}

/// A freshly created transfer charge.
#[derive(Debug, Clone)]
pub struct ChargeCreated {
    pub correlation_id: String,
    pub qr_code: String,
    pub copy_paste_code: String,
}

/// Transfer gateway charge lifecycle, as the gateway reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Active,
    Completed,
    Expired,
}

/// Result of a pull-style status check on a transfer charge.
#[derive(Debug, Clone)]
pub struct ChargeStatus {
    pub status: TransferStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub value_cents: i64,
}

/// Status poll response for the transfer gateway endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPollResponse {
    pub status: TransferStatus,
    pub is_paid: bool,
    pub is_expired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    pub value: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Webhook DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Acknowledgement returned to a gateway once its payload is read,
/// regardless of the internal processing outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self { received: true }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// List filter for the admin order listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

/// Manual merge-patch applied by an operator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminOrderPatch {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

/// Aggregate counters for the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStats {
    pub total: i64,
    pub pending: i64,
    pub pending_pix: i64,
    pub paid: i64,
    pub completed: i64,
    pub cancelled: i64,
    /// Sum of amounts over paid and completed orders
    pub revenue_cents: i64,
}
