//! Order domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an Order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random OrderId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an OrderId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OrderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle status of an Order.
///
/// `Paid` and `Completed` are terminal-success, `Cancelled` is
/// terminal-failure. No automatic transition is defined out of a
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    PendingPix,
    Paid,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Completed | Self::Cancelled)
    }
}

impl AsRef<str> for OrderStatus {
    fn as_ref(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::PendingPix => "pending_pix",
            Self::Paid => "paid",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "pending_pix" => Ok(Self::PendingPix),
            "paid" => Ok(Self::Paid),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Payment method confirmed by a gateway.
///
/// Starts as `Unknown` unless the creation flow already fixes it
/// (PIX checkout creates `Pix` orders). Set by the reconciler once a
/// gateway confirms which rail the customer actually used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Pix,
    #[default]
    Unknown,
}

impl AsRef<str> for PaymentMethod {
    fn as_ref(&self) -> &str {
        match self {
            Self::Card => "card",
            Self::Pix => "pix",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "pix" => Ok(Self::Pix),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// The canonical record of one customer purchase.
///
/// Created once by the checkout-initiation path and mutated only by the
/// reconciler thereafter. Never deleted in normal operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier, assigned at creation
    pub id: OrderId,
    /// Opaque plan identifier the amount was priced from
    pub plan_id: String,
    /// Human-readable description from the price table
    pub description: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    /// Amount in cents, fixed at creation from the server-side price table
    pub amount_cents: i64,
    /// Correlation key shared with the gateways; unique across all orders
    pub external_reference: String,
    /// Secondary identifier assigned by whichever gateway confirms payment
    pub gateway_payment_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    /// Sanitized free-text personalization fields, captured once at creation
    pub personalization: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create an Order. Id and timestamps are assigned by
/// the repository.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub plan_id: String,
    pub description: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub amount_cents: i64,
    pub external_reference: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub personalization: serde_json::Value,
}

/// Merge-patch for an Order: only supplied fields change.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub gateway_payment_id: Option<String>,
}

impl OrderPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.payment_method.is_none() && self.gateway_payment_id.is_none()
    }
}
