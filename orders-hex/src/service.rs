//! Checkout initiation and admin read service.
//!
//! Orchestrates domain operations through the repository port.
//! Contains NO infrastructure logic - pure business orchestration.

use std::sync::Arc;

use uuid::Uuid;

use orders_types::{
    AdminOrderPatch, AppError, ChargeGateway, ChargeRequest, CheckoutRequest, CheckoutResponse,
    GatewayError, NewOrder, Order, OrderFilter, OrderId, OrderPatch, OrderRepository, OrderStats,
    OrderStatus, PaymentMethod, PriceTable, StatusPollResponse, TransferInstructions,
    TransferStatus,
    guard::{
        MAX_BABY_NAME_LEN, MAX_EMAIL_LEN, MAX_MESSAGE_LEN, MAX_NAME_LEN, MAX_PHONE_LEN, sanitize,
        validate_checkout,
    },
};

/// Application service for checkout initiation and the admin surface.
///
/// Generic over `R: OrderRepository` - the adapter is injected at
/// compile time, which keeps the service testable with an in-memory
/// repository.
pub struct CheckoutService<R: OrderRepository> {
    repo: Arc<R>,
    prices: PriceTable,
    transfers: Option<Arc<dyn ChargeGateway>>,
}

impl<R: OrderRepository> CheckoutService<R> {
    pub fn new(
        repo: Arc<R>,
        prices: PriceTable,
        transfers: Option<Arc<dyn ChargeGateway>>,
    ) -> Self {
        Self {
            repo,
            prices,
            transfers,
        }
    }

    /// Creates a PIX order: validate, sanitize, price server-side,
    /// persist the pending order, then ask the gateway for a charge.
    ///
    /// The order is persisted BEFORE the gateway call so that the
    /// webhook can always resolve the reference it will receive back.
    /// If the gateway call fails, the order stays pending and simply
    /// never completes.
    #[tracing::instrument(skip(self, req), fields(plan_id = %req.service.id))]
    pub async fn create_pix_order(&self, req: CheckoutRequest) -> Result<CheckoutResponse, AppError> {
        validate_checkout(&req).map_err(AppError::Validation)?;

        let price = self.prices.lookup(&req.service.id)?;
        let transfers = self
            .transfers
            .as_ref()
            .ok_or(GatewayError::Unconfigured)?
            .clone();

        let customer_name = sanitize(&req.details.name, MAX_NAME_LEN);
        let customer_email = sanitize(&req.details.email, MAX_EMAIL_LEN);
        let customer_phone = sanitize(&req.details.phone, MAX_PHONE_LEN);
        let personalization = serde_json::json!({
            "item_type": sanitize(&req.service.item_type, 40),
            "message": req.details.message.as_deref().map(|m| sanitize(m, MAX_MESSAGE_LEN)),
            "revealed_gender": req.details.revealed_gender.as_deref().map(|g| sanitize(g, 10)),
            "baby_name": req.details.baby_name.as_deref().map(|n| sanitize(n, MAX_BABY_NAME_LEN)),
        });

        // Generated before any gateway call; this is the correlation key
        // every webhook resolves through.
        let reference = Uuid::new_v4().to_string();

        let order = self
            .repo
            .create_order(NewOrder {
                plan_id: req.service.id.clone(),
                description: price.description.clone(),
                status: OrderStatus::PendingPix,
                payment_method: PaymentMethod::Pix,
                amount_cents: price.amount_cents,
                external_reference: reference.clone(),
                customer_name: customer_name.clone(),
                customer_email,
                customer_phone,
                personalization,
            })
            .await?;

        let charge = transfers
            .create_charge(ChargeRequest {
                correlation_id: reference.clone(),
                amount_cents: order.amount_cents,
                customer_name,
            })
            .await?;

        tracing::info!(order_id = %order.id, "pix order created");

        Ok(CheckoutResponse {
            order_id: order.id,
            correlation_reference: reference,
            transfer_instructions: TransferInstructions {
                qr_code: charge.qr_code,
                copy_paste_code: charge.copy_paste_code,
            },
        })
    }

    /// Pull-style status check against the transfer gateway.
    #[tracing::instrument(skip(self))]
    pub async fn transfer_status(&self, correlation_id: &str) -> Result<StatusPollResponse, AppError> {
        let transfers = self.transfers.as_ref().ok_or(GatewayError::Unconfigured)?;
        let charge = transfers.charge_status(correlation_id).await?;

        Ok(StatusPollResponse {
            status: charge.status,
            is_paid: charge.status == TransferStatus::Completed,
            is_expired: charge.status == TransferStatus::Expired,
            paid_at: charge.paid_at,
            value: charge.value_cents,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Admin reads
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn get_order(&self, id: OrderId) -> Result<Order, AppError> {
        self.repo
            .get_order(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Order {id}"))))
    }

    pub async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, AppError> {
        self.repo.list_orders(filter).await.map_err(Into::into)
    }

    pub async fn order_stats(&self) -> Result<OrderStats, AppError> {
        self.repo.order_stats().await.map_err(Into::into)
    }

    /// Manual operator patch; the merge-patch contract of the port keeps
    /// unsupplied fields intact.
    pub async fn patch_order(&self, id: OrderId, patch: AdminOrderPatch) -> Result<Order, AppError> {
        let patch = OrderPatch {
            status: patch.status,
            payment_method: patch.payment_method,
            gateway_payment_id: None,
        };
        if patch.is_empty() {
            return Err(AppError::BadRequest("empty patch".into()));
        }
        self.repo
            .update_order(id, patch)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Order {id}"))))
    }
}
