//! Notification dispatcher adapter.
//!
//! Posts a JSON summary of a freshly paid order to a configured
//! notification endpoint. When no endpoint is configured the dispatcher
//! is disabled: dispatch logs and reports success, per the
//! missing-credential contract.

use orders_types::{NotificationDispatcher, NotifyError, Order};

use crate::GATEWAY_TIMEOUT;

pub struct WebhookNotifier {
    http: reqwest::Client,
    target_url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(target_url: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(GATEWAY_TIMEOUT).build()?;
        Ok(Self { http, target_url })
    }

    pub fn is_enabled(&self) -> bool {
        self.target_url.is_some()
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for WebhookNotifier {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    async fn order_paid(&self, order: &Order) -> Result<(), NotifyError> {
        let Some(target) = &self.target_url else {
            tracing::info!("notification dispatch disabled, skipping");
            return Ok(());
        };

        let payload = serde_json::json!({
            "event": "order.paid",
            "order_id": order.id,
            "plan_id": order.plan_id,
            "amount_cents": order.amount_cents,
            "payment_method": order.payment_method,
            "customer_name": order.customer_name,
            "customer_email": order.customer_email,
        });

        let response = self
            .http
            .post(target)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError(format!(
                "notification endpoint returned HTTP {}",
                response.status()
            )));
        }

        tracing::info!("paid-order notification delivered");
        Ok(())
    }
}
