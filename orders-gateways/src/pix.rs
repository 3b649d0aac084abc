//! Real-time transfer (PIX) gateway adapter.
//!
//! Supports charge creation during checkout initiation, a pull-style
//! status check keyed by our correlation id, and normalization of the
//! gateway's webhook payload. This gateway has no signature scheme.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use orders_types::{
    ChargeCreated, ChargeGateway, ChargeRequest, ChargeStatus, GatewayError, GatewayStatus,
    PaymentEvent, PaymentMethod, TransferStatus,
};

use crate::GATEWAY_TIMEOUT;

#[derive(Debug, Deserialize)]
struct PixChargeResponse {
    #[serde(rename = "correlationID")]
    correlation_id: String,
    #[serde(rename = "qrCodeImage", default)]
    qr_code_image: Option<String>,
    #[serde(rename = "brCode", default)]
    br_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PixChargeDetail {
    status: TransferStatus,
    #[serde(rename = "paidAt", default)]
    paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    value: i64,
}

#[derive(Debug, Deserialize)]
struct PixWebhook {
    #[serde(default)]
    event: Option<String>,
    charge: PixWebhookCharge,
}

#[derive(Debug, Deserialize)]
struct PixWebhookCharge {
    #[serde(rename = "correlationID")]
    correlation_id: String,
    status: TransferStatus,
    #[serde(rename = "paymentID", default)]
    payment_id: Option<String>,
}

pub struct PixClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl PixClient {
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(GATEWAY_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        })
    }

    /// Normalizes the gateway's webhook payload. The correlation id in
    /// the payload is the external reference we generated at checkout.
    pub fn normalize_webhook(payload: &serde_json::Value) -> Result<PaymentEvent, GatewayError> {
        let webhook: PixWebhook = serde_json::from_value(payload.clone())
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        if let Some(event) = &webhook.event {
            tracing::debug!(event, "pix webhook event");
        }

        Ok(PaymentEvent {
            external_reference: Some(webhook.charge.correlation_id),
            gateway_payment_id: webhook.charge.payment_id,
            gateway_status: normalize_transfer_status(webhook.charge.status),
            method_hint: PaymentMethod::Pix,
        })
    }
}

/// ACTIVE means the customer has not paid yet, COMPLETED means settled,
/// EXPIRED means the charge died unpaid.
pub fn normalize_transfer_status(status: TransferStatus) -> GatewayStatus {
    match status {
        TransferStatus::Active => GatewayStatus::Pending,
        TransferStatus::Completed => GatewayStatus::Approved,
        TransferStatus::Expired => GatewayStatus::Rejected,
    }
}

#[async_trait::async_trait]
impl ChargeGateway for PixClient {
    #[tracing::instrument(skip(self, req), fields(correlation_id = %req.correlation_id))]
    async fn create_charge(&self, req: ChargeRequest) -> Result<ChargeCreated, GatewayError> {
        let url = format!("{}/api/v1/charge", self.base_url);
        let body = serde_json::json!({
            "correlationID": req.correlation_id,
            "value": req.amount_cents,
            "comment": req.customer_name,
        });

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .json(&body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        if !response.status().is_success() {
            return Err(GatewayError::Upstream(format!(
                "charge creation returned HTTP {}",
                response.status()
            )));
        }

        let charge: PixChargeResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        Ok(ChargeCreated {
            correlation_id: charge.correlation_id,
            qr_code: charge.qr_code_image.unwrap_or_default(),
            copy_paste_code: charge.br_code.unwrap_or_default(),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn charge_status(&self, correlation_id: &str) -> Result<ChargeStatus, GatewayError> {
        let url = format!("{}/api/v1/charge/{correlation_id}", self.base_url);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::Upstream("charge not found".into()));
        }
        if !response.status().is_success() {
            return Err(GatewayError::Upstream(format!(
                "status check returned HTTP {}",
                response.status()
            )));
        }

        let detail: PixChargeDetail = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        Ok(ChargeStatus {
            status: detail.status,
            paid_at: detail.paid_at,
            value_cents: detail.value,
        })
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_status_mapping() {
        assert_eq!(
            normalize_transfer_status(TransferStatus::Active),
            GatewayStatus::Pending
        );
        assert_eq!(
            normalize_transfer_status(TransferStatus::Completed),
            GatewayStatus::Approved
        );
        assert_eq!(
            normalize_transfer_status(TransferStatus::Expired),
            GatewayStatus::Rejected
        );
    }

    #[test]
    fn webhook_normalization() {
        let payload = serde_json::json!({
            "event": "OPENPIX:CHARGE_COMPLETED",
            "charge": {
                "correlationID": "ref-42",
                "status": "COMPLETED",
                "paymentID": "pay-9"
            }
        });

        let event = PixClient::normalize_webhook(&payload).unwrap();
        assert_eq!(event.external_reference.as_deref(), Some("ref-42"));
        assert_eq!(event.gateway_payment_id.as_deref(), Some("pay-9"));
        assert_eq!(event.gateway_status, GatewayStatus::Approved);
        assert_eq!(event.method_hint, PaymentMethod::Pix);
    }

    #[test]
    fn webhook_without_charge_is_malformed() {
        let payload = serde_json::json!({"event": "OPENPIX:CHARGE_CREATED"});
        assert!(matches!(
            PixClient::normalize_webhook(&payload),
            Err(GatewayError::Malformed(_))
        ));
    }
}
