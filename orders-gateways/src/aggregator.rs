//! Regional aggregator gateway adapter.
//!
//! This gateway's webhook payload carries only a payment id. The adapter
//! performs a synchronous authenticated lookup for the full payment
//! details (status, method, correlation reference) before normalizing.

use serde::Deserialize;

use orders_types::{GatewayError, GatewayStatus, PaymentEvent, PaymentMethod};

use crate::GATEWAY_TIMEOUT;

/// Full payment record as returned by the detail lookup.
#[derive(Debug, Deserialize)]
struct AggregatorPayment {
    id: serde_json::Value,
    status: String,
    #[serde(default)]
    payment_method_id: Option<String>,
    #[serde(default)]
    external_reference: Option<String>,
}

pub struct AggregatorClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl AggregatorClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(GATEWAY_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Extracts the payment id from the gateway's native webhook shape:
    /// `{"type": "payment", "data": {"id": ...}}`. Returns `None` for
    /// notification types we do not consume.
    pub fn payment_id_from_webhook(payload: &serde_json::Value) -> Option<String> {
        if payload.get("type").and_then(|t| t.as_str()) != Some("payment") {
            return None;
        }
        let id = payload.get("data")?.get("id")?;
        match id {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Fetches the payment details and normalizes them.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_event(&self, payment_id: &str) -> Result<PaymentEvent, GatewayError> {
        let url = format!("{}/v1/payments/{payment_id}", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        if !response.status().is_success() {
            return Err(GatewayError::Upstream(format!(
                "payment lookup returned HTTP {}",
                response.status()
            )));
        }

        let payment: AggregatorPayment = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        let gateway_status = map_aggregator_status(&payment.status)?;
        let method_hint = match payment.payment_method_id.as_deref() {
            Some("pix") => PaymentMethod::Pix,
            Some(_) => PaymentMethod::Card,
            None => PaymentMethod::Unknown,
        };

        Ok(PaymentEvent {
            external_reference: payment.external_reference,
            gateway_payment_id: Some(json_id_to_string(&payment.id)),
            gateway_status,
            method_hint,
        })
    }
}

fn json_id_to_string(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Maps the aggregator's status vocabulary into the shared one.
pub fn map_aggregator_status(status: &str) -> Result<GatewayStatus, GatewayError> {
    match status {
        "approved" => Ok(GatewayStatus::Approved),
        "pending" => Ok(GatewayStatus::Pending),
        "in_process" => Ok(GatewayStatus::InProcess),
        "rejected" => Ok(GatewayStatus::Rejected),
        "cancelled" => Ok(GatewayStatus::Cancelled),
        "refunded" => Ok(GatewayStatus::Refunded),
        "charged_back" => Ok(GatewayStatus::ChargedBack),
        other => Err(GatewayError::Malformed(format!(
            "unknown aggregator status: {other}"
        ))),
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
    fn status_mapping_covers_full_vocabulary() {
        assert_eq!(map_aggregator_status("approved").unwrap(), GatewayStatus::Approved);
        assert_eq!(map_aggregator_status("pending").unwrap(), GatewayStatus::Pending);
        assert_eq!(map_aggregator_status("in_process").unwrap(), GatewayStatus::InProcess);
        assert_eq!(map_aggregator_status("rejected").unwrap(), GatewayStatus::Rejected);
        assert_eq!(map_aggregator_status("cancelled").unwrap(), GatewayStatus::Cancelled);
        assert_eq!(map_aggregator_status("refunded").unwrap(), GatewayStatus::Refunded);
        assert_eq!(map_aggregator_status("charged_back").unwrap(), GatewayStatus::ChargedBack);
        assert!(map_aggregator_status("mystery").is_err());
    }

    #[test]
    fn webhook_id_extraction() {
        let payload = serde_json::json!({"type": "payment", "data": {"id": 12345}});
        assert_eq!(
            AggregatorClient::payment_id_from_webhook(&payload).as_deref(),
            Some("12345")
        );

        let payload = serde_json::json!({"type": "payment", "data": {"id": "abc-1"}});
        assert_eq!(
            AggregatorClient::payment_id_from_webhook(&payload).as_deref(),
            Some("abc-1")
        );
    }

    #[test]
    fn non_payment_webhooks_are_ignored() {
        let payload = serde_json::json!({"type": "merchant_order", "data": {"id": 9}});
        assert!(AggregatorClient::payment_id_from_webhook(&payload).is_none());

        let payload = serde_json::json!({"data": {"id": 9}});
        assert!(AggregatorClient::payment_id_from_webhook(&payload).is_none());
    }
}
