//! Outbound transfer-gateway port.

use crate::dto::{ChargeCreated, ChargeRequest, ChargeStatus};
use crate::error::GatewayError;

/// Charge creation and pull-style status checks against the real-time
/// transfer gateway. Implementations are blocking network clients and
/// must bound every call with an explicit timeout; a timeout is a
/// retryable failure, never a negative payment result.
#[async_trait::async_trait]
pub trait ChargeGateway: Send + Sync + 'static {
    /// Opens a charge keyed by our correlation id and returns the
    /// transfer instructions for the customer.
    async fn create_charge(&self, req: ChargeRequest) -> Result<ChargeCreated, GatewayError>;

    /// Checks the current state of a charge by correlation id.
    async fn charge_status(&self, correlation_id: &str) -> Result<ChargeStatus, GatewayError>;
}
