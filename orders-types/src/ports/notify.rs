//! Notification dispatcher port.

use crate::domain::Order;
use crate::error::NotifyError;

/// Receives a finalized order for human-facing notification delivery.
///
/// The reconciler guarantees this is invoked at most meaningfully once
/// per paid transition; implementations need not deduplicate.
#[async_trait::async_trait]
pub trait NotificationDispatcher: Send + Sync + 'static {
    async fn order_paid(&self, order: &Order) -> Result<(), NotifyError>;
}
