//! Order repository port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (SQLite, in-memory test doubles) implement this trait.

use crate::domain::{NewOrder, Order, OrderId, OrderPatch};
use crate::dto::{OrderFilter, OrderStats};
use crate::error::RepoError;

/// Canonical store of Order entities.
///
/// `update` MUST be a merge-patch (only supplied fields change) and MUST
/// be atomic per id: concurrent updates for different ids never
/// cross-contaminate, and concurrent updates for the same id serialize.
/// Orders are never deleted; there is deliberately no delete operation.
#[async_trait::async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Creates an order, assigning id and timestamps. Fails with
    /// `Conflict` when the external reference is already taken.
    async fn create_order(&self, new: NewOrder) -> Result<Order, RepoError>;

    /// Gets an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepoError>;

    /// Looks up the order a webhook refers to by its correlation key.
    async fn find_by_external_reference(&self, reference: &str)
    -> Result<Option<Order>, RepoError>;

    /// Fallback lookup by the gateway-assigned payment id already on file.
    async fn find_by_gateway_payment_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<Order>, RepoError>;

    /// Applies a merge-patch. Returns `None` for an unknown id.
    async fn update_order(&self, id: OrderId, patch: OrderPatch)
    -> Result<Option<Order>, RepoError>;

    /// Lists orders for the admin surface, newest first.
    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, RepoError>;

    /// Aggregate counters for the admin surface.
    async fn order_stats(&self) -> Result<OrderStats, RepoError>;
}
