//! The reconciliation state machine.
//!
//! Consumes normalized `PaymentEvent`s, resolves the matching order,
//! runs the transition guard and applies an idempotent merge-patch.
//! The notification dispatcher fires exactly on the not-paid to paid
//! transition, which the guard makes safe under duplicate delivery.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use orders_types::{
    AppError, NotificationDispatcher, Order, OrderId, OrderPatch, OrderRepository, OrderStatus,
    PaymentEvent, PaymentMethod, Transition, plan_transition, target_status,
};

/// What applying one event did.
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// The event references no known order. Acknowledged, not an error:
    /// gateways retry delivery and the order may belong elsewhere.
    NoMatchingOrder,
    /// Duplicate or stale event; no write, no notification.
    Unchanged,
    Updated {
        order: Order,
        notified: bool,
    },
}

pub struct Reconciler<R: OrderRepository> {
    repo: Arc<R>,
    notifier: Arc<dyn NotificationDispatcher>,
    /// Per-order locks: concurrent events for the same order serialize
    /// so the idempotency guard observes a consistent prior state.
    /// Cross-order events proceed fully in parallel.
    locks: DashMap<OrderId, Arc<Mutex<()>>>,
}

impl<R: OrderRepository> Reconciler<R> {
    pub fn new(repo: Arc<R>, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        Self {
            repo,
            notifier,
            locks: DashMap::new(),
        }
    }

    /// Applies one normalized payment event.
    #[tracing::instrument(
        skip(self, event),
        fields(
            reference = event.external_reference.as_deref().unwrap_or("-"),
            gateway_status = ?event.gateway_status,
        )
    )]
    pub async fn apply(&self, event: PaymentEvent) -> Result<ReconcileOutcome, AppError> {
        let Some(order_id) = self.resolve(&event).await? else {
            tracing::info!("payment event matches no order, acknowledging as no-op");
            return Ok(ReconcileOutcome::NoMatchingOrder);
        };

        let lock = {
            let entry = self.locks.entry(order_id).or_default();
            entry.value().clone()
        };
        let outcome = {
            let _guard = lock.lock().await;
            self.apply_locked(order_id, &event).await
        };
        // Drop idle lock entries so the map stays bounded.
        self.locks
            .remove_if(&order_id, |_, l| Arc::strong_count(l) <= 2);

        outcome
    }

    /// Resolves the order: external reference first, then any previously
    /// recorded gateway payment id.
    async fn resolve(&self, event: &PaymentEvent) -> Result<Option<OrderId>, AppError> {
        if let Some(reference) = event.external_reference.as_deref() {
            if let Some(order) = self.repo.find_by_external_reference(reference).await? {
                return Ok(Some(order.id));
            }
        }
        if let Some(payment_id) = event.gateway_payment_id.as_deref() {
            if let Some(order) = self.repo.find_by_gateway_payment_id(payment_id).await? {
                return Ok(Some(order.id));
            }
        }
        Ok(None)
    }

    async fn apply_locked(
        &self,
        order_id: OrderId,
        event: &PaymentEvent,
    ) -> Result<ReconcileOutcome, AppError> {
        // Fresh read under the lock: a concurrent event for this order
        // may have just transitioned it.
        let Some(order) = self.repo.get_order(order_id).await? else {
            return Ok(ReconcileOutcome::NoMatchingOrder);
        };

        // The pending flavor depends on the method family; fall back to
        // whatever the order already knows when the event cannot tell.
        let family = match event.method_hint {
            PaymentMethod::Unknown => order.payment_method,
            concrete => concrete,
        };
        let target = target_status(event.gateway_status, family);

        let (status, payment_method) =
            match plan_transition(order.status, order.payment_method, target, event.method_hint) {
                Transition::Noop => {
                    tracing::debug!(order_id = %order.id, current = %order.status, %target, "no-op event");
                    return Ok(ReconcileOutcome::Unchanged);
                }
                Transition::Apply {
                    status,
                    payment_method,
                } => (status, payment_method),
            };

        let patch = OrderPatch {
            status: Some(status),
            payment_method: Some(payment_method),
            gateway_payment_id: event.gateway_payment_id.clone(),
        };
        let Some(updated) = self.repo.update_order(order_id, patch).await? else {
            return Ok(ReconcileOutcome::NoMatchingOrder);
        };

        tracing::info!(
            order_id = %updated.id,
            from = %order.status,
            to = %updated.status,
            method = %updated.payment_method,
            "order reconciled"
        );

        let notified = if status == OrderStatus::Paid && order.status != OrderStatus::Paid {
            self.dispatch_notification(&updated).await
        } else {
            false
        };

        Ok(ReconcileOutcome::Updated {
            order: updated,
            notified,
        })
    }

    /// Dispatch failure is logged, never propagated: the webhook must
    /// still be acknowledged to the gateway.
    async fn dispatch_notification(&self, order: &Order) -> bool {
        match self.notifier.order_paid(order).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(order_id = %order.id, error = %e, "notification dispatch failed");
                false
            }
        }
    }
}
