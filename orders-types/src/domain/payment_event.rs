//! Normalized payment events and the reconciliation state table.
//!
//! Every gateway adapter reduces its native webhook payload to a
//! [`PaymentEvent`]; the reconciler is the only consumer. The mapping
//! from gateway vocabulary to order status and the transition guard are
//! pure functions here so they can be tested exhaustively.

use serde::{Deserialize, Serialize};

use super::order::{OrderStatus, PaymentMethod};

/// Gateway-agnostic status vocabulary.
///
/// The superset of what the three gateways report. The card gateway only
/// ever produces `Approved`/`Pending`/`Cancelled`; the aggregator covers
/// the full set; the transfer gateway produces
/// `Pending`/`Approved`/`Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayStatus {
    Approved,
    Pending,
    InProcess,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
}

/// One normalized payment status notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// Correlation key generated by this system; primary resolution key
    pub external_reference: Option<String>,
    /// Identifier the gateway assigned to its own payment record
    pub gateway_payment_id: Option<String>,
    pub gateway_status: GatewayStatus,
    /// Which rail the gateway says was used; `Unknown` if it cannot tell
    pub method_hint: PaymentMethod,
}

/// The fixed status table: which order status a gateway status targets,
/// given the payment-method family of the event.
pub fn target_status(status: GatewayStatus, method_hint: PaymentMethod) -> OrderStatus {
    match status {
        GatewayStatus::Approved => OrderStatus::Paid,
        GatewayStatus::Pending | GatewayStatus::InProcess => match method_hint {
            PaymentMethod::Pix => OrderStatus::PendingPix,
            PaymentMethod::Card | PaymentMethod::Unknown => OrderStatus::Pending,
        },
        GatewayStatus::Rejected
        | GatewayStatus::Cancelled
        | GatewayStatus::Refunded
        | GatewayStatus::ChargedBack => OrderStatus::Cancelled,
    }
}

/// Outcome of the transition guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Pure no-op: no write, no notification
    Noop,
    /// Apply this merge-patch
    Apply {
        status: OrderStatus,
        payment_method: PaymentMethod,
    },
}

/// Decides whether a target status may be applied to an order.
///
/// Rules, in order:
/// 1. Terminal states are never overwritten. Later events targeting an
///    already-terminal order are accepted and ignored; this tolerates
///    gateway retry storms and out-of-order delivery.
/// 2. If the current status already equals the target and the payment
///    method is already known, the event is a duplicate: pure no-op.
/// 3. Otherwise apply, resolving the method from the hint when the hint
///    is concrete and keeping the recorded method when it is not.
pub fn plan_transition(
    current_status: OrderStatus,
    current_method: PaymentMethod,
    target: OrderStatus,
    method_hint: PaymentMethod,
) -> Transition {
    if current_status.is_terminal() {
        return Transition::Noop;
    }
    if current_status == target && current_method != PaymentMethod::Unknown {
        return Transition::Noop;
    }
    let payment_method = match method_hint {
        PaymentMethod::Unknown => current_method,
        concrete => concrete,
    };
    Transition::Apply {
        status: target,
        payment_method,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table_card_family() {
        assert_eq!(
            target_status(GatewayStatus::Approved, PaymentMethod::Card),
            OrderStatus::Paid
        );
        assert_eq!(
            target_status(GatewayStatus::Pending, PaymentMethod::Card),
            OrderStatus::Pending
        );
        assert_eq!(
            target_status(GatewayStatus::InProcess, PaymentMethod::Card),
            OrderStatus::Pending
        );
        assert_eq!(
            target_status(GatewayStatus::Rejected, PaymentMethod::Card),
            OrderStatus::Cancelled
        );
        assert_eq!(
            target_status(GatewayStatus::Cancelled, PaymentMethod::Card),
            OrderStatus::Cancelled
        );
        assert_eq!(
            target_status(GatewayStatus::Refunded, PaymentMethod::Card),
            OrderStatus::Cancelled
        );
        assert_eq!(
            target_status(GatewayStatus::ChargedBack, PaymentMethod::Card),
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn status_table_pix_family() {
        assert_eq!(
            target_status(GatewayStatus::Approved, PaymentMethod::Pix),
            OrderStatus::Paid
        );
        assert_eq!(
            target_status(GatewayStatus::Pending, PaymentMethod::Pix),
            OrderStatus::PendingPix
        );
        assert_eq!(
            target_status(GatewayStatus::InProcess, PaymentMethod::Pix),
            OrderStatus::PendingPix
        );
        assert_eq!(
            target_status(GatewayStatus::Rejected, PaymentMethod::Pix),
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn status_table_unknown_family_is_card_family() {
        assert_eq!(
            target_status(GatewayStatus::Pending, PaymentMethod::Unknown),
            OrderStatus::Pending
        );
    }

    #[test]
    fn duplicate_event_is_noop() {
        assert_eq!(
            plan_transition(
                OrderStatus::Pending,
                PaymentMethod::Card,
                OrderStatus::Pending,
                PaymentMethod::Card,
            ),
            Transition::Noop
        );
    }

    #[test]
    fn same_status_unknown_method_still_applies() {
        // The method was never confirmed, so the event carries new
        // information even though the status matches.
        assert_eq!(
            plan_transition(
                OrderStatus::Pending,
                PaymentMethod::Unknown,
                OrderStatus::Pending,
                PaymentMethod::Card,
            ),
            Transition::Apply {
                status: OrderStatus::Pending,
                payment_method: PaymentMethod::Card,
            }
        );
    }

    #[test]
    fn terminal_state_is_never_overwritten() {
        for terminal in [
            OrderStatus::Paid,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            for target in [OrderStatus::Paid, OrderStatus::Cancelled, OrderStatus::Pending] {
                assert_eq!(
                    plan_transition(terminal, PaymentMethod::Pix, target, PaymentMethod::Pix),
                    Transition::Noop,
                    "{terminal} must not transition to {target}"
                );
            }
        }
    }

    #[test]
    fn pending_to_paid_applies() {
        assert_eq!(
            plan_transition(
                OrderStatus::PendingPix,
                PaymentMethod::Unknown,
                OrderStatus::Paid,
                PaymentMethod::Pix,
            ),
            Transition::Apply {
                status: OrderStatus::Paid,
                payment_method: PaymentMethod::Pix,
            }
        );
    }

    #[test]
    fn unknown_hint_keeps_recorded_method() {
        assert_eq!(
            plan_transition(
                OrderStatus::Pending,
                PaymentMethod::Card,
                OrderStatus::Paid,
                PaymentMethod::Unknown,
            ),
            Transition::Apply {
                status: OrderStatus::Paid,
                payment_method: PaymentMethod::Card,
            }
        );
    }
}
