//! Domain models for the order reconciliation service.

pub mod order;
pub mod payment_event;
pub mod pricing;

pub use order::{NewOrder, Order, OrderId, OrderPatch, OrderStatus, PaymentMethod};
pub use payment_event::{GatewayStatus, PaymentEvent, Transition, plan_transition, target_status};
pub use pricing::{PlanPrice, PriceTable};
