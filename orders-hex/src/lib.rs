//! # Orders Hex
//!
//! Application service layer and HTTP adapter for the order
//! reconciliation service.
//!
//! ## Architecture
//!
//! - `service/` - Checkout initiation and admin reads
//! - `reconcile/` - The payment-event state machine
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! Both services are generic over `R: OrderRepository`, allowing
//! different repository implementations to be injected.

pub mod inbound;
pub mod reconcile;
pub mod service;


pub use reconcile::{ReconcileOutcome, Reconciler};
pub use service::CheckoutService;
