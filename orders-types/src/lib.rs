//! # Orders Types
//!
//! Domain types and port traits for the order/payment reconciliation service.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Order, PaymentEvent, the status table)
//! - `guard/` - Input guard: sanitizer and field validators
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod guard;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    GatewayStatus, NewOrder, Order, OrderId, OrderPatch, OrderStatus, PaymentEvent, PaymentMethod,
    PlanPrice, PriceTable, Transition, plan_transition, target_status,
};
pub use dto::*;
pub use error::{AppError, DomainError, GatewayError, NotifyError, RepoError};
pub use ports::{ChargeGateway, NotificationDispatcher, OrderRepository};
