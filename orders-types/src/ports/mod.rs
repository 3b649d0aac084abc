//! Port traits implemented by the adapter crates.

pub mod gateway;
pub mod notify;
pub mod repository;

pub use gateway::ChargeGateway;
pub use notify::NotificationDispatcher;
pub use repository::OrderRepository;
