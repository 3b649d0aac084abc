//! # Orders Gateways
//!
//! Outbound and inbound-normalizing adapters for the three payment
//! gateways, plus the notification dispatcher adapter.
//!
//! Each gateway adapter translates its gateway's native event shape into
//! a normalized [`orders_types::PaymentEvent`]. Adapters never touch the
//! repository; they only produce events (or a rejection) for the
//! reconciler.

pub mod aggregator;
pub mod card;
pub mod notify;
pub mod pix;
pub mod signature;

pub use aggregator::AggregatorClient;
pub use card::CardCheckoutAdapter;
pub use notify::WebhookNotifier;
pub use pix::PixClient;

/// Default timeout for blocking gateway network calls.
pub(crate) const GATEWAY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
