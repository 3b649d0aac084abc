//! # Orders Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository adapter
//! - Construct the gateway adapters that have credentials
//! - Start the HTTP server

mod config;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orders_gateways::{AggregatorClient, CardCheckoutAdapter, PixClient, WebhookNotifier};
use orders_hex::{
    CheckoutService, Reconciler,
    inbound::{AppState, HttpServer, RateGuard},
};
use orders_repo::build_repo;
use orders_types::ChargeGateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,orders_app=debug,orders_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting orders server on port {}", config.port);
    tracing::info!("Using database: {}", config.database_url);
    tracing::info!("Price table entries: {}", config.price_table.len());

    // Build repository (handles connection and migration)
    let repo = Arc::new(build_repo(&config.database_url).await?);

    // Gateways without credentials stay disabled.
    let transfers: Option<Arc<dyn ChargeGateway>> = match &config.transfers {
        Some(t) => Some(Arc::new(PixClient::new(
            &t.base_url,
            &t.client_id,
            &t.client_secret,
        )?)),
        None => {
            tracing::warn!("transfer gateway credentials absent, pix checkout disabled");
            None
        }
    };

    let aggregator = match &config.aggregator {
        Some(a) => Some(AggregatorClient::new(&a.base_url, &a.api_token)?),
        None => {
            tracing::warn!("aggregator credentials absent, aggregator webhooks disabled");
            None
        }
    };

    if config.notify_url.is_none() {
        tracing::warn!("NOTIFY_URL absent, paid-order notifications disabled");
    }
    let notifier = Arc::new(WebhookNotifier::new(config.notify_url.clone())?);

    let state = Arc::new(AppState {
        checkout: CheckoutService::new(repo.clone(), config.price_table.clone(), transfers),
        reconciler: Reconciler::new(repo, notifier),
        card: CardCheckoutAdapter::new(&config.card_webhook_secret),
        aggregator,
        admin_token: config.admin_token.clone(),
    });

    let guard = Arc::new(RateGuard::new(
        config.rate_limit_max,
        Duration::from_secs(config.rate_limit_window_secs),
        config.trust_proxy_header,
    ));

    // Create and run the HTTP server
    let server = HttpServer::new(state, guard);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    Ok(())
}
