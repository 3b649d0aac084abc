//! HTTP server configuration and startup.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use orders_types::OrderRepository;

use super::auth::admin_auth_middleware;
use super::handlers::{self, AppState};
use super::rate_limit::{RateGuard, rate_limit_middleware};

/// HTTP server for the order reconciliation API.
pub struct HttpServer<R: OrderRepository> {
    state: Arc<AppState<R>>,
    guard: Arc<RateGuard>,
}

impl<R: OrderRepository> HttpServer<R> {
    pub fn new(state: Arc<AppState<R>>, guard: Arc<RateGuard>) -> Self {
        Self { state, guard }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/checkout/pix", post(handlers::create_pix_order::<R>))
            .route("/api/pix/status", get(handlers::pix_status::<R>))
            .route("/webhooks/card", post(handlers::card_webhook::<R>))
            .route(
                "/webhooks/aggregator",
                post(handlers::aggregator_webhook::<R>),
            )
            .route("/webhooks/pix", post(handlers::pix_webhook::<R>))
            .route("/api/orders", get(handlers::list_orders::<R>))
            .route("/api/orders/stats", get(handlers::order_stats::<R>))
            .route(
                "/api/orders/{id}",
                get(handlers::get_order::<R>).patch(handlers::patch_order::<R>),
            )
            .layer(middleware::from_fn_with_state(
                self.guard.clone(),
                rate_limit_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                admin_auth_middleware::<R>,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        // ConnectInfo feeds the rate limiter's per-client keying.
        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
