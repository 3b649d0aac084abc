//! Configuration loading from environment.
//!
//! Credentials for the payment rails are intentionally optional:
//! deployments run with whichever gateways they have contracts for, and
//! an unconfigured gateway disables its feature instead of aborting
//! startup. Secrets that guard inbound surfaces are mandatory.

use std::collections::HashMap;
use std::env;
use std::fs;

use orders_types::{PlanPrice, PriceTable};

/// Credentials for the regional aggregator gateway.
pub struct AggregatorConfig {
    pub base_url: String,
    pub api_token: String,
}

/// Credentials for the real-time transfer gateway.
pub struct TransferConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
}

/// Application configuration.
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub price_table: PriceTable,
    pub card_webhook_secret: String,
    pub admin_token: String,
    pub aggregator: Option<AggregatorConfig>,
    pub transfers: Option<TransferConfig>,
    pub notify_url: Option<String>,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    pub trust_proxy_header: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;

        let database_url = required("DATABASE_URL")?;
        let card_webhook_secret = required("CARD_WEBHOOK_SECRET")?;
        let admin_token = required("ADMIN_TOKEN")?;

        let price_table_path = required("PRICE_TABLE_PATH")?;
        let price_table = load_price_table(&price_table_path)?;

        let aggregator = match (
            env::var("AGGREGATOR_BASE_URL").ok(),
            env::var("AGGREGATOR_API_TOKEN").ok(),
        ) {
            (Some(base_url), Some(api_token)) => Some(AggregatorConfig {
                base_url,
                api_token,
            }),
            (None, None) => None,
            _ => anyhow::bail!(
                "AGGREGATOR_BASE_URL and AGGREGATOR_API_TOKEN must be set together"
            ),
        };

        let transfers = match (
            env::var("PIX_BASE_URL").ok(),
            env::var("PIX_CLIENT_ID").ok(),
            env::var("PIX_CLIENT_SECRET").ok(),
        ) {
            (Some(base_url), Some(client_id), Some(client_secret)) => Some(TransferConfig {
                base_url,
                client_id,
                client_secret,
            }),
            (None, None, None) => None,
            _ => anyhow::bail!(
                "PIX_BASE_URL, PIX_CLIENT_ID and PIX_CLIENT_SECRET must be set together"
            ),
        };

        let notify_url = env::var("NOTIFY_URL").ok();

        let rate_limit_max = env::var("RATE_LIMIT_MAX")
            .unwrap_or_else(|_| "5".to_string())
            .parse()?;
        let rate_limit_window_secs = env::var("RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()?;
        // Only deployments behind a proxy that overwrites the header
        // should enable this.
        let trust_proxy_header = env::var("TRUST_PROXY_HEADER")
            .unwrap_or_else(|_| "false".to_string())
            .parse()?;

        Ok(Self {
            port,
            database_url,
            price_table,
            card_webhook_secret,
            admin_token,
            aggregator,
            transfers,
            notify_url,
            rate_limit_max,
            rate_limit_window_secs,
            trust_proxy_header,
        })
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).map_err(|_| anyhow::anyhow!("{name} environment variable is required"))
}

fn load_price_table(path: &str) -> anyhow::Result<PriceTable> {
    let raw = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read price table at {path}: {e}"))?;
    // Deserializing through the raw map re-runs the table invariants
    // (non-empty, positive prices) against operator-supplied JSON.
    let plans: HashMap<String, PlanPrice> = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("price table at {path} is not valid JSON: {e}"))?;
    Ok(PriceTable::new(plans)?)
}
