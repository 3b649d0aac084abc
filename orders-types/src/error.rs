//! Error types for the order reconciliation service.

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Unknown plan identifier: {0}")]
    UnknownPlan(String),

    #[error("Price table must not be empty")]
    EmptyPriceTable,

    #[error("Invalid price for plan {plan_id}: {amount_cents}")]
    InvalidPrice { plan_id: String, amount_cents: i64 },
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Entity not found")]
    NotFound,
}

/// Gateway adapter errors.
///
/// `Upstream` and `Timeout` are retryable (the gateway will redeliver);
/// they are never converted into a negative payment result.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Webhook signature verification failed")]
    InvalidSignature,

    #[error("Malformed gateway payload: {0}")]
    Malformed(String),

    #[error("Upstream gateway error: {0}")]
    Upstream(String),

    #[error("Upstream gateway timed out")]
    Timeout,

    #[error("Gateway is not configured")]
    Unconfigured,
}

/// Notification delivery failure. Logged by callers, never propagated
/// to a gateway transport response.
#[derive(Debug, thiserror::Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited; retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Upstream gateway failure: {0}")]
    UpstreamGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(DomainError::Validation(errors)) => AppError::Validation(errors),
            RepoError::Domain(DomainError::UnknownPlan(id)) => {
                AppError::Validation(vec![format!("unknown plan identifier: {id}")])
            }
            RepoError::Domain(e) => AppError::BadRequest(e.to_string()),
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::Conflict(e) => AppError::BadRequest(e),
            RepoError::Database(e) => AppError::Internal(e),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(errors) => AppError::Validation(errors),
            DomainError::UnknownPlan(id) => {
                AppError::Validation(vec![format!("unknown plan identifier: {id}")])
            }
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::InvalidSignature => AppError::InvalidSignature,
            GatewayError::Malformed(msg) => AppError::BadRequest(msg),
            GatewayError::Upstream(msg) => AppError::UpstreamGateway(msg),
            GatewayError::Timeout => AppError::UpstreamGateway("gateway timed out".into()),
            GatewayError::Unconfigured => AppError::UpstreamGateway("gateway not configured".into()),
        }
    }
}
