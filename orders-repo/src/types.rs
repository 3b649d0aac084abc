//! Database row types and domain conversion.

use sqlx::FromRow;

use orders_types::{Order, OrderId, OrderStatus, PaymentMethod, RepoError};

/// Order row from the database. SQLite stores uuids and timestamps as
/// text; conversion to domain types happens in `into_domain`.
#[derive(FromRow)]
pub struct DbOrder {
    pub id: String,
    pub plan_id: String,
    pub description: String,
    pub status: String,
    pub payment_method: String,
    pub amount_cents: i64,
    pub external_reference: String,
    pub gateway_payment_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub personalization: String,
    pub created_at: String,
    pub updated_at: String,
}

impl DbOrder {
    /// Convert database row to a domain Order.
    pub fn into_domain(self) -> Result<Order, RepoError> {
        let uuid =
            uuid::Uuid::parse_str(&self.id).map_err(|e| RepoError::Database(e.to_string()))?;
        let status: OrderStatus = self.status.parse().map_err(RepoError::Database)?;
        let payment_method: PaymentMethod =
            self.payment_method.parse().map_err(RepoError::Database)?;
        let personalization: serde_json::Value = serde_json::from_str(&self.personalization)
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let created_at = parse_rfc3339(&self.created_at)?;
        let updated_at = parse_rfc3339(&self.updated_at)?;

        Ok(Order {
            id: OrderId::from_uuid(uuid),
            plan_id: self.plan_id,
            description: self.description,
            status,
            payment_method,
            amount_cents: self.amount_cents,
            external_reference: self.external_reference,
            gateway_payment_id: self.gateway_payment_id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            personalization,
            created_at,
            updated_at,
        })
    }
}

/// Per-status count row for the stats query.
#[derive(FromRow)]
pub struct DbStatusCount {
    pub status: String,
    pub count: i64,
}

/// Revenue aggregate row.
#[derive(FromRow)]
pub struct DbRevenue {
    pub revenue_cents: Option<i64>,
}

pub fn parse_rfc3339(s: &str) -> Result<chrono::DateTime<chrono::Utc>, RepoError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| RepoError::Database(e.to_string()))
}
