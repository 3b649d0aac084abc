//! # Orders Repository
//!
//! SQLite repository adapter for the order reconciliation service,
//! implementing the `OrderRepository` port.

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;
use uuid::Uuid;

use orders_types::{
    NewOrder, Order, OrderFilter, OrderId, OrderPatch, OrderRepository, OrderStats, OrderStatus,
    RepoError,
};

use crate::types::{DbOrder, DbRevenue, DbStatusCount};

mod types;

#[cfg(test)]
mod sqlite_tests;

const SELECT_ORDER: &str = r#"SELECT id, plan_id, description, status, payment_method, amount_cents,
       external_reference, gateway_payment_id, customer_name, customer_email,
       customer_phone, personalization, created_at, updated_at
  FROM orders"#;

/// SQLite repository implementation.
pub struct SqliteOrderRepo {
    pool: SqlitePool,
}

/// Build and initialize a repository from a database URL.
///
/// Connects, runs the migration, and returns a ready-to-use repo.
pub async fn build_repo(database_url: &str) -> anyhow::Result<SqliteOrderRepo> {
    SqliteOrderRepo::new(database_url).await
}

impl SqliteOrderRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let ddl = include_str!("../migrations/0001_create_orders.sql");
        sqlx::query(ddl).execute(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl OrderRepository for SqliteOrderRepo {
    async fn create_order(&self, new: NewOrder) -> Result<Order, RepoError> {
        if new.external_reference.trim().is_empty() {
            return Err(RepoError::Conflict("external reference must not be empty".into()));
        }

        let id = Uuid::new_v4();
        let now = chrono::Utc::now();
        let now_str = now.to_rfc3339();
        let personalization = new.personalization.to_string();

        sqlx::query(
            r#"INSERT INTO orders (id, plan_id, description, status, payment_method, amount_cents,
                                   external_reference, gateway_payment_id, customer_name,
                                   customer_email, customer_phone, personalization,
                                   created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(id.to_string())
        .bind(&new.plan_id)
        .bind(&new.description)
        .bind(new.status.as_ref())
        .bind(new.payment_method.as_ref())
        .bind(new.amount_cents)
        .bind(&new.external_reference)
        .bind(&new.customer_name)
        .bind(&new.customer_email)
        .bind(&new.customer_phone)
        .bind(&personalization)
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await
        .map_err(classify_sqlx_error)?;

        Ok(Order {
            id: OrderId::from_uuid(id),
            plan_id: new.plan_id,
            description: new.description,
            status: new.status,
            payment_method: new.payment_method,
            amount_cents: new.amount_cents,
            external_reference: new.external_reference,
            gateway_payment_id: None,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            customer_phone: new.customer_phone,
            personalization: new.personalization,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> = sqlx::query_as(&format!("{SELECT_ORDER} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;

        row.map(DbOrder::into_domain).transpose()
    }

    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("{SELECT_ORDER} WHERE external_reference = ?"))
                .bind(reference)
                .fetch_optional(&self.pool)
                .await
                .map_err(classify_sqlx_error)?;

        row.map(DbOrder::into_domain).transpose()
    }

    async fn find_by_gateway_payment_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("{SELECT_ORDER} WHERE gateway_payment_id = ?"))
                .bind(gateway_payment_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(classify_sqlx_error)?;

        row.map(DbOrder::into_domain).transpose()
    }

    async fn update_order(
        &self,
        id: OrderId,
        patch: OrderPatch,
    ) -> Result<Option<Order>, RepoError> {
        // COALESCE keeps the stored value for every unsupplied field, so
        // a single statement gives merge-patch semantics atomically per id.
        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"UPDATE orders
                  SET status = COALESCE(?, status),
                      payment_method = COALESCE(?, payment_method),
                      gateway_payment_id = COALESCE(?, gateway_payment_id),
                      updated_at = ?
                WHERE id = ?"#,
        )
        .bind(patch.status.map(|s| s.as_ref().to_string()))
        .bind(patch.payment_method.map(|m| m.as_ref().to_string()))
        .bind(patch.gateway_payment_id)
        .bind(&now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(classify_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_order(id).await
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, RepoError> {
        let status = filter.status.map(|s| s.as_ref().to_string());
        let method = filter.payment_method.map(|m| m.as_ref().to_string());

        let rows: Vec<DbOrder> = sqlx::query_as(&format!(
            r#"{SELECT_ORDER}
                WHERE (? IS NULL OR status = ?)
                  AND (? IS NULL OR payment_method = ?)
                ORDER BY created_at DESC"#
        ))
        .bind(&status)
        .bind(&status)
        .bind(&method)
        .bind(&method)
        .fetch_all(&self.pool)
        .await
        .map_err(classify_sqlx_error)?;

        rows.into_iter().map(DbOrder::into_domain).collect()
    }

    async fn order_stats(&self) -> Result<OrderStats, RepoError> {
        let counts: Vec<DbStatusCount> =
            sqlx::query_as(r#"SELECT status, COUNT(*) AS count FROM orders GROUP BY status"#)
                .fetch_all(&self.pool)
                .await
                .map_err(classify_sqlx_error)?;

        let revenue: DbRevenue = sqlx::query_as(
            r#"SELECT SUM(amount_cents) AS revenue_cents
                 FROM orders WHERE status IN ('paid', 'completed')"#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(classify_sqlx_error)?;

        let mut stats = OrderStats {
            total: 0,
            pending: 0,
            pending_pix: 0,
            paid: 0,
            completed: 0,
            cancelled: 0,
            revenue_cents: revenue.revenue_cents.unwrap_or(0),
        };

        for row in counts {
            let status: OrderStatus = row.status.parse().map_err(RepoError::Database)?;
            stats.total += row.count;
            match status {
                OrderStatus::Pending => stats.pending += row.count,
                OrderStatus::PendingPix => stats.pending_pix += row.count,
                OrderStatus::Paid => stats.paid += row.count,
                OrderStatus::Completed => stats.completed += row.count,
                OrderStatus::Cancelled => stats.cancelled += row.count,
            }
        }

        Ok(stats)
    }
}

fn classify_sqlx_error(err: sqlx::Error) -> RepoError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::Conflict("external reference already exists".into())
        }
        _ => RepoError::Database(err.to_string()),
    }
}
