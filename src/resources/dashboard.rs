//! Cross-entity dashboard snapshot.

use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use super::error::ResourceResult;
use super::filters::{this_month, today};
use super::money::round2;

/// Aggregated counters for the landing dashboard, recomputed per read.
#[derive(Debug, Serialize)]
pub struct DashboardSnapshot {
    pub active_clients: i64,
    pub open_projects: i64,
    pub tasks_due_this_week: i64,
    pub overdue_tasks: i64,
    pub outstanding_invoices: MoneyBucket,
    pub overdue_invoices: i64,
    pub paid_this_month: f64,
    pub pending_quotes: MoneyBucket,
    pub scheduled_social_posts: i64,
    pub latest_post: Option<LatestPost>,
}

#[derive(Debug, Serialize)]
pub struct MoneyBucket {
    pub count: i64,
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct LatestPost {
    pub id: i64,
    pub title: String,
    pub published_at: Option<String>,
}

/// Read-side resource assembling the dashboard.
pub struct DashboardResource<'a> {
    pool: &'a SqlitePool,
}

const INVOICE_TTC: &str = "COALESCE((SELECT SUM(ROUND(l.quantity * l.unit_price, 2) \
    + ROUND(l.quantity * l.unit_price * l.vat_rate / 100.0, 2)) \
    FROM invoice_lines l WHERE l.invoice_id = i.id), 0.0)";

const QUOTE_TTC: &str = "COALESCE((SELECT SUM(ROUND(l.quantity * l.unit_price, 2) \
    + ROUND(l.quantity * l.unit_price * l.vat_rate / 100.0, 2)) \
    FROM quote_lines l WHERE l.quote_id = q.id), 0.0)";

impl<'a> DashboardResource<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn snapshot(&self) -> ResourceResult<DashboardSnapshot> {
        let today = today();
        let week_end = (chrono::Utc::now() + chrono::Duration::days(7))
            .format("%Y-%m-%d")
            .to_string();

        let active_clients: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM clients WHERE status = 'active'")
                .fetch_one(self.pool)
                .await?;

        let open_projects: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM projects \
             WHERE status IN ('pending', 'in_progress', 'on_hold')",
        )
        .fetch_one(self.pool)
        .await?;

        let tasks_due_this_week: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks \
             WHERE status != 'done' AND due_date >= ? AND due_date <= ?",
        )
        .bind(&today)
        .bind(&week_end)
        .fetch_one(self.pool)
        .await?;

        let overdue_tasks: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE status != 'done' AND due_date < ?",
        )
        .bind(&today)
        .fetch_one(self.pool)
        .await?;

        let row = sqlx::query(&format!(
            "SELECT COUNT(*) AS n, COALESCE(SUM({INVOICE_TTC} - i.amount_paid), 0.0) AS amount \
             FROM invoices i WHERE i.status IN ('sent', 'overdue')"
        ))
        .fetch_one(self.pool)
        .await?;
        let outstanding_invoices = MoneyBucket {
            count: row.get("n"),
            amount: round2(row.get("amount")),
        };

        let overdue_invoices: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM invoices i \
             WHERE i.status IN ('sent', 'overdue') AND i.due_date < ?",
        )
        .bind(&today)
        .fetch_one(self.pool)
        .await?;

        let paid_this_month: f64 = sqlx::query_scalar(&format!(
            "SELECT COALESCE(SUM({INVOICE_TTC}), 0.0) FROM invoices i \
             WHERE i.status = 'paid' AND substr(i.paid_at, 1, 7) = ?"
        ))
        .bind(this_month())
        .fetch_one(self.pool)
        .await?;

        let row = sqlx::query(&format!(
            "SELECT COUNT(*) AS n, COALESCE(SUM({QUOTE_TTC}), 0.0) AS amount \
             FROM quotes q WHERE q.status = 'sent'"
        ))
        .fetch_one(self.pool)
        .await?;
        let pending_quotes = MoneyBucket {
            count: row.get("n"),
            amount: round2(row.get("amount")),
        };

        let scheduled_social_posts: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM social_posts WHERE status = 'scheduled'")
                .fetch_one(self.pool)
                .await?;

        let latest_post = sqlx::query(
            "SELECT id, title, published_at FROM posts \
             WHERE status = 'published' \
             ORDER BY published_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(self.pool)
        .await?
        .map(|r| LatestPost {
            id: r.get("id"),
            title: r.get("title"),
            published_at: r.get("published_at"),
        });

        Ok(DashboardSnapshot {
            active_clients,
            open_projects,
            tasks_due_this_week,
            overdue_tasks,
            outstanding_invoices,
            overdue_invoices,
            paid_this_month: round2(paid_this_month),
            pending_quotes,
            scheduled_social_posts,
            latest_post,
        })
    }
}
