//! Quote resource. Line math mirrors invoices.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use crate::db::QuoteStatus;

use super::error::{ResourceError, ResourceResult};
use super::filters::{LIKE, fetch_rows_and_total, like_pattern, parse_enum, push_eq, today};
use super::money::{LineTotals, round2};
use super::pagination::{Page, PageRequest};

/// Optional filters for the quote list. Unrecognized keys are ignored.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct QuoteFilters {
    /// Filter by status (draft, sent, accepted, rejected, expired).
    pub status: Option<String>,
    /// Filter by client id.
    pub client_id: Option<i64>,
    /// Case-insensitive substring match on the quote number.
    pub search: Option<String>,
    /// Page number, 1-based.
    pub page: Option<Value>,
    /// Page size, clamped to 1..=100 (default 15).
    pub per_page: Option<Value>,
}

/// Flat list projection of a quote.
#[derive(Debug, Serialize)]
pub struct QuoteSummary {
    pub id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub number: String,
    pub status: QuoteStatus,
    pub issue_date: String,
    pub valid_until: Option<String>,
    pub total_ht: f64,
    pub total_vat: f64,
    pub total_ttc: f64,
    /// Past its validity date without having been accepted or rejected.
    pub is_expired: bool,
    pub created_at: String,
}

/// Detail projection with ordered lines.
#[derive(Debug, Serialize)]
pub struct QuoteDetail {
    #[serde(flatten)]
    pub summary: QuoteSummary,
    pub lines: Vec<QuoteLineView>,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct QuoteLineView {
    pub id: i64,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub vat_rate: f64,
    pub total_ht: f64,
    pub total_vat: f64,
    pub total_ttc: f64,
}

/// Read-side resource over the `quotes` table.
pub struct QuoteResource<'a> {
    pool: &'a SqlitePool,
}

const SUMMARY_COLUMNS: &str = "q.id, q.client_id, c.company_name AS client_name, q.number, \
     q.status, q.issue_date, q.valid_until, q.created_at, \
     COALESCE((SELECT SUM(ROUND(l.quantity * l.unit_price, 2)) \
        FROM quote_lines l WHERE l.quote_id = q.id), 0.0) AS total_ht, \
     COALESCE((SELECT SUM(ROUND(l.quantity * l.unit_price * l.vat_rate / 100.0, 2)) \
        FROM quote_lines l WHERE l.quote_id = q.id), 0.0) AS total_vat";

impl<'a> QuoteResource<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filters: &QuoteFilters) -> ResourceResult<Page<QuoteSummary>> {
        let mut conditions = String::new();
        let mut binds: Vec<String> = Vec::new();

        push_eq(&mut conditions, &mut binds, "q.status", filters.status.clone());
        push_eq(
            &mut conditions,
            &mut binds,
            "q.client_id",
            filters.client_id.map(|id| id.to_string()),
        );

        if let Some(search) = &filters.search {
            conditions.push_str(&format!(" AND q.number {LIKE}"));
            binds.push(like_pattern(search));
        }

        let request = PageRequest::from_raw(filters.page.as_ref(), filters.per_page.as_ref());

        let select_sql = format!(
            "SELECT {SUMMARY_COLUMNS} \
             FROM quotes q JOIN clients c ON c.id = q.client_id \
             WHERE 1 = 1{conditions} \
             ORDER BY q.issue_date DESC, q.id DESC \
             LIMIT {} OFFSET {}",
            request.limit(),
            request.offset(),
        );
        let count_sql = format!("SELECT COUNT(*) FROM quotes q WHERE 1 = 1{conditions}");

        let (rows, total) =
            fetch_rows_and_total(self.pool, &select_sql, &count_sql, &binds).await?;
        let today = today();
        let data = rows.iter().map(|r| summary_from_row(r, &today)).collect();

        Ok(Page::new(data, &request, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ResourceResult<QuoteDetail> {
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS}, q.updated_at \
             FROM quotes q JOIN clients c ON c.id = q.client_id \
             WHERE q.id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(ResourceError::NotFound {
                resource: "quote",
                id,
            })?;

        let lines = sqlx::query(
            "SELECT id, description, quantity, unit_price, vat_rate \
             FROM quote_lines WHERE quote_id = ? \
             ORDER BY position ASC, id ASC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .iter()
        .map(line_from_row)
        .collect();

        Ok(QuoteDetail {
            summary: summary_from_row(&row, &today()),
            lines,
            updated_at: row.get("updated_at"),
        })
    }
}

fn line_from_row(row: &SqliteRow) -> QuoteLineView {
    let quantity: f64 = row.get("quantity");
    let unit_price: f64 = row.get("unit_price");
    let vat_rate: f64 = row.get("vat_rate");
    let totals = LineTotals::compute(quantity, unit_price, vat_rate);

    QuoteLineView {
        id: row.get("id"),
        description: row.get("description"),
        quantity,
        unit_price,
        vat_rate,
        total_ht: totals.total_ht,
        total_vat: totals.total_vat,
        total_ttc: totals.total_ttc,
    }
}

fn summary_from_row(row: &SqliteRow, today: &str) -> QuoteSummary {
    let status: QuoteStatus = parse_enum(row, "status");
    let valid_until: Option<String> = row.get("valid_until");
    let total_ht: f64 = row.get("total_ht");
    let total_vat: f64 = row.get("total_vat");

    let is_expired = !matches!(status, QuoteStatus::Accepted | QuoteStatus::Rejected)
        && valid_until.as_deref().is_some_and(|d| d < today);

    QuoteSummary {
        id: row.get("id"),
        client_id: row.get("client_id"),
        client_name: row.get("client_name"),
        number: row.get("number"),
        status,
        issue_date: row.get("issue_date"),
        valid_until,
        total_ht: round2(total_ht),
        total_vat: round2(total_vat),
        total_ttc: round2(total_ht + total_vat),
        is_expired,
        created_at: row.get("created_at"),
    }
}
