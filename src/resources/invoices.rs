//! Invoice resource.
//!
//! Totals are never stored: HT, VAT, and TTC amounts are recomputed from the
//! lines on every read, in SQL for list pages and in Rust for details.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use crate::db::InvoiceStatus;

use super::error::{ResourceError, ResourceResult};
use super::filters::{
    LIKE, fetch_rows_and_total, like_pattern, parse_enum, push_date_range, push_eq, today,
};
use super::money::{LineTotals, round2};
use super::pagination::{Page, PageRequest};

/// Optional filters for the invoice list. Unrecognized keys are ignored.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct InvoiceFilters {
    /// Filter by status (draft, sent, paid, overdue, cancelled).
    pub status: Option<String>,
    /// Filter by billed client id.
    pub client_id: Option<i64>,
    /// Issue date lower bound (YYYY-MM-DD, inclusive).
    pub issued_from: Option<String>,
    /// Issue date upper bound (YYYY-MM-DD, inclusive).
    pub issued_to: Option<String>,
    /// Case-insensitive substring match on the invoice number.
    pub search: Option<String>,
    /// Page number, 1-based.
    pub page: Option<Value>,
    /// Page size, clamped to 1..=100 (default 15).
    pub per_page: Option<Value>,
}

/// Flat list projection of an invoice.
#[derive(Debug, Serialize)]
pub struct InvoiceSummary {
    pub id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub number: String,
    pub status: InvoiceStatus,
    pub issue_date: String,
    pub due_date: Option<String>,
    pub total_ht: f64,
    pub total_vat: f64,
    pub total_ttc: f64,
    pub amount_paid: f64,
    pub amount_due: f64,
    pub is_overdue: bool,
    pub created_at: String,
}

/// Detail projection with ordered lines.
#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub summary: InvoiceSummary,
    pub quote_id: Option<i64>,
    pub paid_at: Option<String>,
    pub lines: Vec<InvoiceLineView>,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct InvoiceLineView {
    pub id: i64,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub vat_rate: f64,
    pub total_ht: f64,
    pub total_vat: f64,
    pub total_ttc: f64,
}

/// Read-side resource over the `invoices` table.
pub struct InvoiceResource<'a> {
    pool: &'a SqlitePool,
}

const SUMMARY_COLUMNS: &str = "i.id, i.client_id, c.company_name AS client_name, i.number, \
     i.status, i.issue_date, i.due_date, i.amount_paid, i.created_at, \
     COALESCE((SELECT SUM(ROUND(l.quantity * l.unit_price, 2)) \
        FROM invoice_lines l WHERE l.invoice_id = i.id), 0.0) AS total_ht, \
     COALESCE((SELECT SUM(ROUND(l.quantity * l.unit_price * l.vat_rate / 100.0, 2)) \
        FROM invoice_lines l WHERE l.invoice_id = i.id), 0.0) AS total_vat";

impl<'a> InvoiceResource<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filters: &InvoiceFilters) -> ResourceResult<Page<InvoiceSummary>> {
        let mut conditions = String::new();
        let mut binds: Vec<String> = Vec::new();

        push_eq(&mut conditions, &mut binds, "i.status", filters.status.clone());
        push_eq(
            &mut conditions,
            &mut binds,
            "i.client_id",
            filters.client_id.map(|id| id.to_string()),
        );
        push_date_range(
            &mut conditions,
            &mut binds,
            "i.issue_date",
            filters.issued_from.as_deref(),
            filters.issued_to.as_deref(),
        );

        if let Some(search) = &filters.search {
            conditions.push_str(&format!(" AND i.number {LIKE}"));
            binds.push(like_pattern(search));
        }

        let request = PageRequest::from_raw(filters.page.as_ref(), filters.per_page.as_ref());

        let select_sql = format!(
            "SELECT {SUMMARY_COLUMNS} \
             FROM invoices i JOIN clients c ON c.id = i.client_id \
             WHERE 1 = 1{conditions} \
             ORDER BY i.issue_date DESC, i.id DESC \
             LIMIT {} OFFSET {}",
            request.limit(),
            request.offset(),
        );
        let count_sql = format!("SELECT COUNT(*) FROM invoices i WHERE 1 = 1{conditions}");

        let (rows, total) =
            fetch_rows_and_total(self.pool, &select_sql, &count_sql, &binds).await?;
        let today = today();
        let data = rows.iter().map(|r| summary_from_row(r, &today)).collect();

        Ok(Page::new(data, &request, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ResourceResult<InvoiceDetail> {
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS}, i.quote_id, i.paid_at, i.updated_at \
             FROM invoices i JOIN clients c ON c.id = i.client_id \
             WHERE i.id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(ResourceError::NotFound {
                resource: "invoice",
                id,
            })?;

        let lines = sqlx::query(
            "SELECT id, description, quantity, unit_price, vat_rate \
             FROM invoice_lines WHERE invoice_id = ? \
             ORDER BY position ASC, id ASC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .iter()
        .map(line_from_row)
        .collect();

        Ok(InvoiceDetail {
            summary: summary_from_row(&row, &today()),
            quote_id: row.get("quote_id"),
            paid_at: row.get("paid_at"),
            lines,
            updated_at: row.get("updated_at"),
        })
    }
}

fn line_from_row(row: &SqliteRow) -> InvoiceLineView {
    let quantity: f64 = row.get("quantity");
    let unit_price: f64 = row.get("unit_price");
    let vat_rate: f64 = row.get("vat_rate");
    let totals = LineTotals::compute(quantity, unit_price, vat_rate);

    InvoiceLineView {
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

fn summary_from_row(row: &SqliteRow, today: &str) -> InvoiceSummary {
    let status: InvoiceStatus = parse_enum(row, "status");
    let due_date: Option<String> = row.get("due_date");
    let total_ht: f64 = row.get("total_ht");
    let total_vat: f64 = row.get("total_vat");
    let amount_paid: f64 = row.get("amount_paid");

    let total_ttc = round2(total_ht + total_vat);
    let amount_due = round2(total_ttc - amount_paid);

    let is_overdue = matches!(status, InvoiceStatus::Sent | InvoiceStatus::Overdue)
        && due_date.as_deref().is_some_and(|d| d < today);

    InvoiceSummary {
        id: row.get("id"),
        client_id: row.get("client_id"),
        client_name: row.get("client_name"),
        number: row.get("number"),
        status,
        issue_date: row.get("issue_date"),
        due_date,
        total_ht: round2(total_ht),
        total_vat: round2(total_vat),
        total_ttc,
        amount_paid,
        amount_due,
        is_overdue,
        created_at: row.get("created_at"),
    }
}
