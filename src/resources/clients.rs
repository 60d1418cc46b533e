//! Client resource: read projections over the CRM client book.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use sqlx::sqlite::SqliteRow;
use tracing::instrument;

use crate::db::{ClientStatus, InvoiceStatus, ProjectStatus, QuoteStatus, TaskStatus};

use super::error::{ResourceError, ResourceResult};
use super::filters::{LIKE, fetch_rows_and_total, like_pattern, parse_enum, push_eq};
use super::pagination::{Page, PageRequest};

/// Optional filters for the client list. Unrecognized keys are ignored.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ClientFilters {
    /// Filter by lifecycle status (lead, active, inactive).
    pub status: Option<String>,
    /// Case-insensitive substring match on company name, contact name, and email.
    pub search: Option<String>,
    /// Page number, 1-based.
    pub page: Option<Value>,
    /// Page size, clamped to 1..=100 (default 15).
    pub per_page: Option<Value>,
}

/// Flat list projection of a client.
#[derive(Debug, Serialize)]
pub struct ClientSummary {
    pub id: i64,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub status: ClientStatus,
    pub project_count: i64,
    pub invoice_count: i64,
    pub created_at: String,
}

/// Detail projection with related collections.
#[derive(Debug, Serialize)]
pub struct ClientDetail {
    pub id: i64,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub status: ClientStatus,
    pub notes: Option<String>,
    pub project_count: i64,
    pub task_count: i64,
    pub quote_count: i64,
    pub invoice_count: i64,
    pub projects: Vec<ClientProject>,
    pub quotes: Vec<ClientQuote>,
    pub invoices: Vec<ClientInvoice>,
    pub tasks: Vec<ClientTask>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct ClientProject {
    pub id: i64,
    pub name: String,
    pub status: ProjectStatus,
}

#[derive(Debug, Serialize)]
pub struct ClientQuote {
    pub id: i64,
    pub number: String,
    pub status: QuoteStatus,
    pub total_ttc: f64,
}

#[derive(Debug, Serialize)]
pub struct ClientInvoice {
    pub id: i64,
    pub number: String,
    pub status: InvoiceStatus,
    pub total_ttc: f64,
    pub due_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClientTask {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub status: TaskStatus,
    pub due_date: Option<String>,
}

/// Read-side resource over the `clients` table.
pub struct ClientResource<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ClientResource<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filters: &ClientFilters) -> ResourceResult<Page<ClientSummary>> {
        let mut conditions = String::new();
        let mut binds: Vec<String> = Vec::new();

        push_eq(&mut conditions, &mut binds, "c.status", filters.status.clone());

        if let Some(search) = &filters.search {
            conditions.push_str(&format!(
                " AND (c.company_name {LIKE} OR c.contact_name {LIKE} OR c.email {LIKE})"
            ));
            let pattern = like_pattern(search);
            binds.extend([pattern.clone(), pattern.clone(), pattern]);
        }

        let request = PageRequest::from_raw(filters.page.as_ref(), filters.per_page.as_ref());

        let select_sql = format!(
            "SELECT c.id, c.company_name, c.contact_name, c.email, c.phone, c.city, \
                    c.status, c.created_at, \
                    (SELECT COUNT(*) FROM projects p WHERE p.client_id = c.id) AS project_count, \
                    (SELECT COUNT(*) FROM invoices i WHERE i.client_id = c.id) AS invoice_count \
             FROM clients c \
             WHERE 1 = 1{conditions} \
             ORDER BY c.company_name ASC, c.id ASC \
             LIMIT {} OFFSET {}",
            request.limit(),
            request.offset(),
        );
        let count_sql = format!("SELECT COUNT(*) FROM clients c WHERE 1 = 1{conditions}");

        let (rows, total) =
            fetch_rows_and_total(self.pool, &select_sql, &count_sql, &binds).await?;
        let data = rows.iter().map(summary_from_row).collect();

        Ok(Page::new(data, &request, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ResourceResult<ClientDetail> {
        let row = sqlx::query(
            "SELECT id, company_name, contact_name, email, phone, address, city, \
                    postal_code, country, status, notes, created_at, updated_at \
             FROM clients WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(ResourceError::NotFound {
            resource: "client",
            id,
        })?;

        let projects = sqlx::query(
            "SELECT id, name, status FROM projects \
             WHERE client_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .iter()
        .map(|r| ClientProject {
            id: r.get("id"),
            name: r.get("name"),
            status: parse_enum(r, "status"),
        })
        .collect::<Vec<_>>();

        let quotes = sqlx::query(
            "SELECT q.id, q.number, q.status, \
                    COALESCE((SELECT SUM(ROUND(l.quantity * l.unit_price, 2) \
                        + ROUND(l.quantity * l.unit_price * l.vat_rate / 100.0, 2)) \
                        FROM quote_lines l WHERE l.quote_id = q.id), 0.0) AS total_ttc \
             FROM quotes q WHERE q.client_id = ? \
             ORDER BY q.issue_date DESC, q.id DESC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .iter()
        .map(|r| ClientQuote {
            id: r.get("id"),
            number: r.get("number"),
            status: parse_enum(r, "status"),
            total_ttc: r.get("total_ttc"),
        })
        .collect::<Vec<_>>();

        let invoices = sqlx::query(
            "SELECT i.id, i.number, i.status, i.due_date, \
                    COALESCE((SELECT SUM(ROUND(l.quantity * l.unit_price, 2) \
                        + ROUND(l.quantity * l.unit_price * l.vat_rate / 100.0, 2)) \
                        FROM invoice_lines l WHERE l.invoice_id = i.id), 0.0) AS total_ttc \
             FROM invoices i WHERE i.client_id = ? \
             ORDER BY i.issue_date DESC, i.id DESC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .iter()
        .map(|r| ClientInvoice {
            id: r.get("id"),
            number: r.get("number"),
            status: parse_enum(r, "status"),
            total_ttc: r.get("total_ttc"),
            due_date: r.get("due_date"),
        })
        .collect::<Vec<_>>();

        let tasks = sqlx::query(
            "SELECT t.id, t.project_id, t.title, t.status, t.due_date \
             FROM tasks t JOIN projects p ON p.id = t.project_id \
             WHERE p.client_id = ? \
             ORDER BY t.due_date IS NULL, t.due_date ASC, t.id ASC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .iter()
        .map(|r| ClientTask {
            id: r.get("id"),
            project_id: r.get("project_id"),
            title: r.get("title"),
            status: parse_enum(r, "status"),
            due_date: r.get("due_date"),
        })
        .collect::<Vec<_>>();

        Ok(ClientDetail {
            id: row.get("id"),
            company_name: row.get("company_name"),
            contact_name: row.get("contact_name"),
            email: row.get("email"),
            phone: row.get("phone"),
            address: row.get("address"),
            city: row.get("city"),
            postal_code: row.get("postal_code"),
            country: row.get("country"),
            status: parse_enum(&row, "status"),
            notes: row.get("notes"),
            project_count: projects.len() as i64,
            task_count: tasks.len() as i64,
            quote_count: quotes.len() as i64,
            invoice_count: invoices.len() as i64,
            projects,
            quotes,
            invoices,
            tasks,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

fn summary_from_row(row: &SqliteRow) -> ClientSummary {
    ClientSummary {
        id: row.get("id"),
        company_name: row.get("company_name"),
        contact_name: row.get("contact_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        city: row.get("city"),
        status: parse_enum(row, "status"),
        project_count: row.get("project_count"),
        invoice_count: row.get("invoice_count"),
        created_at: row.get("created_at"),
    }
}

