//! Shared fixtures for resource tests.
//!
//! The resource layer has no write path of its own, so tests seed rows
//! straight into the store.

use sqlx::SqlitePool;

use crate::db::SqliteDatabase;

/// Timestamp used for rows where the exact instant is irrelevant.
pub const STAMP: &str = "2025-06-01 09:00:00";

pub async fn setup_db() -> SqliteDatabase {
    let db = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create in-memory database");
    db.migrate().await.expect("Migration should succeed");
    db
}

pub async fn insert_client(pool: &SqlitePool, company: &str, status: &str) -> i64 {
    sqlx::query(
        "INSERT INTO clients (company_name, contact_name, email, status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(company)
    .bind(format!("{} contact", company))
    .bind(format!("billing@{}.test", company.to_lowercase().replace(' ', "-")))
    .bind(status)
    .bind(STAMP)
    .bind(STAMP)
    .execute(pool)
    .await
    .expect("insert client")
    .last_insert_rowid()
}

pub async fn insert_project(
    pool: &SqlitePool,
    client_id: i64,
    name: &str,
    status: &str,
    end_date: Option<&str>,
) -> i64 {
    sqlx::query(
        "INSERT INTO projects (client_id, name, status, end_date, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(client_id)
    .bind(name)
    .bind(status)
    .bind(end_date)
    .bind(STAMP)
    .bind(STAMP)
    .execute(pool)
    .await
    .expect("insert project")
    .last_insert_rowid()
}

pub async fn insert_task(
    pool: &SqlitePool,
    project_id: i64,
    title: &str,
    status: &str,
    due_date: Option<&str>,
) -> i64 {
    sqlx::query(
        "INSERT INTO tasks (project_id, title, status, due_date, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(project_id)
    .bind(title)
    .bind(status)
    .bind(due_date)
    .bind(STAMP)
    .bind(STAMP)
    .execute(pool)
    .await
    .expect("insert task")
    .last_insert_rowid()
}

pub async fn insert_time_entry(
    pool: &SqlitePool,
    task_id: i64,
    started_at: &str,
    ended_at: Option<&str>,
) -> i64 {
    sqlx::query("INSERT INTO time_entries (task_id, started_at, ended_at) VALUES (?, ?, ?)")
        .bind(task_id)
        .bind(started_at)
        .bind(ended_at)
        .execute(pool)
        .await
        .expect("insert time entry")
        .last_insert_rowid()
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_invoice(
    pool: &SqlitePool,
    client_id: i64,
    number: &str,
    status: &str,
    issue_date: &str,
    due_date: Option<&str>,
    paid_at: Option<&str>,
    amount_paid: f64,
) -> i64 {
    sqlx::query(
        "INSERT INTO invoices (client_id, number, status, issue_date, due_date, paid_at, \
             amount_paid, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(client_id)
    .bind(number)
    .bind(status)
    .bind(issue_date)
    .bind(due_date)
    .bind(paid_at)
    .bind(amount_paid)
    .bind(STAMP)
    .bind(STAMP)
    .execute(pool)
    .await
    .expect("insert invoice")
    .last_insert_rowid()
}

pub async fn insert_invoice_line(
    pool: &SqlitePool,
    invoice_id: i64,
    description: &str,
    quantity: f64,
    unit_price: f64,
    vat_rate: f64,
) -> i64 {
    sqlx::query(
        "INSERT INTO invoice_lines (invoice_id, description, quantity, unit_price, vat_rate) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(invoice_id)
    .bind(description)
    .bind(quantity)
    .bind(unit_price)
    .bind(vat_rate)
    .execute(pool)
    .await
    .expect("insert invoice line")
    .last_insert_rowid()
}

pub async fn insert_quote(
    pool: &SqlitePool,
    client_id: i64,
    number: &str,
    status: &str,
    issue_date: &str,
    valid_until: Option<&str>,
) -> i64 {
    sqlx::query(
        "INSERT INTO quotes (client_id, number, status, issue_date, valid_until, \
             created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(client_id)
    .bind(number)
    .bind(status)
    .bind(issue_date)
    .bind(valid_until)
    .bind(STAMP)
    .bind(STAMP)
    .execute(pool)
    .await
    .expect("insert quote")
    .last_insert_rowid()
}

pub async fn insert_quote_line(
    pool: &SqlitePool,
    quote_id: i64,
    description: &str,
    quantity: f64,
    unit_price: f64,
    vat_rate: f64,
) -> i64 {
    sqlx::query(
        "INSERT INTO quote_lines (quote_id, description, quantity, unit_price, vat_rate) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(quote_id)
    .bind(description)
    .bind(quantity)
    .bind(unit_price)
    .bind(vat_rate)
    .execute(pool)
    .await
    .expect("insert quote line")
    .last_insert_rowid()
}

pub async fn insert_catalog_category(pool: &SqlitePool, name: &str) -> i64 {
    sqlx::query("INSERT INTO catalog_categories (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await
        .expect("insert catalog category")
        .last_insert_rowid()
}

pub async fn insert_catalog_item(
    pool: &SqlitePool,
    category_id: Option<i64>,
    name: &str,
    unit_price: f64,
    is_active: bool,
) -> i64 {
    sqlx::query(
        "INSERT INTO catalog_items (category_id, name, unit_price, is_active) VALUES (?, ?, ?, ?)",
    )
    .bind(category_id)
    .bind(name)
    .bind(unit_price)
    .bind(is_active)
    .execute(pool)
    .await
    .expect("insert catalog item")
    .last_insert_rowid()
}

pub async fn insert_note(
    pool: &SqlitePool,
    parent_id: Option<i64>,
    title: &str,
    short_summary: Option<&str>,
    body: Option<&str>,
    scopes: &[&str],
) -> i64 {
    let scopes_json = serde_json::to_string(scopes).expect("serialize scopes");
    sqlx::query(
        "INSERT INTO notes (parent_id, title, short_summary, body, scopes, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(parent_id)
    .bind(title)
    .bind(short_summary)
    .bind(body)
    .bind(scopes_json)
    .bind(STAMP)
    .bind(STAMP)
    .execute(pool)
    .await
    .expect("insert note")
    .last_insert_rowid()
}

/// Rewire a note's parent after insertion; used to build cyclic fixtures.
pub async fn set_note_parent(pool: &SqlitePool, note_id: i64, parent_id: Option<i64>) {
    sqlx::query("UPDATE notes SET parent_id = ? WHERE id = ?")
        .bind(parent_id)
        .bind(note_id)
        .execute(pool)
        .await
        .expect("update note parent");
}

pub async fn insert_stakeholder(pool: &SqlitePool, name: &str, organization: Option<&str>) -> i64 {
    sqlx::query("INSERT INTO stakeholders (name, organization) VALUES (?, ?)")
        .bind(name)
        .bind(organization)
        .execute(pool)
        .await
        .expect("insert stakeholder")
        .last_insert_rowid()
}

pub async fn link_note_stakeholder(pool: &SqlitePool, note_id: i64, stakeholder_id: i64) {
    sqlx::query("INSERT INTO note_stakeholder (note_id, stakeholder_id) VALUES (?, ?)")
        .bind(note_id)
        .bind(stakeholder_id)
        .execute(pool)
        .await
        .expect("link note stakeholder");
}

pub async fn insert_category(pool: &SqlitePool, name: &str, slug: &str) -> i64 {
    sqlx::query("INSERT INTO categories (name, slug) VALUES (?, ?)")
        .bind(name)
        .bind(slug)
        .execute(pool)
        .await
        .expect("insert category")
        .last_insert_rowid()
}

pub async fn insert_tag(pool: &SqlitePool, name: &str, slug: &str) -> i64 {
    sqlx::query("INSERT INTO tags (name, slug) VALUES (?, ?)")
        .bind(name)
        .bind(slug)
        .execute(pool)
        .await
        .expect("insert tag")
        .last_insert_rowid()
}

pub async fn insert_post(
    pool: &SqlitePool,
    category_id: Option<i64>,
    title: &str,
    slug: &str,
    status: &str,
    published_at: Option<&str>,
) -> i64 {
    sqlx::query(
        "INSERT INTO posts (category_id, title, slug, status, published_at, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(category_id)
    .bind(title)
    .bind(slug)
    .bind(status)
    .bind(published_at)
    .bind(STAMP)
    .bind(STAMP)
    .execute(pool)
    .await
    .expect("insert post")
    .last_insert_rowid()
}

pub async fn link_post_tag(pool: &SqlitePool, post_id: i64, tag_id: i64) {
    sqlx::query("INSERT INTO post_tag (post_id, tag_id) VALUES (?, ?)")
        .bind(post_id)
        .bind(tag_id)
        .execute(pool)
        .await
        .expect("link post tag");
}

pub async fn insert_media(pool: &SqlitePool, file_name: &str, mime: &str, size: i64) -> i64 {
    sqlx::query(
        "INSERT INTO media (file_name, mime_type, size_bytes, path, created_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(file_name)
    .bind(mime)
    .bind(size)
    .bind(format!("uploads/{}", file_name))
    .bind(STAMP)
    .execute(pool)
    .await
    .expect("insert media")
    .last_insert_rowid()
}

pub async fn insert_social_connection(
    pool: &SqlitePool,
    platform: &str,
    account_name: &str,
    is_active: bool,
) -> i64 {
    sqlx::query(
        "INSERT INTO social_connections (platform, account_name, is_active, connected_at) \
         VALUES (?, ?, ?, ?)",
    )
    .bind(platform)
    .bind(account_name)
    .bind(is_active)
    .bind(STAMP)
    .execute(pool)
    .await
    .expect("insert social connection")
    .last_insert_rowid()
}

pub async fn insert_social_post(
    pool: &SqlitePool,
    connection_id: Option<i64>,
    content: &str,
    status: &str,
    scheduled_for: Option<&str>,
) -> i64 {
    sqlx::query(
        "INSERT INTO social_posts (connection_id, content, status, scheduled_for, \
             created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(connection_id)
    .bind(content)
    .bind(status)
    .bind(scheduled_for)
    .bind(STAMP)
    .bind(STAMP)
    .execute(pool)
    .await
    .expect("insert social post")
    .last_insert_rowid()
}
