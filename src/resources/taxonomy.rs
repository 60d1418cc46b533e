//! Blog taxonomy resources: tags and categories.
//!
//! The two are structurally identical, so they share one filter type and one
//! projection shape; only the table and join differ.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use crate::db::PostStatus;

use super::error::{ResourceError, ResourceResult};
use super::filters::{LIKE, fetch_rows_and_total, like_pattern, parse_enum};
use super::pagination::{Page, PageRequest};

/// Optional filters for tag and category lists. Unrecognized keys are ignored.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct TaxonomyFilters {
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
    /// Page number, 1-based.
    pub page: Option<Value>,
    /// Page size, clamped to 1..=100 (default 15).
    pub per_page: Option<Value>,
}

/// Flat projection of a tag or category.
#[derive(Debug, Serialize)]
pub struct TermView {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub post_count: i64,
}

/// Detail projection with the term's posts.
#[derive(Debug, Serialize)]
pub struct TermDetail {
    #[serde(flatten)]
    pub term: TermView,
    pub posts: Vec<TermPost>,
}

#[derive(Debug, Serialize)]
pub struct TermPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub status: PostStatus,
    pub published_at: Option<String>,
}

/// Read-side resource over the `tags` table.
pub struct TagResource<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TagResource<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filters: &TaxonomyFilters) -> ResourceResult<Page<TermView>> {
        list_terms(
            self.pool,
            filters,
            "tags",
            "(SELECT COUNT(*) FROM post_tag pt WHERE pt.tag_id = x.id)",
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ResourceResult<TermDetail> {
        let term = get_term(
            self.pool,
            id,
            "tags",
            "(SELECT COUNT(*) FROM post_tag pt WHERE pt.tag_id = x.id)",
            "tag",
        )
        .await?;

        let posts = sqlx::query(
            "SELECT p.id, p.title, p.slug, p.status, p.published_at \
             FROM posts p JOIN post_tag pt ON pt.post_id = p.id \
             WHERE pt.tag_id = ? \
             ORDER BY p.published_at IS NULL, p.published_at DESC, p.id DESC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .iter()
        .map(post_from_row)
        .collect();

        Ok(TermDetail { term, posts })
    }
}

/// Read-side resource over the blog `categories` table.
pub struct CategoryResource<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CategoryResource<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filters: &TaxonomyFilters) -> ResourceResult<Page<TermView>> {
        list_terms(
            self.pool,
            filters,
            "categories",
            "(SELECT COUNT(*) FROM posts p WHERE p.category_id = x.id)",
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ResourceResult<TermDetail> {
        let term = get_term(
            self.pool,
            id,
            "categories",
            "(SELECT COUNT(*) FROM posts p WHERE p.category_id = x.id)",
            "category",
        )
        .await?;

        let posts = sqlx::query(
            "SELECT p.id, p.title, p.slug, p.status, p.published_at \
             FROM posts p WHERE p.category_id = ? \
             ORDER BY p.published_at IS NULL, p.published_at DESC, p.id DESC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .iter()
        .map(post_from_row)
        .collect();

        Ok(TermDetail { term, posts })
    }
}

async fn list_terms(
    pool: &SqlitePool,
    filters: &TaxonomyFilters,
    table: &str,
    count_expr: &str,
) -> ResourceResult<Page<TermView>> {
    let mut conditions = String::new();
    let mut binds: Vec<String> = Vec::new();

    if let Some(search) = &filters.search {
        conditions.push_str(&format!(" AND x.name {LIKE}"));
        binds.push(like_pattern(search));
    }

    let request = PageRequest::from_raw(filters.page.as_ref(), filters.per_page.as_ref());

    let select_sql = format!(
        "SELECT x.id, x.name, x.slug, {count_expr} AS post_count \
         FROM {table} x \
         WHERE 1 = 1{conditions} \
         ORDER BY x.name ASC, x.id ASC \
         LIMIT {} OFFSET {}",
        request.limit(),
        request.offset(),
    );
    let count_sql = format!("SELECT COUNT(*) FROM {table} x WHERE 1 = 1{conditions}");

    let (rows, total) = fetch_rows_and_total(pool, &select_sql, &count_sql, &binds).await?;
    let data = rows.iter().map(term_from_row).collect();

    Ok(Page::new(data, &request, total))
}

async fn get_term(
    pool: &SqlitePool,
    id: i64,
    table: &str,
    count_expr: &str,
    resource: &'static str,
) -> ResourceResult<TermView> {
    let sql = format!(
        "SELECT x.id, x.name, x.slug, {count_expr} AS post_count FROM {table} x WHERE x.id = ?"
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ResourceError::NotFound { resource, id })?;

    Ok(term_from_row(&row))
}

fn term_from_row(row: &SqliteRow) -> TermView {
    TermView {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        post_count: row.get("post_count"),
    }
}

fn post_from_row(row: &SqliteRow) -> TermPost {
    TermPost {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        status: parse_enum(row, "status"),
        published_at: row.get("published_at"),
    }
}
