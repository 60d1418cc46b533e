//! Social scheduling resources: platform connections and scheduled posts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use crate::db::{SocialPlatform, SocialPostStatus};

use super::error::{ResourceError, ResourceResult};
use super::filters::{fetch_rows_and_total, parse_enum, push_date_range, push_eq};
use super::pagination::{Page, PageRequest};

/// Optional filters for the connection list. Unrecognized keys are ignored.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct SocialConnectionFilters {
    /// Filter by platform (linkedin, twitter, facebook, instagram).
    pub platform: Option<String>,
    /// Filter on whether the connection is currently enabled.
    pub is_active: Option<bool>,
    /// Page number, 1-based.
    pub page: Option<Value>,
    /// Page size, clamped to 1..=100 (default 15).
    pub per_page: Option<Value>,
}

/// Optional filters for the scheduled post list. Unrecognized keys are ignored.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct SocialPostFilters {
    /// Filter by status (draft, scheduled, published, failed).
    pub status: Option<String>,
    /// Filter by platform of the owning connection.
    pub platform: Option<String>,
    /// Filter by connection id.
    pub connection_id: Option<i64>,
    /// Scheduled-for lower bound (YYYY-MM-DD HH:MM:SS, inclusive).
    pub scheduled_from: Option<String>,
    /// Scheduled-for upper bound (YYYY-MM-DD HH:MM:SS, inclusive).
    pub scheduled_to: Option<String>,
    /// Page number, 1-based.
    pub page: Option<Value>,
    /// Page size, clamped to 1..=100 (default 15).
    pub per_page: Option<Value>,
}

/// Flat projection of a platform connection.
#[derive(Debug, Serialize)]
pub struct SocialConnectionView {
    pub id: i64,
    pub platform: SocialPlatform,
    pub account_name: String,
    pub is_active: bool,
    pub connected_at: Option<String>,
    pub post_count: i64,
}

/// Flat projection of a scheduled post.
#[derive(Debug, Serialize)]
pub struct SocialPostView {
    pub id: i64,
    pub connection_id: Option<i64>,
    pub platform: Option<SocialPlatform>,
    pub account_name: Option<String>,
    pub content: String,
    pub status: SocialPostStatus,
    pub scheduled_for: Option<String>,
    pub published_at: Option<String>,
    pub error_message: Option<String>,
    /// Scheduled with a publish time already in the past.
    pub is_due: bool,
    pub created_at: String,
}

/// Read-side resource over the `social_connections` table.
pub struct SocialConnectionResource<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SocialConnectionResource<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filters: &SocialConnectionFilters,
    ) -> ResourceResult<Page<SocialConnectionView>> {
        let mut conditions = String::new();
        let mut binds: Vec<String> = Vec::new();

        push_eq(&mut conditions, &mut binds, "s.platform", filters.platform.clone());
        push_eq(
            &mut conditions,
            &mut binds,
            "s.is_active",
            filters.is_active.map(|b| if b { "1" } else { "0" }.to_string()),
        );

        let request = PageRequest::from_raw(filters.page.as_ref(), filters.per_page.as_ref());

        let select_sql = format!(
            "SELECT s.id, s.platform, s.account_name, s.is_active, s.connected_at, \
                    (SELECT COUNT(*) FROM social_posts p WHERE p.connection_id = s.id) AS post_count \
             FROM social_connections s \
             WHERE 1 = 1{conditions} \
             ORDER BY s.platform ASC, s.account_name ASC, s.id ASC \
             LIMIT {} OFFSET {}",
            request.limit(),
            request.offset(),
        );
        let count_sql = format!("SELECT COUNT(*) FROM social_connections s WHERE 1 = 1{conditions}");

        let (rows, total) =
            fetch_rows_and_total(self.pool, &select_sql, &count_sql, &binds).await?;
        let data = rows.iter().map(connection_from_row).collect();

        Ok(Page::new(data, &request, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ResourceResult<SocialConnectionView> {
        let row = sqlx::query(
            "SELECT s.id, s.platform, s.account_name, s.is_active, s.connected_at, \
                    (SELECT COUNT(*) FROM social_posts p WHERE p.connection_id = s.id) AS post_count \
             FROM social_connections s WHERE s.id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(ResourceError::NotFound {
            resource: "social_connection",
            id,
        })?;

        Ok(connection_from_row(&row))
    }
}

/// Read-side resource over the `social_posts` table.
pub struct SocialPostResource<'a> {
    pool: &'a SqlitePool,
}

const POST_COLUMNS: &str = "p.id, p.connection_id, s.platform, s.account_name, p.content, \
     p.status, p.scheduled_for, p.published_at, p.error_message, p.created_at";

impl<'a> SocialPostResource<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filters: &SocialPostFilters) -> ResourceResult<Page<SocialPostView>> {
        let mut conditions = String::new();
        let mut binds: Vec<String> = Vec::new();

        push_eq(&mut conditions, &mut binds, "p.status", filters.status.clone());
        push_eq(&mut conditions, &mut binds, "s.platform", filters.platform.clone());
        push_eq(
            &mut conditions,
            &mut binds,
            "p.connection_id",
            filters.connection_id.map(|id| id.to_string()),
        );
        push_date_range(
            &mut conditions,
            &mut binds,
            "p.scheduled_for",
            filters.scheduled_from.as_deref(),
            filters.scheduled_to.as_deref(),
        );

        let request = PageRequest::from_raw(filters.page.as_ref(), filters.per_page.as_ref());

        let select_sql = format!(
            "SELECT {POST_COLUMNS} \
             FROM social_posts p LEFT JOIN social_connections s ON s.id = p.connection_id \
             WHERE 1 = 1{conditions} \
             ORDER BY p.scheduled_for IS NULL, p.scheduled_for ASC, p.id ASC \
             LIMIT {} OFFSET {}",
            request.limit(),
            request.offset(),
        );
        let count_sql = format!(
            "SELECT COUNT(*) FROM social_posts p \
             LEFT JOIN social_connections s ON s.id = p.connection_id \
             WHERE 1 = 1{conditions}"
        );

        let (rows, total) =
            fetch_rows_and_total(self.pool, &select_sql, &count_sql, &binds).await?;
        let now = now_stamp();
        let data = rows.iter().map(|r| post_from_row(r, &now)).collect();

        Ok(Page::new(data, &request, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ResourceResult<SocialPostView> {
        let sql = format!(
            "SELECT {POST_COLUMNS} \
             FROM social_posts p LEFT JOIN social_connections s ON s.id = p.connection_id \
             WHERE p.id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(ResourceError::NotFound {
                resource: "social_post",
                id,
            })?;

        Ok(post_from_row(&row, &now_stamp()))
    }
}

fn now_stamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn connection_from_row(row: &SqliteRow) -> SocialConnectionView {
    SocialConnectionView {
        id: row.get("id"),
        platform: parse_enum(row, "platform"),
        account_name: row.get("account_name"),
        is_active: row.get("is_active"),
        connected_at: row.get("connected_at"),
        post_count: row.get("post_count"),
    }
}

fn post_from_row(row: &SqliteRow, now: &str) -> SocialPostView {
    let status: SocialPostStatus = parse_enum(row, "status");
    let scheduled_for: Option<String> = row.get("scheduled_for");
    let platform: Option<String> = row.get("platform");

    let is_due = status == SocialPostStatus::Scheduled
        && scheduled_for.as_deref().is_some_and(|t| t <= now);

    SocialPostView {
        id: row.get("id"),
        connection_id: row.get("connection_id"),
        platform: platform.and_then(|p| p.parse().ok()),
        account_name: row.get("account_name"),
        content: row.get("content"),
        status,
        scheduled_for,
        published_at: row.get("published_at"),
        error_message: row.get("error_message"),
        is_due,
        created_at: row.get("created_at"),
    }
}
