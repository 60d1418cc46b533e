//! Blog post resource.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use crate::db::PostStatus;

use super::error::{ResourceError, ResourceResult};
use super::filters::{LIKE, fetch_rows_and_total, like_pattern, parse_enum, push_eq};
use super::pagination::{Page, PageRequest};

/// Optional filters for the post list. Unrecognized keys are ignored.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct PostFilters {
    /// Filter by status (draft, published).
    pub status: Option<String>,
    /// Filter by blog category id.
    pub category_id: Option<i64>,
    /// Filter by tag id.
    pub tag_id: Option<i64>,
    /// Case-insensitive substring match on title and excerpt.
    pub search: Option<String>,
    /// Page number, 1-based.
    pub page: Option<Value>,
    /// Page size, clamped to 1..=100 (default 15).
    pub per_page: Option<Value>,
}

/// Flat list projection of a post.
#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub status: PostStatus,
    pub is_published: bool,
    pub published_at: Option<String>,
    pub created_at: String,
}

/// Detail projection with body and tags.
#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub summary: PostSummary,
    pub body: Option<String>,
    pub tags: Vec<PostTag>,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct PostTag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Read-side resource over the `posts` table.
pub struct PostResource<'a> {
    pool: &'a SqlitePool,
}

const SUMMARY_COLUMNS: &str = "p.id, p.category_id, c.name AS category_name, p.title, p.slug, \
     p.excerpt, p.status, p.published_at, p.created_at";

impl<'a> PostResource<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filters: &PostFilters) -> ResourceResult<Page<PostSummary>> {
        let mut conditions = String::new();
        let mut binds: Vec<String> = Vec::new();

        push_eq(&mut conditions, &mut binds, "p.status", filters.status.clone());
        push_eq(
            &mut conditions,
            &mut binds,
            "p.category_id",
            filters.category_id.map(|id| id.to_string()),
        );

        if let Some(tag_id) = filters.tag_id {
            conditions.push_str(
                " AND EXISTS (SELECT 1 FROM post_tag pt WHERE pt.post_id = p.id AND pt.tag_id = ?)",
            );
            binds.push(tag_id.to_string());
        }

        if let Some(search) = &filters.search {
            conditions.push_str(&format!(" AND (p.title {LIKE} OR p.excerpt {LIKE})"));
            let pattern = like_pattern(search);
            binds.extend([pattern.clone(), pattern]);
        }

        let request = PageRequest::from_raw(filters.page.as_ref(), filters.per_page.as_ref());

        let select_sql = format!(
            "SELECT {SUMMARY_COLUMNS} \
             FROM posts p LEFT JOIN categories c ON c.id = p.category_id \
             WHERE 1 = 1{conditions} \
             ORDER BY p.published_at IS NULL, p.published_at DESC, p.id DESC \
             LIMIT {} OFFSET {}",
            request.limit(),
            request.offset(),
        );
        let count_sql = format!("SELECT COUNT(*) FROM posts p WHERE 1 = 1{conditions}");

        let (rows, total) =
            fetch_rows_and_total(self.pool, &select_sql, &count_sql, &binds).await?;
        let data = rows.iter().map(summary_from_row).collect();

        Ok(Page::new(data, &request, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ResourceResult<PostDetail> {
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS}, p.body, p.updated_at \
             FROM posts p LEFT JOIN categories c ON c.id = p.category_id \
             WHERE p.id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(ResourceError::NotFound {
                resource: "post",
                id,
            })?;

        let tags = sqlx::query(
            "SELECT t.id, t.name, t.slug \
             FROM tags t JOIN post_tag pt ON pt.tag_id = t.id \
             WHERE pt.post_id = ? \
             ORDER BY t.name ASC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .iter()
        .map(|r| PostTag {
            id: r.get("id"),
            name: r.get("name"),
            slug: r.get("slug"),
        })
        .collect();

        Ok(PostDetail {
            summary: summary_from_row(&row),
            body: row.get("body"),
            tags,
            updated_at: row.get("updated_at"),
        })
    }
}

fn summary_from_row(row: &SqliteRow) -> PostSummary {
    let status: PostStatus = parse_enum(row, "status");
    PostSummary {
        id: row.get("id"),
        category_id: row.get("category_id"),
        category_name: row.get("category_name"),
        title: row.get("title"),
        slug: row.get("slug"),
        excerpt: row.get("excerpt"),
        status,
        is_published: status == PostStatus::Published,
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
    }
}
