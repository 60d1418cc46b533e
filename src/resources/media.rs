//! Media library resource.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use super::error::{ResourceError, ResourceResult};
use super::filters::{LIKE, fetch_rows_and_total, like_pattern};
use super::pagination::{Page, PageRequest};

/// Optional filters for the media list. Unrecognized keys are ignored.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct MediaFilters {
    /// MIME type prefix, e.g. "image" or "application/pdf".
    pub r#type: Option<String>,
    /// Case-insensitive substring match on the file name.
    pub search: Option<String>,
    /// Page number, 1-based.
    pub page: Option<Value>,
    /// Page size, clamped to 1..=100 (default 15).
    pub per_page: Option<Value>,
}

/// Flat projection of a media record.
#[derive(Debug, Serialize)]
pub struct MediaView {
    pub id: i64,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub size_bytes: i64,
    pub size_human: String,
    pub path: String,
    pub created_at: String,
}

/// Read-side resource over the `media` table.
pub struct MediaResource<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MediaResource<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filters: &MediaFilters) -> ResourceResult<Page<MediaView>> {
        let mut conditions = String::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(mime) = &filters.r#type {
            conditions.push_str(&format!(" AND m.mime_type {LIKE}"));
            binds.push(format!("{}%", mime.replace('%', "\\%").replace('_', "\\_")));
        }
        if let Some(search) = &filters.search {
            conditions.push_str(&format!(" AND m.file_name {LIKE}"));
            binds.push(like_pattern(search));
        }

        let request = PageRequest::from_raw(filters.page.as_ref(), filters.per_page.as_ref());

        let select_sql = format!(
            "SELECT m.id, m.file_name, m.mime_type, m.size_bytes, m.path, m.created_at \
             FROM media m \
             WHERE 1 = 1{conditions} \
             ORDER BY m.created_at DESC, m.id DESC \
             LIMIT {} OFFSET {}",
            request.limit(),
            request.offset(),
        );
        let count_sql = format!("SELECT COUNT(*) FROM media m WHERE 1 = 1{conditions}");

        let (rows, total) =
            fetch_rows_and_total(self.pool, &select_sql, &count_sql, &binds).await?;
        let data = rows.iter().map(view_from_row).collect();

        Ok(Page::new(data, &request, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ResourceResult<MediaView> {
        let row = sqlx::query(
            "SELECT m.id, m.file_name, m.mime_type, m.size_bytes, m.path, m.created_at \
             FROM media m WHERE m.id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(ResourceError::NotFound {
            resource: "media",
            id,
        })?;

        Ok(view_from_row(&row))
    }
}

fn view_from_row(row: &SqliteRow) -> MediaView {
    let size_bytes: i64 = row.get("size_bytes");
    MediaView {
        id: row.get("id"),
        file_name: row.get("file_name"),
        mime_type: row.get("mime_type"),
        size_bytes,
        size_human: human_size(size_bytes),
        path: row.get("path"),
        created_at: row.get("created_at"),
    }
}

/// Render a byte count as a short human-readable string.
fn human_size(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes.max(0) as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes.max(0), UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::human_size;

    #[test]
    fn formats_byte_sizes() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }
}
