//! Stakeholder resource: people referenced by notes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use super::error::{ResourceError, ResourceResult};
use super::filters::{LIKE, fetch_rows_and_total, like_pattern};
use super::pagination::{Page, PageRequest};

/// Optional filters for the stakeholder list. Unrecognized keys are ignored.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct StakeholderFilters {
    /// Case-insensitive substring match on name and organization.
    pub search: Option<String>,
    /// Page number, 1-based.
    pub page: Option<Value>,
    /// Page size, clamped to 1..=100 (default 15).
    pub per_page: Option<Value>,
}

/// Flat projection of a stakeholder.
#[derive(Debug, Serialize)]
pub struct StakeholderSummary {
    pub id: i64,
    pub name: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub organization: Option<String>,
    pub note_count: i64,
}

/// Detail projection with linked note summaries.
#[derive(Debug, Serialize)]
pub struct StakeholderDetail {
    #[serde(flatten)]
    pub summary: StakeholderSummary,
    pub notes: Vec<StakeholderNote>,
}

#[derive(Debug, Serialize)]
pub struct StakeholderNote {
    pub id: i64,
    pub title: String,
    pub short_summary: Option<String>,
    pub updated_at: String,
}

/// Read-side resource over the `stakeholders` table.
pub struct StakeholderResource<'a> {
    pool: &'a SqlitePool,
}

const SUMMARY_COLUMNS: &str = "s.id, s.name, s.role, s.email, s.organization, \
     (SELECT COUNT(*) FROM note_stakeholder ns WHERE ns.stakeholder_id = s.id) AS note_count";

impl<'a> StakeholderResource<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filters: &StakeholderFilters,
    ) -> ResourceResult<Page<StakeholderSummary>> {
        let mut conditions = String::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(search) = &filters.search {
            conditions.push_str(&format!(" AND (s.name {LIKE} OR s.organization {LIKE})"));
            let pattern = like_pattern(search);
            binds.extend([pattern.clone(), pattern]);
        }

        let request = PageRequest::from_raw(filters.page.as_ref(), filters.per_page.as_ref());

        let select_sql = format!(
            "SELECT {SUMMARY_COLUMNS} FROM stakeholders s \
             WHERE 1 = 1{conditions} \
             ORDER BY s.name ASC, s.id ASC \
             LIMIT {} OFFSET {}",
            request.limit(),
            request.offset(),
        );
        let count_sql = format!("SELECT COUNT(*) FROM stakeholders s WHERE 1 = 1{conditions}");

        let (rows, total) =
            fetch_rows_and_total(self.pool, &select_sql, &count_sql, &binds).await?;
        let data = rows.iter().map(summary_from_row).collect();

        Ok(Page::new(data, &request, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ResourceResult<StakeholderDetail> {
        let sql = format!("SELECT {SUMMARY_COLUMNS} FROM stakeholders s WHERE s.id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(ResourceError::NotFound {
                resource: "stakeholder",
                id,
            })?;

        let notes = sqlx::query(
            "SELECT n.id, n.title, n.short_summary, n.updated_at \
             FROM notes n JOIN note_stakeholder ns ON ns.note_id = n.id \
             WHERE ns.stakeholder_id = ? \
             ORDER BY n.updated_at DESC, n.id DESC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .iter()
        .map(|r| StakeholderNote {
            id: r.get("id"),
            title: r.get("title"),
            short_summary: r.get("short_summary"),
            updated_at: r.get("updated_at"),
        })
        .collect();

        Ok(StakeholderDetail {
            summary: summary_from_row(&row),
            notes,
        })
    }
}

fn summary_from_row(row: &SqliteRow) -> StakeholderSummary {
    StakeholderSummary {
        id: row.get("id"),
        name: row.get("name"),
        role: row.get("role"),
        email: row.get("email"),
        organization: row.get("organization"),
        note_count: row.get("note_count"),
    }
}
