//! Project resource.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use crate::db::{ProjectStatus, TaskPriority, TaskStatus};

use super::error::{ResourceError, ResourceResult};
use super::filters::{LIKE, fetch_rows_and_total, like_pattern, parse_enum, push_eq, today};
use super::money::round2;
use super::pagination::{Page, PageRequest};

/// Optional filters for the project list. Unrecognized keys are ignored.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ProjectFilters {
    /// Filter by status (pending, in_progress, on_hold, completed, cancelled).
    pub status: Option<String>,
    /// Filter by owning client id.
    pub client_id: Option<i64>,
    /// Case-insensitive substring match on the project name.
    pub search: Option<String>,
    /// Page number, 1-based.
    pub page: Option<Value>,
    /// Page size, clamped to 1..=100 (default 15).
    pub per_page: Option<Value>,
}

/// Flat list projection of a project.
#[derive(Debug, Serialize)]
pub struct ProjectSummary {
    pub id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub name: String,
    pub status: ProjectStatus,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<f64>,
    pub task_count: i64,
    pub done_task_count: i64,
    pub progress_percent: f64,
    pub is_overdue: bool,
    pub created_at: String,
}

/// Detail projection with the project's tasks.
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub summary: ProjectSummary,
    pub description: Option<String>,
    pub tasks: Vec<ProjectTask>,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectTask {
    pub id: i64,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<String>,
}

/// Read-side resource over the `projects` table.
pub struct ProjectResource<'a> {
    pool: &'a SqlitePool,
}

const SUMMARY_COLUMNS: &str = "p.id, p.client_id, c.company_name AS client_name, p.name, \
     p.status, p.start_date, p.end_date, p.budget, p.created_at, \
     (SELECT COUNT(*) FROM tasks t WHERE t.project_id = p.id) AS task_count, \
     (SELECT COUNT(*) FROM tasks t WHERE t.project_id = p.id AND t.status = 'done') AS done_task_count";

impl<'a> ProjectResource<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filters: &ProjectFilters) -> ResourceResult<Page<ProjectSummary>> {
        let mut conditions = String::new();
        let mut binds: Vec<String> = Vec::new();

        push_eq(&mut conditions, &mut binds, "p.status", filters.status.clone());
        push_eq(
            &mut conditions,
            &mut binds,
            "p.client_id",
            filters.client_id.map(|id| id.to_string()),
        );

        if let Some(search) = &filters.search {
            conditions.push_str(&format!(" AND p.name {LIKE}"));
            binds.push(like_pattern(search));
        }

        let request = PageRequest::from_raw(filters.page.as_ref(), filters.per_page.as_ref());

        let select_sql = format!(
            "SELECT {SUMMARY_COLUMNS} \
             FROM projects p JOIN clients c ON c.id = p.client_id \
             WHERE 1 = 1{conditions} \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT {} OFFSET {}",
            request.limit(),
            request.offset(),
        );
        let count_sql = format!("SELECT COUNT(*) FROM projects p WHERE 1 = 1{conditions}");

        let (rows, total) =
            fetch_rows_and_total(self.pool, &select_sql, &count_sql, &binds).await?;
        let today = today();
        let data = rows.iter().map(|r| summary_from_row(r, &today)).collect();

        Ok(Page::new(data, &request, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ResourceResult<ProjectDetail> {
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS}, p.description, p.updated_at \
             FROM projects p JOIN clients c ON c.id = p.client_id \
             WHERE p.id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(ResourceError::NotFound {
                resource: "project",
                id,
            })?;

        let tasks = sqlx::query(
            "SELECT id, title, status, priority, due_date FROM tasks \
             WHERE project_id = ? \
             ORDER BY due_date IS NULL, due_date ASC, id ASC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .iter()
        .map(|r| ProjectTask {
            id: r.get("id"),
            title: r.get("title"),
            status: parse_enum(r, "status"),
            priority: parse_enum(r, "priority"),
            due_date: r.get("due_date"),
        })
        .collect();

        Ok(ProjectDetail {
            summary: summary_from_row(&row, &today()),
            description: row.get("description"),
            tasks,
            updated_at: row.get("updated_at"),
        })
    }
}

fn summary_from_row(row: &SqliteRow, today: &str) -> ProjectSummary {
    let status: ProjectStatus = parse_enum(row, "status");
    let end_date: Option<String> = row.get("end_date");
    let task_count: i64 = row.get("task_count");
    let done_task_count: i64 = row.get("done_task_count");

    let is_overdue = !matches!(status, ProjectStatus::Completed | ProjectStatus::Cancelled)
        && end_date.as_deref().is_some_and(|d| d < today);

    let progress_percent = if task_count == 0 {
        0.0
    } else {
        round2(done_task_count as f64 * 100.0 / task_count as f64)
    };

    ProjectSummary {
        id: row.get("id"),
        client_id: row.get("client_id"),
        client_name: row.get("client_name"),
        name: row.get("name"),
        status,
        start_date: row.get("start_date"),
        end_date,
        budget: row.get("budget"),
        task_count,
        done_task_count,
        progress_percent,
        is_overdue,
        created_at: row.get("created_at"),
    }
}
