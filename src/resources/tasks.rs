//! Task resource, including logged time.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use crate::db::{TaskPriority, TaskStatus};

use super::error::{ResourceError, ResourceResult};
use super::filters::{
    LIKE, fetch_rows_and_total, like_pattern, parse_enum, push_date_range, push_eq, today,
};
use super::pagination::{Page, PageRequest};

/// Optional filters for the task list. Unrecognized keys are ignored.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct TaskFilters {
    /// Filter by status (todo, in_progress, done).
    pub status: Option<String>,
    /// Filter by priority (low, medium, high, urgent).
    pub priority: Option<String>,
    /// Filter by owning project id.
    pub project_id: Option<i64>,
    /// Due date lower bound (YYYY-MM-DD, inclusive).
    pub due_from: Option<String>,
    /// Due date upper bound (YYYY-MM-DD, inclusive).
    pub due_to: Option<String>,
    /// Case-insensitive substring match on the task title.
    pub search: Option<String>,
    /// Page number, 1-based.
    pub page: Option<Value>,
    /// Page size, clamped to 1..=100 (default 15).
    pub per_page: Option<Value>,
}

/// Flat list projection of a task.
#[derive(Debug, Serialize)]
pub struct TaskSummary {
    pub id: i64,
    pub project_id: i64,
    pub project_name: String,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<String>,
    pub estimated_hours: Option<f64>,
    /// Hours logged against the task, summed over closed time entries.
    pub duration_hours: f64,
    pub is_overdue: bool,
    pub created_at: String,
}

/// Detail projection with the task's time entries.
#[derive(Debug, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub summary: TaskSummary,
    pub description: Option<String>,
    pub time_entries: Vec<TaskTimeEntry>,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct TaskTimeEntry {
    pub id: i64,
    pub description: Option<String>,
    pub started_at: String,
    pub ended_at: Option<String>,
    /// Elapsed hours for the entry; 0 while the entry is still open.
    pub duration_hours: f64,
}

/// Read-side resource over the `tasks` table.
pub struct TaskResource<'a> {
    pool: &'a SqlitePool,
}

const SUMMARY_COLUMNS: &str = "t.id, t.project_id, p.name AS project_name, t.title, t.status, \
     t.priority, t.due_date, t.estimated_hours, t.created_at, \
     COALESCE((SELECT ROUND(SUM((julianday(e.ended_at) - julianday(e.started_at)) * 24.0), 2) \
        FROM time_entries e WHERE e.task_id = t.id AND e.ended_at IS NOT NULL), 0.0) AS duration_hours";

impl<'a> TaskResource<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filters: &TaskFilters) -> ResourceResult<Page<TaskSummary>> {
        let mut conditions = String::new();
        let mut binds: Vec<String> = Vec::new();

        push_eq(&mut conditions, &mut binds, "t.status", filters.status.clone());
        push_eq(&mut conditions, &mut binds, "t.priority", filters.priority.clone());
        push_eq(
            &mut conditions,
            &mut binds,
            "t.project_id",
            filters.project_id.map(|id| id.to_string()),
        );
        push_date_range(
            &mut conditions,
            &mut binds,
            "t.due_date",
            filters.due_from.as_deref(),
            filters.due_to.as_deref(),
        );

        if let Some(search) = &filters.search {
            conditions.push_str(&format!(" AND t.title {LIKE}"));
            binds.push(like_pattern(search));
        }

        let request = PageRequest::from_raw(filters.page.as_ref(), filters.per_page.as_ref());

        let select_sql = format!(
            "SELECT {SUMMARY_COLUMNS} \
             FROM tasks t JOIN projects p ON p.id = t.project_id \
             WHERE 1 = 1{conditions} \
             ORDER BY t.due_date IS NULL, t.due_date ASC, t.id ASC \
             LIMIT {} OFFSET {}",
            request.limit(),
            request.offset(),
        );
        let count_sql = format!("SELECT COUNT(*) FROM tasks t WHERE 1 = 1{conditions}");

        let (rows, total) =
            fetch_rows_and_total(self.pool, &select_sql, &count_sql, &binds).await?;
        let today = today();
        let data = rows.iter().map(|r| summary_from_row(r, &today)).collect();

        Ok(Page::new(data, &request, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ResourceResult<TaskDetail> {
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS}, t.description, t.updated_at \
             FROM tasks t JOIN projects p ON p.id = t.project_id \
             WHERE t.id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(ResourceError::NotFound {
                resource: "task",
                id,
            })?;

        let time_entries = sqlx::query(
            "SELECT id, description, started_at, ended_at, \
                    CASE WHEN ended_at IS NULL THEN 0.0 \
                         ELSE ROUND((julianday(ended_at) - julianday(started_at)) * 24.0, 2) \
                    END AS duration_hours \
             FROM time_entries WHERE task_id = ? \
             ORDER BY started_at ASC, id ASC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .iter()
        .map(|r| TaskTimeEntry {
            id: r.get("id"),
            description: r.get("description"),
            started_at: r.get("started_at"),
            ended_at: r.get("ended_at"),
            duration_hours: r.get("duration_hours"),
        })
        .collect();

        Ok(TaskDetail {
            summary: summary_from_row(&row, &today()),
            description: row.get("description"),
            time_entries,
            updated_at: row.get("updated_at"),
        })
    }
}

fn summary_from_row(row: &SqliteRow, today: &str) -> TaskSummary {
    let status: TaskStatus = parse_enum(row, "status");
    let due_date: Option<String> = row.get("due_date");

    let is_overdue =
        status != TaskStatus::Done && due_date.as_deref().is_some_and(|d| d < today);

    TaskSummary {
        id: row.get("id"),
        project_id: row.get("project_id"),
        project_name: row.get("project_name"),
        title: row.get("title"),
        status,
        priority: parse_enum(row, "priority"),
        due_date,
        estimated_hours: row.get("estimated_hours"),
        duration_hours: row.get("duration_hours"),
        is_overdue,
        created_at: row.get("created_at"),
    }
}
