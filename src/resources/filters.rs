//! Shared query-building helpers for the resource modules.
//!
//! Each resource assembles its WHERE clause as SQL text plus an ordered list
//! of string binds; SQLite's column affinity converts numeric binds on
//! comparison, so one bind type covers ids, dates, and status values alike.

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteRow;

/// LIKE pattern for a case-insensitive substring match.
///
/// `%` and `_` in caller input are escaped so they match literally.
pub fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

/// SQL fragment for a LIKE with the escape character used by `like_pattern`.
pub const LIKE: &str = "LIKE ? ESCAPE '\\'";

/// Today's date as `YYYY-MM-DD`, the only ambient input to derived fields.
pub fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Current month as `YYYY-MM`.
pub fn this_month() -> String {
    chrono::Utc::now().format("%Y-%m").to_string()
}

/// Parse an enumerated column, falling back to the enum default on
/// unexpected store values.
pub fn parse_enum<S>(row: &SqliteRow, column: &str) -> S
where
    S: std::str::FromStr + Default,
{
    use sqlx::Row;
    row.get::<String, _>(column).parse().unwrap_or_default()
}

/// Run a filtered SELECT and its matching COUNT with the same binds.
///
/// The caller appends ORDER BY / LIMIT to `select_sql` only; `count_sql`
/// shares the WHERE clause so `total` reflects the filtered set before
/// paging.
pub async fn fetch_rows_and_total(
    pool: &SqlitePool,
    select_sql: &str,
    count_sql: &str,
    binds: &[String],
) -> Result<(Vec<SqliteRow>, i64), sqlx::Error> {
    let mut query = sqlx::query(select_sql);
    for bind in binds {
        query = query.bind(bind);
    }
    let rows = query.fetch_all(pool).await?;

    let mut count = sqlx::query_scalar::<_, i64>(count_sql);
    for bind in binds {
        count = count.bind(bind);
    }
    let total = count.fetch_one(pool).await?;

    Ok((rows, total))
}

/// Push an equality condition and its bind when the filter is present.
pub fn push_eq(
    conditions: &mut String,
    binds: &mut Vec<String>,
    column: &str,
    value: Option<String>,
) {
    if let Some(value) = value {
        conditions.push_str(&format!(" AND {} = ?", column));
        binds.push(value);
    }
}

/// Push an inclusive date-range condition (`from`/`to` both optional).
pub fn push_date_range(
    conditions: &mut String,
    binds: &mut Vec<String>,
    column: &str,
    from: Option<&str>,
    to: Option<&str>,
) {
    if let Some(from) = from {
        conditions.push_str(&format!(" AND {} >= ?", column));
        binds.push(from.to_string());
    }
    if let Some(to) = to {
        conditions.push_str(&format!(" AND {} <= ?", column));
        binds.push(to.to_string());
    }
}
