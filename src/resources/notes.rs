//! Note resource: hierarchical notes with scopes, stakeholders, full-text
//! search with match snippets, and bounded tree traversal.

use std::collections::{BTreeMap, HashMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use super::error::{ResourceError, ResourceResult};
use super::filters::{LIKE, fetch_rows_and_total, like_pattern, push_date_range};
use super::pagination::{Page, PageRequest};

/// Maximum nesting depth returned by tree traversal, cycles included.
pub const MAX_TREE_DEPTH: i64 = 5;

/// Hard cap on search results.
pub const SEARCH_LIMIT: i64 = 50;

/// Characters of context kept on each side of a search match.
const SNIPPET_RADIUS: usize = 40;

/// Optional filters for the note list. Unrecognized keys are ignored.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoteFilters {
    /// Keep only notes carrying this scope label.
    pub scope: Option<String>,
    /// Keep only notes linked to this stakeholder.
    pub stakeholder_id: Option<i64>,
    /// Creation date lower bound (YYYY-MM-DD, inclusive).
    pub created_from: Option<String>,
    /// Creation date upper bound (YYYY-MM-DD, inclusive).
    pub created_to: Option<String>,
    /// Case-insensitive substring match on title, summary, and body.
    pub search: Option<String>,
    /// Page number, 1-based.
    pub page: Option<Value>,
    /// Page size, clamped to 1..=100 (default 15).
    pub per_page: Option<Value>,
}

/// Filters for note search. `query` is required; the rest narrow the result.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoteSearchFilters {
    /// Substring to look for (case-insensitive) in title, summary, and body.
    pub query: String,
    /// Keep only notes carrying this scope label.
    pub scope: Option<String>,
    /// Keep only notes linked to this stakeholder.
    pub stakeholder_id: Option<i64>,
    /// Creation date lower bound (YYYY-MM-DD, inclusive).
    pub created_from: Option<String>,
    /// Creation date upper bound (YYYY-MM-DD, inclusive).
    pub created_to: Option<String>,
}

/// Flat list projection of a note.
#[derive(Debug, Serialize)]
pub struct NoteSummary {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub title: String,
    pub short_summary: Option<String>,
    pub scopes: Vec<String>,
    pub child_count: i64,
    pub stakeholder_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Detail projection with body, children, and stakeholders.
#[derive(Debug, Serialize)]
pub struct NoteDetail {
    #[serde(flatten)]
    pub summary: NoteSummary,
    pub body: Option<String>,
    pub children: Vec<NoteChild>,
    pub stakeholders: Vec<NoteStakeholderRef>,
}

#[derive(Debug, Serialize)]
pub struct NoteChild {
    pub id: i64,
    pub title: String,
    pub short_summary: Option<String>,
    pub child_count: i64,
}

#[derive(Debug, Serialize)]
pub struct NoteStakeholderRef {
    pub id: i64,
    pub name: String,
    pub role: Option<String>,
}

/// One search result with per-field context snippets.
#[derive(Debug, Serialize)]
pub struct NoteSearchHit {
    pub id: i64,
    pub title: String,
    /// Snippet per matched field, keyed by field name; only fields that
    /// actually contain the query appear.
    pub match_context: BTreeMap<&'static str, String>,
    pub updated_at: String,
}

/// One node of the note tree.
#[derive(Debug, Serialize)]
pub struct NoteTreeNode {
    pub id: i64,
    pub title: String,
    pub depth: i64,
    pub child_count: i64,
    pub children: Vec<NoteTreeNode>,
}

/// Read-side resource over the `notes` table.
pub struct NoteResource<'a> {
    pool: &'a SqlitePool,
}

const SUMMARY_COLUMNS: &str = "n.id, n.parent_id, n.title, n.short_summary, n.scopes, \
     n.created_at, n.updated_at, \
     (SELECT COUNT(*) FROM notes k WHERE k.parent_id = n.id) AS child_count, \
     (SELECT COUNT(*) FROM note_stakeholder ns WHERE ns.note_id = n.id) AS stakeholder_count";

impl<'a> NoteResource<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filters: &NoteFilters) -> ResourceResult<Page<NoteSummary>> {
        let mut conditions = String::new();
        let mut binds: Vec<String> = Vec::new();

        push_common_filters(
            &mut conditions,
            &mut binds,
            filters.scope.as_deref(),
            filters.stakeholder_id,
            filters.created_from.as_deref(),
            filters.created_to.as_deref(),
        );

        if let Some(search) = &filters.search {
            conditions.push_str(&format!(
                " AND (n.title {LIKE} OR n.short_summary {LIKE} OR n.body {LIKE})"
            ));
            let pattern = like_pattern(search);
            binds.extend([pattern.clone(), pattern.clone(), pattern]);
        }

        let request = PageRequest::from_raw(filters.page.as_ref(), filters.per_page.as_ref());

        let select_sql = format!(
            "SELECT {SUMMARY_COLUMNS} FROM notes n \
             WHERE 1 = 1{conditions} \
             ORDER BY n.updated_at DESC, n.id DESC \
             LIMIT {} OFFSET {}",
            request.limit(),
            request.offset(),
        );
        let count_sql = format!("SELECT COUNT(*) FROM notes n WHERE 1 = 1{conditions}");

        let (rows, total) =
            fetch_rows_and_total(self.pool, &select_sql, &count_sql, &binds).await?;
        let data = rows.iter().map(summary_from_row).collect();

        Ok(Page::new(data, &request, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ResourceResult<NoteDetail> {
        let sql = format!("SELECT {SUMMARY_COLUMNS}, n.body FROM notes n WHERE n.id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(ResourceError::NotFound {
                resource: "note",
                id,
            })?;

        let children = self.children_of(id).await?;

        let stakeholders = sqlx::query(
            "SELECT s.id, s.name, s.role \
             FROM stakeholders s JOIN note_stakeholder ns ON ns.stakeholder_id = s.id \
             WHERE ns.note_id = ? \
             ORDER BY s.name ASC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .iter()
        .map(|r| NoteStakeholderRef {
            id: r.get("id"),
            name: r.get("name"),
            role: r.get("role"),
        })
        .collect();

        Ok(NoteDetail {
            summary: summary_from_row(&row),
            body: row.get("body"),
            children,
            stakeholders,
        })
    }

    /// Case-insensitive substring search across title, summary, and body,
    /// capped at [`SEARCH_LIMIT`] results, each annotated with a context
    /// snippet per matched field.
    #[instrument(skip(self))]
    pub async fn search(&self, filters: &NoteSearchFilters) -> ResourceResult<Vec<NoteSearchHit>> {
        let query = filters.query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut conditions = String::new();
        let mut binds: Vec<String> = Vec::new();

        conditions.push_str(&format!(
            " AND (n.title {LIKE} OR n.short_summary {LIKE} OR n.body {LIKE})"
        ));
        let pattern = like_pattern(query);
        binds.extend([pattern.clone(), pattern.clone(), pattern]);

        push_common_filters(
            &mut conditions,
            &mut binds,
            filters.scope.as_deref(),
            filters.stakeholder_id,
            filters.created_from.as_deref(),
            filters.created_to.as_deref(),
        );

        let sql = format!(
            "SELECT n.id, n.title, n.short_summary, n.body, n.updated_at \
             FROM notes n \
             WHERE 1 = 1{conditions} \
             ORDER BY n.updated_at DESC, n.id DESC \
             LIMIT {SEARCH_LIMIT}"
        );

        let mut q = sqlx::query(&sql);
        for bind in &binds {
            q = q.bind(bind);
        }
        let rows = q.fetch_all(self.pool).await?;

        let hits = rows
            .iter()
            .map(|row| {
                let title: String = row.get("title");
                let short_summary: Option<String> = row.get("short_summary");
                let body: Option<String> = row.get("body");

                let mut match_context = BTreeMap::new();
                if let Some(snip) = snippet(&title, query, SNIPPET_RADIUS) {
                    match_context.insert("title", snip);
                }
                if let Some(snip) = short_summary
                    .as_deref()
                    .and_then(|s| snippet(s, query, SNIPPET_RADIUS))
                {
                    match_context.insert("short_summary", snip);
                }
                if let Some(snip) = body
                    .as_deref()
                    .and_then(|s| snippet(s, query, SNIPPET_RADIUS))
                {
                    match_context.insert("body", snip);
                }

                NoteSearchHit {
                    id: row.get("id"),
                    title,
                    match_context,
                    updated_at: row.get("updated_at"),
                }
            })
            .collect();

        Ok(hits)
    }

    /// Nested view of a note and its descendants.
    ///
    /// Recursion stops at [`MAX_TREE_DEPTH`]; a cycle in `parent_id` links
    /// therefore cannot loop, and revisited ids are skipped outright.
    #[instrument(skip(self))]
    pub async fn tree(&self, id: i64) -> ResourceResult<NoteTreeNode> {
        let root = sqlx::query("SELECT id, title FROM notes WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(ResourceError::NotFound {
                resource: "note",
                id,
            })?;

        // One pass over the table; the tree is assembled in memory.
        let rows = sqlx::query("SELECT id, parent_id, title FROM notes ORDER BY id ASC")
            .fetch_all(self.pool)
            .await?;

        let mut children_by_parent: HashMap<i64, Vec<(i64, String)>> = HashMap::new();
        for row in &rows {
            if let Some(parent_id) = row.get::<Option<i64>, _>("parent_id") {
                children_by_parent
                    .entry(parent_id)
                    .or_default()
                    .push((row.get("id"), row.get("title")));
            }
        }

        let mut visited = HashSet::new();
        visited.insert(id);
        Ok(build_node(
            id,
            root.get("title"),
            0,
            &children_by_parent,
            &mut visited,
        ))
    }

    /// Direct children of a note.
    #[instrument(skip(self))]
    pub async fn children(&self, id: i64) -> ResourceResult<Vec<NoteChild>> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes WHERE id = ?")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        if exists == 0 {
            return Err(ResourceError::NotFound {
                resource: "note",
                id,
            });
        }

        self.children_of(id).await
    }

    async fn children_of(&self, id: i64) -> ResourceResult<Vec<NoteChild>> {
        let children = sqlx::query(
            "SELECT n.id, n.title, n.short_summary, \
                    (SELECT COUNT(*) FROM notes k WHERE k.parent_id = n.id) AS child_count \
             FROM notes n WHERE n.parent_id = ? \
             ORDER BY n.id ASC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .iter()
        .map(|r| NoteChild {
            id: r.get("id"),
            title: r.get("title"),
            short_summary: r.get("short_summary"),
            child_count: r.get("child_count"),
        })
        .collect();

        Ok(children)
    }
}

fn push_common_filters(
    conditions: &mut String,
    binds: &mut Vec<String>,
    scope: Option<&str>,
    stakeholder_id: Option<i64>,
    created_from: Option<&str>,
    created_to: Option<&str>,
) {
    if let Some(scope) = scope {
        conditions.push_str(
            " AND EXISTS (SELECT 1 FROM json_each(n.scopes) WHERE json_each.value = ?)",
        );
        binds.push(scope.to_string());
    }
    if let Some(stakeholder_id) = stakeholder_id {
        conditions.push_str(
            " AND EXISTS (SELECT 1 FROM note_stakeholder ns \
                WHERE ns.note_id = n.id AND ns.stakeholder_id = ?)",
        );
        binds.push(stakeholder_id.to_string());
    }
    push_date_range(conditions, binds, "date(n.created_at)", created_from, created_to);
}

fn build_node(
    id: i64,
    title: String,
    depth: i64,
    children_by_parent: &HashMap<i64, Vec<(i64, String)>>,
    visited: &mut HashSet<i64>,
) -> NoteTreeNode {
    let entries = children_by_parent.get(&id);
    let child_count = entries.map_or(0, |c| c.len() as i64);

    let children = if depth < MAX_TREE_DEPTH {
        entries
            .into_iter()
            .flatten()
            .filter_map(|(child_id, child_title)| {
                if visited.insert(*child_id) {
                    Some(build_node(
                        *child_id,
                        child_title.clone(),
                        depth + 1,
                        children_by_parent,
                        visited,
                    ))
                } else {
                    None
                }
            })
            .collect()
    } else {
        Vec::new()
    };

    NoteTreeNode {
        id,
        title,
        depth,
        child_count,
        children,
    }
}

fn summary_from_row(row: &SqliteRow) -> NoteSummary {
    let scopes_json: String = row.get("scopes");
    let scopes: Vec<String> = serde_json::from_str(&scopes_json).unwrap_or_default();

    NoteSummary {
        id: row.get("id"),
        parent_id: row.get("parent_id"),
        title: row.get("title"),
        short_summary: row.get("short_summary"),
        scopes,
        child_count: row.get("child_count"),
        stakeholder_count: row.get("stakeholder_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Case-insensitive (ASCII) substring find, returning byte offsets of the
/// match. Mirrors SQLite's LIKE semantics so SQL-matched rows always yield a
/// snippet.
fn find_ci(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }
    let needle_chars: Vec<char> = needle.chars().collect();

    for (start, _) in haystack.char_indices() {
        let mut matched = 0;
        let mut end = start;
        for c in haystack[start..].chars() {
            if matched == needle_chars.len() {
                break;
            }
            if !c.eq_ignore_ascii_case(&needle_chars[matched]) {
                break;
            }
            matched += 1;
            end += c.len_utf8();
        }
        if matched == needle_chars.len() {
            return Some((start, end));
        }
    }
    None
}

/// Context window around the first occurrence of `query` in `text`:
/// up to `radius` characters on each side, ellipsis-wrapped when truncated.
/// Returns `None` when the text does not contain the query.
fn snippet(text: &str, query: &str, radius: usize) -> Option<String> {
    let (start, end) = find_ci(text, query)?;

    let before: Vec<usize> = text[..start].char_indices().map(|(i, _)| i).collect();
    let snip_start = if before.len() > radius {
        before[before.len() - radius]
    } else {
        0
    };

    let after: Vec<usize> = text[end..].char_indices().map(|(i, _)| i).collect();
    let snip_end = if after.len() > radius {
        end + after[radius]
    } else {
        text.len()
    };

    let mut out = String::new();
    if snip_start > 0 {
        out.push('…');
    }
    out.push_str(&text[snip_start..snip_end]);
    if snip_end < text.len() {
        out.push('…');
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::{find_ci, snippet};

    #[test]
    fn find_ci_ignores_ascii_case() {
        assert_eq!(find_ci("Hello World", "world"), Some((6, 11)));
        assert_eq!(find_ci("Hello World", "xyz"), None);
    }

    #[test]
    fn snippet_short_text_is_untruncated() {
        let snip = snippet("a kickoff meeting", "kickoff", 40).expect("should match");
        assert_eq!(snip, "a kickoff meeting");
    }

    #[test]
    fn snippet_truncates_with_ellipses() {
        let text = format!("{}needle{}", "x".repeat(100), "y".repeat(100));
        let snip = snippet(&text, "needle", 10).expect("should match");
        assert!(snip.starts_with('…'));
        assert!(snip.ends_with('…'));
        assert!(snip.contains("needle"));
        // 10 chars each side + the needle + two ellipses
        assert_eq!(snip.chars().count(), 10 + 6 + 10 + 2);
    }

    #[test]
    fn snippet_handles_multibyte_text() {
        let text = "café noté — le résumé contient needle quelque part après";
        let snip = snippet(text, "NEEDLE", 12).expect("should match");
        assert!(snip.contains("needle"));
    }
}
