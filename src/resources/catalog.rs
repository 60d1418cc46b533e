//! Catalog resources: billable items and their categories.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use super::error::{ResourceError, ResourceResult};
use super::filters::{LIKE, fetch_rows_and_total, like_pattern, push_eq};
use super::pagination::{Page, PageRequest};

/// Optional filters for the catalog item list. Unrecognized keys are ignored.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CatalogItemFilters {
    /// Filter by category id.
    pub category_id: Option<i64>,
    /// Filter on whether the item is currently offered.
    pub is_active: Option<bool>,
    /// Case-insensitive substring match on name and description.
    pub search: Option<String>,
    /// Page number, 1-based.
    pub page: Option<Value>,
    /// Page size, clamped to 1..=100 (default 15).
    pub per_page: Option<Value>,
}

/// Optional filters for the catalog category list.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CatalogCategoryFilters {
    /// Case-insensitive substring match on the category name.
    pub search: Option<String>,
    /// Page number, 1-based.
    pub page: Option<Value>,
    /// Page size, clamped to 1..=100 (default 15).
    pub per_page: Option<Value>,
}

/// Flat projection of a catalog item.
#[derive(Debug, Serialize)]
pub struct CatalogItemView {
    pub id: i64,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub unit_price: f64,
    pub vat_rate: f64,
    pub is_active: bool,
}

/// Flat projection of a catalog category.
#[derive(Debug, Serialize)]
pub struct CatalogCategoryView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub item_count: i64,
}

/// Category detail with its items.
#[derive(Debug, Serialize)]
pub struct CatalogCategoryDetail {
    #[serde(flatten)]
    pub category: CatalogCategoryView,
    pub items: Vec<CatalogItemView>,
}

/// Read-side resource over the `catalog_items` table.
pub struct CatalogItemResource<'a> {
    pool: &'a SqlitePool,
}

const ITEM_COLUMNS: &str = "i.id, i.category_id, g.name AS category_name, i.name, \
     i.description, i.unit, i.unit_price, i.vat_rate, i.is_active";

impl<'a> CatalogItemResource<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filters: &CatalogItemFilters,
    ) -> ResourceResult<Page<CatalogItemView>> {
        let mut conditions = String::new();
        let mut binds: Vec<String> = Vec::new();

        push_eq(
            &mut conditions,
            &mut binds,
            "i.category_id",
            filters.category_id.map(|id| id.to_string()),
        );
        push_eq(
            &mut conditions,
            &mut binds,
            "i.is_active",
            filters.is_active.map(|b| if b { "1" } else { "0" }.to_string()),
        );

        if let Some(search) = &filters.search {
            conditions.push_str(&format!(" AND (i.name {LIKE} OR i.description {LIKE})"));
            let pattern = like_pattern(search);
            binds.extend([pattern.clone(), pattern]);
        }

        let request = PageRequest::from_raw(filters.page.as_ref(), filters.per_page.as_ref());

        let select_sql = format!(
            "SELECT {ITEM_COLUMNS} \
             FROM catalog_items i LEFT JOIN catalog_categories g ON g.id = i.category_id \
             WHERE 1 = 1{conditions} \
             ORDER BY i.name ASC, i.id ASC \
             LIMIT {} OFFSET {}",
            request.limit(),
            request.offset(),
        );
        let count_sql = format!("SELECT COUNT(*) FROM catalog_items i WHERE 1 = 1{conditions}");

        let (rows, total) =
            fetch_rows_and_total(self.pool, &select_sql, &count_sql, &binds).await?;
        let data = rows.iter().map(item_from_row).collect();

        Ok(Page::new(data, &request, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ResourceResult<CatalogItemView> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} \
             FROM catalog_items i LEFT JOIN catalog_categories g ON g.id = i.category_id \
             WHERE i.id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(ResourceError::NotFound {
                resource: "catalog_item",
                id,
            })?;

        Ok(item_from_row(&row))
    }
}

/// Read-side resource over the `catalog_categories` table.
pub struct CatalogCategoryResource<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CatalogCategoryResource<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filters: &CatalogCategoryFilters,
    ) -> ResourceResult<Page<CatalogCategoryView>> {
        let mut conditions = String::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(search) = &filters.search {
            conditions.push_str(&format!(" AND g.name {LIKE}"));
            binds.push(like_pattern(search));
        }

        let request = PageRequest::from_raw(filters.page.as_ref(), filters.per_page.as_ref());

        let select_sql = format!(
            "SELECT g.id, g.name, g.description, \
                    (SELECT COUNT(*) FROM catalog_items i WHERE i.category_id = g.id) AS item_count \
             FROM catalog_categories g \
             WHERE 1 = 1{conditions} \
             ORDER BY g.name ASC, g.id ASC \
             LIMIT {} OFFSET {}",
            request.limit(),
            request.offset(),
        );
        let count_sql = format!("SELECT COUNT(*) FROM catalog_categories g WHERE 1 = 1{conditions}");

        let (rows, total) =
            fetch_rows_and_total(self.pool, &select_sql, &count_sql, &binds).await?;
        let data = rows.iter().map(category_from_row).collect();

        Ok(Page::new(data, &request, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ResourceResult<CatalogCategoryDetail> {
        let row = sqlx::query(
            "SELECT g.id, g.name, g.description, \
                    (SELECT COUNT(*) FROM catalog_items i WHERE i.category_id = g.id) AS item_count \
             FROM catalog_categories g WHERE g.id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(ResourceError::NotFound {
            resource: "catalog_category",
            id,
        })?;

        let sql = format!(
            "SELECT {ITEM_COLUMNS} \
             FROM catalog_items i LEFT JOIN catalog_categories g ON g.id = i.category_id \
             WHERE i.category_id = ? \
             ORDER BY i.name ASC, i.id ASC"
        );
        let items = sqlx::query(&sql)
            .bind(id)
            .fetch_all(self.pool)
            .await?
            .iter()
            .map(item_from_row)
            .collect();

        Ok(CatalogCategoryDetail {
            category: category_from_row(&row),
            items,
        })
    }
}

fn item_from_row(row: &SqliteRow) -> CatalogItemView {
    CatalogItemView {
        id: row.get("id"),
        category_id: row.get("category_id"),
        category_name: row.get("category_name"),
        name: row.get("name"),
        description: row.get("description"),
        unit: row.get("unit"),
        unit_price: row.get("unit_price"),
        vat_rate: row.get("vat_rate"),
        is_active: row.get("is_active"),
    }
}

fn category_from_row(row: &SqliteRow) -> CatalogCategoryView {
    CatalogCategoryView {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        item_count: row.get("item_count"),
    }
}
