//! MCP server implementation.
//!
//! One tool per resource operation, each delegating to the matching module
//! in [`crate::resources`]. `NotFound` and `InvalidId` become tool error
//! responses so the client sees a typed failure; store-level errors surface
//! as protocol internal errors.

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::resources::{
    CatalogCategoryFilters, CatalogCategoryResource, CatalogItemFilters, CatalogItemResource,
    CategoryResource, ClientFilters, ClientResource, DashboardResource, InvoiceFilters,
    InvoiceResource, MediaFilters, MediaResource, NoteFilters, NoteResource, NoteSearchFilters,
    Page, PostFilters, PostResource, ProjectFilters, ProjectResource, QuoteFilters, QuoteResource,
    ResourceError, ResourceResult, SocialConnectionFilters, SocialConnectionResource,
    SocialPostFilters, SocialPostResource, StakeholderFilters, StakeholderResource, TagResource,
    TaskFilters, TaskResource, TaxonomyFilters, validate_id,
};

use super::params::IdParams;

/// MCP server over the shared business store.
#[derive(Clone)]
pub struct McpServer {
    pool: SqlitePool,
    tool_router: rmcp::handler::server::router::tool::ToolRouter<McpServer>,
}

#[tool_router]
impl McpServer {
    /// Create a new server borrowing the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            tool_router: Self::tool_router(),
        }
    }

    fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
        match serde_json::to_string_pretty(value) {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => Err(McpError::internal_error(e.to_string(), None)),
        }
    }

    /// Map a resource result onto the tool contract.
    fn respond<T: Serialize>(result: ResourceResult<T>) -> Result<CallToolResult, McpError> {
        match result {
            Ok(value) => Self::json_result(&value),
            Err(err @ (ResourceError::NotFound { .. } | ResourceError::InvalidId { .. })) => {
                Ok(CallToolResult::error(vec![Content::text(err.to_string())]))
            }
            Err(ResourceError::Database(e)) => Err(McpError::internal_error(e.to_string(), None)),
        }
    }

    /// Wrap a page under its entity key, next to the pagination block.
    fn page_envelope<T: Serialize>(
        key: &'static str,
        result: ResourceResult<Page<T>>,
    ) -> ResourceResult<serde_json::Value> {
        result.map(|page| json!({ key: page.data, "pagination": page.pagination }))
    }

    // ------------------------------------------------------------------
    // CRM
    // ------------------------------------------------------------------

    #[tool(description = "List clients. Optional filters: status (lead, active, inactive), \
        search (company, contact, email), page, per_page. Returns a paginated envelope.")]
    pub async fn list_clients(
        &self,
        Parameters(filters): Parameters<ClientFilters>,
    ) -> Result<CallToolResult, McpError> {
        let result = ClientResource::new(&self.pool).list(&filters).await;
        Self::respond(Self::page_envelope("clients", result))
    }

    #[tool(description = "Get one client by id, with its projects, quotes, invoices, and tasks.")]
    pub async fn get_client(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "client")?;
            ClientResource::new(&self.pool).get(id).await
        }
        .await;
        Self::respond(result)
    }

    #[tool(description = "List projects. Optional filters: status, client_id, search, \
        page, per_page. Each row carries client_name, progress, and overdue state.")]
    pub async fn list_projects(
        &self,
        Parameters(filters): Parameters<ProjectFilters>,
    ) -> Result<CallToolResult, McpError> {
        let result = ProjectResource::new(&self.pool).list(&filters).await;
        Self::respond(Self::page_envelope("projects", result))
    }

    #[tool(description = "Get one project by id, with its task list.")]
    pub async fn get_project(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "project")?;
            ProjectResource::new(&self.pool).get(id).await
        }
        .await;
        Self::respond(result)
    }

    #[tool(description = "List tasks. Optional filters: status, priority, project_id, \
        due_from, due_to, search, page, per_page. Each row carries project_name, logged \
        hours, and overdue state.")]
    pub async fn list_tasks(
        &self,
        Parameters(filters): Parameters<TaskFilters>,
    ) -> Result<CallToolResult, McpError> {
        let result = TaskResource::new(&self.pool).list(&filters).await;
        Self::respond(Self::page_envelope("tasks", result))
    }

    #[tool(description = "Get one task by id, with its time entries.")]
    pub async fn get_task(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "task")?;
            TaskResource::new(&self.pool).get(id).await
        }
        .await;
        Self::respond(result)
    }

    // ------------------------------------------------------------------
    // Billing
    // ------------------------------------------------------------------

    #[tool(description = "List invoices. Optional filters: status, client_id, issued_from, \
        issued_to, search (number), page, per_page. Totals are computed from the lines.")]
    pub async fn list_invoices(
        &self,
        Parameters(filters): Parameters<InvoiceFilters>,
    ) -> Result<CallToolResult, McpError> {
        let result = InvoiceResource::new(&self.pool).list(&filters).await;
        Self::respond(Self::page_envelope("invoices", result))
    }

    #[tool(description = "Get one invoice by id, with its lines and HT/VAT/TTC totals.")]
    pub async fn get_invoice(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "invoice")?;
            InvoiceResource::new(&self.pool).get(id).await
        }
        .await;
        Self::respond(result)
    }

    #[tool(description = "List quotes. Optional filters: status, client_id, search (number), \
        page, per_page.")]
    pub async fn list_quotes(
        &self,
        Parameters(filters): Parameters<QuoteFilters>,
    ) -> Result<CallToolResult, McpError> {
        let result = QuoteResource::new(&self.pool).list(&filters).await;
        Self::respond(Self::page_envelope("quotes", result))
    }

    #[tool(description = "Get one quote by id, with its lines and totals.")]
    pub async fn get_quote(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "quote")?;
            QuoteResource::new(&self.pool).get(id).await
        }
        .await;
        Self::respond(result)
    }

    #[tool(description = "List catalog items. Optional filters: category_id, is_active, \
        search, page, per_page.")]
    pub async fn list_catalog_items(
        &self,
        Parameters(filters): Parameters<CatalogItemFilters>,
    ) -> Result<CallToolResult, McpError> {
        let result = CatalogItemResource::new(&self.pool).list(&filters).await;
        Self::respond(Self::page_envelope("catalog_items", result))
    }

    #[tool(description = "Get one catalog item by id.")]
    pub async fn get_catalog_item(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "catalog_item")?;
            CatalogItemResource::new(&self.pool).get(id).await
        }
        .await;
        Self::respond(result)
    }

    #[tool(description = "List catalog categories with item counts. Optional filters: \
        search, page, per_page.")]
    pub async fn list_catalog_categories(
        &self,
        Parameters(filters): Parameters<CatalogCategoryFilters>,
    ) -> Result<CallToolResult, McpError> {
        let result = CatalogCategoryResource::new(&self.pool).list(&filters).await;
        Self::respond(Self::page_envelope("catalog_categories", result))
    }

    #[tool(description = "Get one catalog category by id, with its items.")]
    pub async fn get_catalog_category(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "catalog_category")?;
            CatalogCategoryResource::new(&self.pool).get(id).await
        }
        .await;
        Self::respond(result)
    }

    // ------------------------------------------------------------------
    // Notes
    // ------------------------------------------------------------------

    #[tool(description = "List notes. Optional filters: scope, stakeholder_id, created_from, \
        created_to, search, page, per_page.")]
    pub async fn list_notes(
        &self,
        Parameters(filters): Parameters<NoteFilters>,
    ) -> Result<CallToolResult, McpError> {
        let result = NoteResource::new(&self.pool).list(&filters).await;
        Self::respond(Self::page_envelope("notes", result))
    }

    #[tool(description = "Get one note by id, with its children, stakeholders, and scopes.")]
    pub async fn get_note(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "note")?;
            NoteResource::new(&self.pool).get(id).await
        }
        .await;
        Self::respond(result)
    }

    #[tool(description = "Search notes by substring across title, summary, and body \
        (case-insensitive, max 50 results). Each hit carries a context snippet per matched \
        field. Optional narrowing: scope, stakeholder_id, created_from, created_to.")]
    pub async fn search_notes(
        &self,
        Parameters(filters): Parameters<NoteSearchFilters>,
    ) -> Result<CallToolResult, McpError> {
        let result = NoteResource::new(&self.pool)
            .search(&filters)
            .await
            .map(|hits| json!({ "count": hits.len(), "notes": hits }));
        Self::respond(result)
    }

    #[tool(description = "Get the tree of a note and its descendants, up to 5 levels deep. \
        Nodes carry depth and child_count.")]
    pub async fn get_note_tree(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "note")?;
            NoteResource::new(&self.pool).tree(id).await
        }
        .await;
        Self::respond(result)
    }

    #[tool(description = "Get the direct children of a note.")]
    pub async fn get_note_children(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "note")?;
            let children = NoteResource::new(&self.pool).children(id).await?;
            Ok(json!({ "count": children.len(), "children": children }))
        }
        .await;
        Self::respond(result)
    }

    #[tool(description = "List stakeholders. Optional filters: search (name, organization), \
        page, per_page.")]
    pub async fn list_stakeholders(
        &self,
        Parameters(filters): Parameters<StakeholderFilters>,
    ) -> Result<CallToolResult, McpError> {
        let result = StakeholderResource::new(&self.pool).list(&filters).await;
        Self::respond(Self::page_envelope("stakeholders", result))
    }

    #[tool(description = "Get one stakeholder by id, with linked note summaries.")]
    pub async fn get_stakeholder(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "stakeholder")?;
            StakeholderResource::new(&self.pool).get(id).await
        }
        .await;
        Self::respond(result)
    }

    // ------------------------------------------------------------------
    // Blog
    // ------------------------------------------------------------------

    #[tool(description = "List blog posts. Optional filters: status (draft, published), \
        category_id, tag_id, search, page, per_page.")]
    pub async fn list_posts(
        &self,
        Parameters(filters): Parameters<PostFilters>,
    ) -> Result<CallToolResult, McpError> {
        let result = PostResource::new(&self.pool).list(&filters).await;
        Self::respond(Self::page_envelope("posts", result))
    }

    #[tool(description = "Get one blog post by id, with body, category, and tags.")]
    pub async fn get_post(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "post")?;
            PostResource::new(&self.pool).get(id).await
        }
        .await;
        Self::respond(result)
    }

    #[tool(description = "List blog tags with post counts. Optional filters: search, page, \
        per_page.")]
    pub async fn list_tags(
        &self,
        Parameters(filters): Parameters<TaxonomyFilters>,
    ) -> Result<CallToolResult, McpError> {
        let result = TagResource::new(&self.pool).list(&filters).await;
        Self::respond(Self::page_envelope("tags", result))
    }

    #[tool(description = "Get one blog tag by id, with its posts.")]
    pub async fn get_tag(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "tag")?;
            TagResource::new(&self.pool).get(id).await
        }
        .await;
        Self::respond(result)
    }

    #[tool(description = "List blog categories with post counts. Optional filters: search, \
        page, per_page.")]
    pub async fn list_blog_categories(
        &self,
        Parameters(filters): Parameters<TaxonomyFilters>,
    ) -> Result<CallToolResult, McpError> {
        let result = CategoryResource::new(&self.pool).list(&filters).await;
        Self::respond(Self::page_envelope("categories", result))
    }

    #[tool(description = "Get one blog category by id, with its posts.")]
    pub async fn get_blog_category(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "category")?;
            CategoryResource::new(&self.pool).get(id).await
        }
        .await;
        Self::respond(result)
    }

    #[tool(description = "List media records. Optional filters: type (MIME prefix), search \
        (file name), page, per_page.")]
    pub async fn list_media(
        &self,
        Parameters(filters): Parameters<MediaFilters>,
    ) -> Result<CallToolResult, McpError> {
        let result = MediaResource::new(&self.pool).list(&filters).await;
        Self::respond(Self::page_envelope("media", result))
    }

    #[tool(description = "Get one media record by id.")]
    pub async fn get_media(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "media")?;
            MediaResource::new(&self.pool).get(id).await
        }
        .await;
        Self::respond(result)
    }

    // ------------------------------------------------------------------
    // Social
    // ------------------------------------------------------------------

    #[tool(description = "List social connections. Optional filters: platform, is_active, \
        page, per_page.")]
    pub async fn list_social_connections(
        &self,
        Parameters(filters): Parameters<SocialConnectionFilters>,
    ) -> Result<CallToolResult, McpError> {
        let result = SocialConnectionResource::new(&self.pool).list(&filters).await;
        Self::respond(Self::page_envelope("social_connections", result))
    }

    #[tool(description = "Get one social connection by id.")]
    pub async fn get_social_connection(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "social_connection")?;
            SocialConnectionResource::new(&self.pool).get(id).await
        }
        .await;
        Self::respond(result)
    }

    #[tool(description = "List scheduled social posts. Optional filters: status, platform, \
        connection_id, scheduled_from, scheduled_to, page, per_page.")]
    pub async fn list_social_posts(
        &self,
        Parameters(filters): Parameters<SocialPostFilters>,
    ) -> Result<CallToolResult, McpError> {
        let result = SocialPostResource::new(&self.pool).list(&filters).await;
        Self::respond(Self::page_envelope("social_posts", result))
    }

    #[tool(description = "Get one scheduled social post by id.")]
    pub async fn get_social_post(
        &self,
        Parameters(params): Parameters<IdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = async {
            let id = validate_id(&params.id, "social_post")?;
            SocialPostResource::new(&self.pool).get(id).await
        }
        .await;
        Self::respond(result)
    }

    // ------------------------------------------------------------------
    // Dashboard
    // ------------------------------------------------------------------

    #[tool(description = "Get the dashboard snapshot: client/project/task counters, \
        outstanding and overdue invoice totals, pending quotes, scheduled social posts, \
        and the latest published post.")]
    pub async fn get_dashboard(&self) -> Result<CallToolResult, McpError> {
        let result = DashboardResource::new(&self.pool).snapshot().await;
        Self::respond(result)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        // ServerInfo (InitializeResult) is #[non_exhaustive]; build from Default
        // and set the fields this server customizes.
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.instructions = Some(
            "Atelier MCP server. Read-only tools over the business store: clients, \
             projects, tasks, invoices, quotes, catalog, notes, stakeholders, blog \
             content, media, social scheduling, and a dashboard snapshot."
                .to_string(),
        );
        info
    }
}
