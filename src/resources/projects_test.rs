//! Tests for ProjectResource.

use crate::db::ProjectStatus;
use crate::resources::fixtures::*;
use crate::resources::{ProjectFilters, ProjectResource};

#[tokio::test(flavor = "multi_thread")]
async fn list_carries_client_name_and_progress() {
    let db = setup_db().await;
    let pool = db.pool();

    let client_id = insert_client(pool, "Dupont Industries", "active").await;
    let project_id = insert_project(pool, client_id, "Site refresh", "in_progress", None).await;
    insert_task(pool, project_id, "Wireframes", "done", None).await;
    insert_task(pool, project_id, "Build", "done", None).await;
    insert_task(pool, project_id, "Launch", "todo", None).await;

    let page = ProjectResource::new(pool)
        .list(&ProjectFilters::default())
        .await
        .expect("List should succeed");

    assert_eq!(page.data.len(), 1);
    let project = &page.data[0];
    assert_eq!(project.client_name, "Dupont Industries");
    assert_eq!(project.task_count, 3);
    assert_eq!(project.done_task_count, 2);
    assert_eq!(project.progress_percent, 66.67);
}

#[tokio::test(flavor = "multi_thread")]
async fn overdue_depends_on_status_and_end_date() {
    let db = setup_db().await;
    let pool = db.pool();

    let client_id = insert_client(pool, "Acme", "active").await;
    insert_project(pool, client_id, "Late one", "in_progress", Some("2020-01-01")).await;
    insert_project(pool, client_id, "Shipped", "completed", Some("2020-01-01")).await;
    insert_project(pool, client_id, "Future", "pending", Some("2099-01-01")).await;

    let page = ProjectResource::new(pool)
        .list(&ProjectFilters::default())
        .await
        .expect("List should succeed");

    let by_name = |name: &str| {
        page.data
            .iter()
            .find(|p| p.name == name)
            .unwrap_or_else(|| panic!("project {} missing", name))
    };
    assert!(by_name("Late one").is_overdue);
    assert!(!by_name("Shipped").is_overdue);
    assert!(!by_name("Future").is_overdue);
}

#[tokio::test(flavor = "multi_thread")]
async fn list_filters_by_client_and_status() {
    let db = setup_db().await;
    let pool = db.pool();

    let a = insert_client(pool, "A", "active").await;
    let b = insert_client(pool, "B", "active").await;
    insert_project(pool, a, "A pending", "pending", None).await;
    insert_project(pool, a, "A done", "completed", None).await;
    insert_project(pool, b, "B pending", "pending", None).await;

    let filters = ProjectFilters {
        client_id: Some(a),
        status: Some("pending".into()),
        ..Default::default()
    };
    let page = ProjectResource::new(pool)
        .list(&filters)
        .await
        .expect("List should succeed");

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].name, "A pending");
    assert_eq!(page.data[0].status, ProjectStatus::Pending);
}

#[tokio::test(flavor = "multi_thread")]
async fn get_lists_tasks_in_due_order() {
    let db = setup_db().await;
    let pool = db.pool();

    let client_id = insert_client(pool, "Acme", "active").await;
    let project_id = insert_project(pool, client_id, "Site refresh", "in_progress", None).await;
    insert_task(pool, project_id, "No due date", "todo", None).await;
    insert_task(pool, project_id, "Due later", "todo", Some("2025-07-01")).await;
    insert_task(pool, project_id, "Due first", "todo", Some("2025-06-10")).await;

    let detail = ProjectResource::new(pool)
        .get(project_id)
        .await
        .expect("Get should succeed");

    let titles: Vec<&str> = detail.tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Due first", "Due later", "No due date"]);
}
