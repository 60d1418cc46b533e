//! Tests for NoteResource.

use crate::resources::fixtures::*;
use crate::resources::{
    MAX_TREE_DEPTH, NoteFilters, NoteResource, NoteSearchFilters, ResourceError, SEARCH_LIMIT,
};

#[tokio::test(flavor = "multi_thread")]
async fn search_returns_only_matching_notes_with_field_context() {
    let db = setup_db().await;
    let pool = db.pool();

    insert_note(
        pool, None, "Kickoff", None,
        Some("Long discussion about the migration plan and next steps"),
        &[],
    )
    .await;
    insert_note(
        pool, None, "Weekly review", Some("Migration status going well"), Some("Nothing else"),
        &[],
    )
    .await;
    insert_note(pool, None, "Unrelated", Some("Groceries"), Some("Buy milk"), &[]).await;

    let hits = NoteResource::new(pool)
        .search(&NoteSearchFilters {
            query: "migration".into(),
            ..Default::default()
        })
        .await
        .expect("Search should succeed");

    assert_eq!(hits.len(), 2);

    let kickoff = hits.iter().find(|h| h.title == "Kickoff").expect("kickoff hit");
    assert_eq!(kickoff.match_context.len(), 1);
    let snippet = kickoff.match_context.get("body").expect("body snippet");
    assert!(snippet.contains("migration"));

    let review = hits.iter().find(|h| h.title == "Weekly review").expect("review hit");
    assert!(review.match_context.contains_key("short_summary"));
    assert!(!review.match_context.contains_key("title"));
    assert!(!review.match_context.contains_key("body"));
}

#[tokio::test(flavor = "multi_thread")]
async fn search_snippets_are_bounded_and_ellipsized() {
    let db = setup_db().await;
    let pool = db.pool();

    let body = format!("{} deadline {}", "lorem ".repeat(50), "ipsum ".repeat(50));
    insert_note(pool, None, "Big note", None, Some(&body), &[]).await;

    let hits = NoteResource::new(pool)
        .search(&NoteSearchFilters {
            query: "deadline".into(),
            ..Default::default()
        })
        .await
        .expect("Search should succeed");

    let snippet = hits[0].match_context.get("body").expect("body snippet");
    assert!(snippet.contains("deadline"));
    assert!(snippet.starts_with('…'));
    assert!(snippet.ends_with('…'));
    // 40 chars context each side plus the match and the ellipses.
    assert!(snippet.chars().count() <= 40 + "deadline".len() + 40 + 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn search_is_capped() {
    let db = setup_db().await;
    let pool = db.pool();

    for n in 0..60 {
        insert_note(pool, None, &format!("Note {}", n), None, Some("common theme"), &[]).await;
    }

    let hits = NoteResource::new(pool)
        .search(&NoteSearchFilters {
            query: "common".into(),
            ..Default::default()
        })
        .await
        .expect("Search should succeed");

    assert_eq!(hits.len(), SEARCH_LIMIT as usize);
}

#[tokio::test(flavor = "multi_thread")]
async fn search_narrows_by_scope_and_stakeholder() {
    let db = setup_db().await;
    let pool = db.pool();

    let in_scope = insert_note(pool, None, "Budget note", None, Some("budget talk"), &["finance"])
        .await;
    insert_note(pool, None, "Other budget", None, Some("budget talk"), &["ops"]).await;

    let stakeholder = insert_stakeholder(pool, "Claire", Some("Dupont Industries")).await;
    link_note_stakeholder(pool, in_scope, stakeholder).await;

    let hits = NoteResource::new(pool)
        .search(&NoteSearchFilters {
            query: "budget".into(),
            scope: Some("finance".into()),
            stakeholder_id: Some(stakeholder),
            ..Default::default()
        })
        .await
        .expect("Search should succeed");

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, in_scope);
}

#[tokio::test(flavor = "multi_thread")]
async fn list_filters_by_scope() {
    let db = setup_db().await;
    let pool = db.pool();

    insert_note(pool, None, "Finance A", None, None, &["finance", "q3"]).await;
    insert_note(pool, None, "Ops B", None, None, &["ops"]).await;

    let page = NoteResource::new(pool)
        .list(&NoteFilters {
            scope: Some("finance".into()),
            ..Default::default()
        })
        .await
        .expect("List should succeed");

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].title, "Finance A");
    assert_eq!(page.data[0].scopes, vec!["finance".to_string(), "q3".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn get_includes_children_stakeholders_and_scopes() {
    let db = setup_db().await;
    let pool = db.pool();

    let parent = insert_note(pool, None, "Parent", Some("summary"), Some("body"), &["finance"])
        .await;
    let child = insert_note(pool, Some(parent), "Child", None, None, &[]).await;
    insert_note(pool, Some(child), "Grandchild", None, None, &[]).await;

    let stakeholder = insert_stakeholder(pool, "Claire", None).await;
    link_note_stakeholder(pool, parent, stakeholder).await;

    let detail = NoteResource::new(pool)
        .get(parent)
        .await
        .expect("Get should succeed");

    assert_eq!(detail.summary.child_count, 1);
    assert_eq!(detail.children.len(), 1);
    assert_eq!(detail.children[0].title, "Child");
    assert_eq!(detail.children[0].child_count, 1);
    assert_eq!(detail.stakeholders.len(), 1);
    assert_eq!(detail.stakeholders[0].name, "Claire");
    assert_eq!(detail.summary.scopes, vec!["finance".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn tree_stops_at_max_depth() {
    let db = setup_db().await;
    let pool = db.pool();

    // Chain three levels deeper than the cap.
    let root = insert_note(pool, None, "Level 0", None, None, &[]).await;
    let mut parent = root;
    for level in 1..=(MAX_TREE_DEPTH + 3) {
        parent = insert_note(pool, Some(parent), &format!("Level {}", level), None, None, &[])
            .await;
    }

    let tree = NoteResource::new(pool)
        .tree(root)
        .await
        .expect("Tree should succeed");

    let mut depth = 0;
    let mut node = &tree;
    while let Some(child) = node.children.first() {
        node = child;
        depth = node.depth;
    }
    assert_eq!(depth, MAX_TREE_DEPTH);
    // The cut-off node still reports its hidden child.
    assert_eq!(node.child_count, 1);
    assert!(node.children.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn tree_survives_cycles() {
    let db = setup_db().await;
    let pool = db.pool();

    let a = insert_note(pool, None, "A", None, None, &[]).await;
    let b = insert_note(pool, Some(a), "B", None, None, &[]).await;
    // Cycle: A's parent is B.
    set_note_parent(pool, a, Some(b)).await;

    let tree = NoteResource::new(pool)
        .tree(a)
        .await
        .expect("Tree should succeed");

    assert_eq!(tree.id, a);
    assert_eq!(tree.children.len(), 1);
    assert_eq!(tree.children[0].id, b);
    // A is not revisited under B.
    assert!(tree.children[0].children.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn children_of_missing_note_is_not_found() {
    let db = setup_db().await;

    let err = NoteResource::new(db.pool()).children(777).await.unwrap_err();
    match err {
        ResourceError::NotFound { resource, id } => {
            assert_eq!(resource, "note");
            assert_eq!(id, 777);
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}
