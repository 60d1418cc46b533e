//! Tests for InvoiceResource.

use crate::db::InvoiceStatus;
use crate::resources::fixtures::*;
use crate::resources::{InvoiceFilters, InvoiceResource, ResourceError};

#[tokio::test(flavor = "multi_thread")]
async fn get_projects_lines_with_computed_totals() {
    let db = setup_db().await;
    let pool = db.pool();

    let client_id = insert_client(pool, "Dupont Industries", "active").await;
    let invoice_id = insert_invoice(
        pool, client_id, "INV-2025-001", "sent", "2025-05-01", Some("2025-05-31"), None, 0.0,
    )
    .await;
    insert_invoice_line(pool, invoice_id, "Design sprint", 3.0, 400.0, 20.0).await;
    insert_invoice_line(pool, invoice_id, "Hosting", 1.0, 120.0, 20.0).await;

    let detail = InvoiceResource::new(pool)
        .get(invoice_id)
        .await
        .expect("Get should succeed");

    assert_eq!(detail.lines.len(), 2);

    let design = &detail.lines[0];
    assert_eq!(design.total_ht, 1200.0);
    assert_eq!(design.total_vat, 240.0);
    assert_eq!(design.total_ttc, 1440.0);

    let hosting = &detail.lines[1];
    assert_eq!(hosting.total_ht, 120.0);
    assert_eq!(hosting.total_vat, 24.0);
    assert_eq!(hosting.total_ttc, 144.0);

    assert_eq!(detail.summary.total_ht, 1320.0);
    assert_eq!(detail.summary.total_vat, 264.0);
    assert_eq!(detail.summary.total_ttc, 1584.0);
    assert_eq!(detail.summary.amount_due, 1584.0);
    assert_eq!(detail.summary.client_name, "Dupont Industries");
}

#[tokio::test(flavor = "multi_thread")]
async fn amount_due_subtracts_payments() {
    let db = setup_db().await;
    let pool = db.pool();

    let client_id = insert_client(pool, "Acme", "active").await;
    let invoice_id = insert_invoice(
        pool, client_id, "INV-002", "sent", "2025-05-01", None, None, 500.0,
    )
    .await;
    insert_invoice_line(pool, invoice_id, "Retainer", 1.0, 1000.0, 0.0).await;

    let page = InvoiceResource::new(pool)
        .list(&InvoiceFilters::default())
        .await
        .expect("List should succeed");

    assert_eq!(page.data[0].total_ttc, 1000.0);
    assert_eq!(page.data[0].amount_paid, 500.0);
    assert_eq!(page.data[0].amount_due, 500.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn overdue_derivation_follows_status_and_due_date() {
    let db = setup_db().await;
    let pool = db.pool();

    let client_id = insert_client(pool, "Acme", "active").await;
    insert_invoice(pool, client_id, "I-late", "sent", "2025-01-01", Some("2020-01-01"), None, 0.0)
        .await;
    insert_invoice(
        pool, client_id, "I-paid", "paid", "2025-01-01", Some("2020-01-01"),
        Some("2025-02-01 10:00:00"), 0.0,
    )
    .await;
    insert_invoice(pool, client_id, "I-draft", "draft", "2025-01-01", Some("2020-01-01"), None, 0.0)
        .await;

    let page = InvoiceResource::new(pool)
        .list(&InvoiceFilters::default())
        .await
        .expect("List should succeed");

    let by_number = |number: &str| {
        page.data
            .iter()
            .find(|i| i.number == number)
            .unwrap_or_else(|| panic!("invoice {} missing", number))
    };
    assert!(by_number("I-late").is_overdue);
    assert!(!by_number("I-paid").is_overdue);
    assert!(!by_number("I-draft").is_overdue);
}

#[tokio::test(flavor = "multi_thread")]
async fn list_filters_by_status_client_and_issue_range() {
    let db = setup_db().await;
    let pool = db.pool();

    let a = insert_client(pool, "A", "active").await;
    let b = insert_client(pool, "B", "active").await;
    insert_invoice(pool, a, "I-a-sent", "sent", "2025-03-10", None, None, 0.0).await;
    insert_invoice(pool, a, "I-a-old", "sent", "2024-01-10", None, None, 0.0).await;
    insert_invoice(pool, a, "I-a-paid", "paid", "2025-03-12", None, None, 0.0).await;
    insert_invoice(pool, b, "I-b-sent", "sent", "2025-03-11", None, None, 0.0).await;

    let filters = InvoiceFilters {
        status: Some("sent".into()),
        client_id: Some(a),
        issued_from: Some("2025-01-01".into()),
        issued_to: Some("2025-12-31".into()),
        ..Default::default()
    };
    let page = InvoiceResource::new(pool)
        .list(&filters)
        .await
        .expect("List should succeed");

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].number, "I-a-sent");
    assert_eq!(page.data[0].status, InvoiceStatus::Sent);
    assert_eq!(page.pagination.total, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn invoice_without_lines_totals_zero() {
    let db = setup_db().await;
    let pool = db.pool();

    let client_id = insert_client(pool, "Acme", "active").await;
    let invoice_id =
        insert_invoice(pool, client_id, "I-empty", "draft", "2025-05-01", None, None, 0.0).await;

    let detail = InvoiceResource::new(pool)
        .get(invoice_id)
        .await
        .expect("Get should succeed");

    assert!(detail.lines.is_empty());
    assert_eq!(detail.summary.total_ttc, 0.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn get_missing_invoice_is_typed_not_found() {
    let db = setup_db().await;

    let err = InvoiceResource::new(db.pool()).get(12).await.unwrap_err();
    match err {
        ResourceError::NotFound { resource, id } => {
            assert_eq!(resource, "invoice");
            assert_eq!(id, 12);
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}
