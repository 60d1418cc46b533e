//! Tests for the social resources.

use crate::db::SocialPlatform;
use crate::resources::fixtures::*;
use crate::resources::{
    SocialConnectionFilters, SocialConnectionResource, SocialPostFilters, SocialPostResource,
};

#[tokio::test(flavor = "multi_thread")]
async fn connections_filter_by_platform_and_active() {
    let db = setup_db().await;
    let pool = db.pool();

    insert_social_connection(pool, "linkedin", "atelier-studio", true).await;
    insert_social_connection(pool, "linkedin", "old-account", false).await;
    insert_social_connection(pool, "twitter", "atelier", true).await;

    let filters = SocialConnectionFilters {
        platform: Some("linkedin".into()),
        is_active: Some(true),
        ..Default::default()
    };
    let page = SocialConnectionResource::new(pool)
        .list(&filters)
        .await
        .expect("List should succeed");

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].account_name, "atelier-studio");
    assert_eq!(page.data[0].platform, SocialPlatform::Linkedin);
}

#[tokio::test(flavor = "multi_thread")]
async fn posts_carry_account_name_and_due_flag() {
    let db = setup_db().await;
    let pool = db.pool();

    let connection = insert_social_connection(pool, "linkedin", "atelier-studio", true).await;
    insert_social_post(
        pool, Some(connection), "Past due post", "scheduled", Some("2020-01-01 08:00:00"),
    )
    .await;
    insert_social_post(
        pool, Some(connection), "Future post", "scheduled", Some("2099-01-01 08:00:00"),
    )
    .await;
    insert_social_post(pool, Some(connection), "Already out", "published", None).await;

    let page = SocialPostResource::new(pool)
        .list(&SocialPostFilters::default())
        .await
        .expect("List should succeed");

    let by_content = |content: &str| {
        page.data
            .iter()
            .find(|p| p.content == content)
            .unwrap_or_else(|| panic!("post {} missing", content))
    };
    assert!(by_content("Past due post").is_due);
    assert!(!by_content("Future post").is_due);
    assert!(!by_content("Already out").is_due);
    assert_eq!(
        by_content("Past due post").account_name.as_deref(),
        Some("atelier-studio")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn posts_filter_by_platform_and_status() {
    let db = setup_db().await;
    let pool = db.pool();

    let linkedin = insert_social_connection(pool, "linkedin", "a", true).await;
    let twitter = insert_social_connection(pool, "twitter", "b", true).await;
    insert_social_post(pool, Some(linkedin), "LI scheduled", "scheduled", None).await;
    insert_social_post(pool, Some(twitter), "TW scheduled", "scheduled", None).await;
    insert_social_post(pool, Some(linkedin), "LI draft", "draft", None).await;

    let filters = SocialPostFilters {
        platform: Some("linkedin".into()),
        status: Some("scheduled".into()),
        ..Default::default()
    };
    let page = SocialPostResource::new(pool)
        .list(&filters)
        .await
        .expect("List should succeed");

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].content, "LI scheduled");
}
