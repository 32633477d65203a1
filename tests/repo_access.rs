use std::sync::Arc;

use chrono::{FixedOffset, TimeZone};
use sea_orm::{
    ColumnTrait, Condition, DatabaseBackend, DatabaseConnection, DbErr, MockDatabase,
    MockExecResult, Set,
};
use uuid::Uuid;

use cms_backend::db::entities::{all_shapes, api_key, post, user};
use cms_backend::db::repo::{RepoContext, RepoError};
use cms_backend::permissions::{PermissionRegistry, PermissionSet, register_builtin_capabilities};
use cms_backend::schema::SchemaCatalog;

fn context(db: &DatabaseConnection) -> (RepoContext, Arc<PermissionRegistry>) {
    let registry = Arc::new(PermissionRegistry::new());
    register_builtin_capabilities(&registry).expect("register builtin capabilities");
    let catalog = Arc::new(SchemaCatalog::build(all_shapes()).expect("build schema catalog"));
    let context = RepoContext::new(db, catalog, Arc::clone(&registry));
    (context, registry)
}

fn ts() -> chrono::DateTime<chrono::FixedOffset> {
    FixedOffset::east_opt(0)
        .expect("offset should be valid")
        .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .expect("timestamp should be valid")
}

fn post_model(id: Uuid, title: &str) -> post::Model {
    let now = ts();
    post::Model {
        id,
        created_at: now,
        updated_at: now,
        deleted_at: None,
        kind: "blog".to_string(),
        body: "Body".to_string(),
        title: title.to_string(),
        author_id: Uuid::new_v4(),
    }
}

fn user_model(id: Uuid, email: &str) -> user::Model {
    let now = ts();
    user::Model {
        id,
        created_at: now,
        updated_at: now,
        deleted_at: None,
        email: email.to_string(),
        password_hash: "hash".to_string(),
        display_name: "User".to_string(),
        permissions: 0,
    }
}

fn key_model(id: Uuid) -> api_key::Model {
    let now = ts();
    api_key::Model {
        id,
        created_at: now,
        updated_at: now,
        deleted_at: None,
        key: "k".repeat(64),
        owner_email: "ops@example.com".to_string(),
        expires_at: 4_102_444_800,
    }
}

#[tokio::test]
async fn get_with_no_match_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();
    let (context, _) = context(&db);
    let posts = context.posts().expect("posts repo");

    let err = posts
        .get(&PermissionSet::empty(), Condition::all().add(post::Column::Title.eq("ghost")))
        .await
        .expect_err("get should fail");
    assert!(matches!(err, RepoError::NotFound { ref entity } if entity == "Post"));
}

#[tokio::test]
async fn get_with_one_match_returns_the_record() {
    let id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[post_model(id, "First")]])
        .into_connection();
    let (context, _) = context(&db);
    let posts = context.posts().expect("posts repo");

    let found = posts
        .get(&PermissionSet::empty(), Condition::all().add(post::Column::Title.eq("First")))
        .await
        .expect("get should succeed");
    assert_eq!(found.id, id);
}

#[tokio::test]
async fn get_with_two_matches_is_ambiguous() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[
            post_model(Uuid::new_v4(), "Same"),
            post_model(Uuid::new_v4(), "Same"),
        ]])
        .into_connection();
    let (context, _) = context(&db);
    let posts = context.posts().expect("posts repo");

    let err = posts
        .get(&PermissionSet::empty(), Condition::all().add(post::Column::Title.eq("Same")))
        .await
        .expect_err("get should fail");
    assert!(matches!(err, RepoError::Ambiguous { ref entity } if entity == "Post"));
}

#[tokio::test]
async fn get_by_id_reports_a_missing_record() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();
    let (context, _) = context(&db);
    let posts = context.posts().expect("posts repo");

    let err = posts
        .get_by_id(&PermissionSet::empty(), Uuid::new_v4())
        .await
        .expect_err("get_by_id should fail");
    assert!(matches!(err, RepoError::NotFound { .. }));
}

#[tokio::test]
async fn gated_entity_is_forbidden_before_any_query() {
    // Nothing is appended: reaching the database would surface a Db error,
    // not Forbidden.
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let (context, _) = context(&db);
    let keys = context.api_keys().expect("api keys repo");
    let anon = PermissionSet::empty();

    let err = keys
        .get(&anon, Condition::all())
        .await
        .expect_err("get should fail");
    assert!(matches!(
        err,
        RepoError::Forbidden { ref entity, ref capability }
            if entity == "ApiKey" && capability == "admin"
    ));

    let err = keys
        .delete(&anon, Condition::all())
        .await
        .expect_err("delete should fail");
    assert!(matches!(err, RepoError::Forbidden { .. }));

    let err = keys
        .count(&anon, Condition::all())
        .await
        .expect_err("count should fail");
    assert!(matches!(err, RepoError::Forbidden { .. }));
}

#[tokio::test]
async fn granted_capability_unlocks_the_gated_entity() {
    let id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[key_model(id)]])
        .into_connection();
    let (context, registry) = context(&db);
    let keys = context.api_keys().expect("api keys repo");
    let admin = registry.resolve_set(["admin"]);

    let found = keys
        .get_by_id(&admin, id)
        .await
        .expect("get_by_id should succeed");
    assert_eq!(found.id, id);
}

#[tokio::test]
async fn create_rejects_gated_fields_before_any_insert() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let (context, _) = context(&db);
    let users = context.users().expect("users repo");

    let data = user::ActiveModel {
        email: Set("new@example.com".to_string()),
        password_hash: Set("secret".to_string()),
        display_name: Set("New User".to_string()),
        permissions: Set(0),
        ..Default::default()
    };
    let err = users
        .create(&PermissionSet::empty(), data)
        .await
        .expect_err("create should fail");
    assert!(matches!(
        err,
        RepoError::Forbidden { ref entity, ref capability }
            if entity == "User" && capability == "admin"
    ));
}

#[tokio::test]
async fn create_with_the_required_capability_inserts() {
    let id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[user_model(id, "new@example.com")]])
        .into_connection();
    let (context, registry) = context(&db);
    let users = context.users().expect("users repo");
    let admin = registry.resolve_set(["admin"]);

    let data = user::ActiveModel {
        email: Set("new@example.com".to_string()),
        password_hash: Set("secret".to_string()),
        display_name: Set("New User".to_string()),
        permissions: Set(0),
        ..Default::default()
    };
    let created = users
        .create(&admin, data)
        .await
        .expect("create should succeed");
    assert_eq!(created.email, "new@example.com");
}

#[tokio::test]
async fn update_without_an_id_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let (context, _) = context(&db);
    let posts = context.posts().expect("posts repo");

    let data = post::ActiveModel {
        title: Set("Renamed".to_string()),
        ..Default::default()
    };
    let err = posts
        .update(&PermissionSet::empty(), data)
        .await
        .expect_err("update should fail");
    assert!(matches!(err, RepoError::MissingId { ref entity } if entity == "Post"));
}

#[tokio::test]
async fn update_applies_set_fields_on_top_of_the_stored_record() {
    let id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([
            vec![post_model(id, "before")],
            vec![post_model(id, "after")],
        ])
        .into_connection();
    let (context, _) = context(&db);
    let posts = context.posts().expect("posts repo");

    let data = post::ActiveModel {
        id: Set(id),
        title: Set("after".to_string()),
        ..Default::default()
    };
    let updated = posts
        .update(&PermissionSet::empty(), data)
        .await
        .expect("update should succeed");
    assert_eq!(updated.id, id);
    assert_eq!(updated.title, "after");
}

#[tokio::test]
async fn update_of_a_missing_record_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();
    let (context, _) = context(&db);
    let posts = context.posts().expect("posts repo");

    let data = post::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set("Renamed".to_string()),
        ..Default::default()
    };
    let err = posts
        .update(&PermissionSet::empty(), data)
        .await
        .expect_err("update should fail");
    assert!(matches!(err, RepoError::NotFound { .. }));
}

#[tokio::test]
async fn update_of_a_gated_field_is_forbidden_before_any_query() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let (context, _) = context(&db);
    let users = context.users().expect("users repo");

    let data = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        password_hash: Set("secret".to_string()),
        ..Default::default()
    };
    let err = users
        .update(&PermissionSet::empty(), data)
        .await
        .expect_err("update should fail");
    assert!(matches!(
        err,
        RepoError::Forbidden { ref capability, .. } if capability == "admin"
    ));
}

#[tokio::test]
async fn delete_counts_newly_hidden_rows() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 3,
        }])
        .into_connection();
    let (context, _) = context(&db);
    let posts = context.posts().expect("posts repo");

    let removed = posts
        .delete(&PermissionSet::empty(), Condition::all().add(post::Column::Kind.eq("blog")))
        .await
        .expect("delete should succeed");
    assert_eq!(removed, 3);
}

#[tokio::test]
async fn purge_reports_physically_removed_rows() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 2,
        }])
        .into_connection();
    let (context, _) = context(&db);
    let posts = context.posts().expect("posts repo");

    let removed = posts
        .purge(&PermissionSet::empty(), Condition::all().add(post::Column::Kind.eq("blog")))
        .await
        .expect("purge should succeed");
    assert_eq!(removed, 2);
}

#[tokio::test]
async fn invalid_pagination_is_rejected_before_any_query() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let (context, _) = context(&db);
    let posts = context.posts().expect("posts repo");
    let anon = PermissionSet::empty();

    for (page, page_size) in [(0, 10), (1, 0), (1, 101)] {
        let err = posts
            .find_page(&anon, page, page_size, Condition::all())
            .await
            .expect_err("find_page should fail");
        assert!(matches!(
            err,
            RepoError::InvalidPagination { page: p, page_size: s } if p == page && s == page_size
        ));
    }
}

#[tokio::test]
async fn a_full_page_signals_another_and_truncates() {
    let ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[
            post_model(ids[0], "One"),
            post_model(ids[1], "Two"),
            post_model(ids[2], "Three"),
        ]])
        .into_connection();
    let (context, _) = context(&db);
    let posts = context.posts().expect("posts repo");

    let page = posts
        .find_page(&PermissionSet::empty(), 1, 2, Condition::all())
        .await
        .expect("find_page should succeed");
    assert_eq!(page.page, 1);
    assert_eq!(page.page_size, 2);
    assert!(page.has_next);
    let returned: Vec<Uuid> = page.data.iter().map(|model| model.id).collect();
    assert_eq!(returned, ids[..2]);
}

#[tokio::test]
async fn scan_stops_after_the_final_page_and_stays_exhausted() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([
            vec![
                post_model(Uuid::new_v4(), "One"),
                post_model(Uuid::new_v4(), "Two"),
                post_model(Uuid::new_v4(), "Three"),
            ],
            vec![post_model(Uuid::new_v4(), "Three")],
        ])
        .into_connection();
    let (context, _) = context(&db);
    let posts = context.posts().expect("posts repo");
    let anon = PermissionSet::empty();

    let mut scan = posts.find(&anon, Some(2), Condition::all());
    let first = scan
        .next_page()
        .await
        .expect("first page should succeed")
        .expect("first page should exist");
    assert_eq!(first.data.len(), 2);
    assert!(first.has_next);

    let second = scan
        .next_page()
        .await
        .expect("second page should succeed")
        .expect("second page should exist");
    assert_eq!(second.data.len(), 1);
    assert!(!second.has_next);

    // Only two result sets were appended; an exhausted scan never queries
    // again.
    assert!(scan.next_page().await.expect("scan should stay ok").is_none());
    assert!(scan.next_page().await.expect("scan should stay ok").is_none());
}

#[tokio::test]
async fn collect_all_gathers_every_page() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([
            vec![
                post_model(Uuid::new_v4(), "One"),
                post_model(Uuid::new_v4(), "Two"),
                post_model(Uuid::new_v4(), "Three"),
            ],
            vec![post_model(Uuid::new_v4(), "Three")],
        ])
        .into_connection();
    let (context, _) = context(&db);
    let posts = context.posts().expect("posts repo");

    let rows = posts
        .find(&PermissionSet::empty(), Some(2), Condition::all())
        .collect_all()
        .await
        .expect("collect_all should succeed");
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn database_errors_surface_as_db_failures() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([DbErr::Custom("lookup failed".to_string())])
        .into_connection();
    let (context, _) = context(&db);
    let posts = context.posts().expect("posts repo");

    let err = posts
        .get(&PermissionSet::empty(), Condition::all())
        .await
        .expect_err("get should fail");
    assert!(matches!(err, RepoError::Db(_)));
}
