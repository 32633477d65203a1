use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ColumnTrait, Condition, ConnectOptions, Database, Set};
use uuid::Uuid;

use cms_backend::config::AppConfig;
use cms_backend::db::entities::{all_shapes, post, user};
use cms_backend::db::repo::{RepoContext, RepoError};
use cms_backend::permissions::{PermissionRegistry, register_builtin_capabilities};
use cms_backend::schema::SchemaCatalog;

async fn live_context() -> (RepoContext, Arc<PermissionRegistry>) {
    let cfg = AppConfig::from_env().expect("load app config");
    let mut opt = ConnectOptions::new(cfg.database_url.clone());
    opt.max_connections(cfg.db_max_connections)
        .min_connections(cfg.db_min_idle)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let db = Database::connect(opt).await.expect("connect to database");
    db.get_schema_registry("cms_backend::db::entities::*")
        .sync(&db)
        .await
        .expect("sync schema");

    let registry = Arc::new(PermissionRegistry::new());
    register_builtin_capabilities(&registry).expect("register builtin capabilities");
    let catalog = Arc::new(SchemaCatalog::build(all_shapes()).expect("build schema catalog"));
    let context = RepoContext::new(&db, catalog, Arc::clone(&registry));
    (context, registry)
}

async fn create_author(
    context: &RepoContext,
    admin: &cms_backend::permissions::PermissionSet,
) -> (user::Model, String) {
    let users = context.users().expect("users repo");
    let email = format!("author-{}@example.com", Uuid::new_v4());
    let author = users
        .create(
            admin,
            user::ActiveModel {
                email: Set(email.clone()),
                password_hash: Set(String::new()),
                display_name: Set("Author".to_string()),
                permissions: Set(0),
                ..Default::default()
            },
        )
        .await
        .expect("create author");
    (author, email)
}

#[tokio::test]
#[ignore = "requires Postgres database"]
async fn post_lifecycle_through_the_repo() {
    let (context, registry) = live_context().await;
    let admin = registry.full_set();
    let (author, email) = create_author(&context, &admin).await;
    assert!(author.deleted_at.is_none());

    let posts = context.posts().expect("posts repo");
    let title = format!("Test Post {}", Uuid::new_v4());
    let by_title = || Condition::all().add(post::Column::Title.eq(title.clone()));

    let err = posts
        .get(&admin, by_title())
        .await
        .expect_err("post should not exist yet");
    assert!(matches!(err, RepoError::NotFound { .. }));
    assert_eq!(posts.count(&admin, by_title()).await.expect("count"), 0);

    let created = posts
        .create(
            &admin,
            post::ActiveModel {
                kind: Set("blog".to_string()),
                body: Set("This is a test post".to_string()),
                title: Set(title.clone()),
                author_id: Set(author.id),
                ..Default::default()
            },
        )
        .await
        .expect("create post");
    assert!(created.deleted_at.is_none());
    assert_eq!(created.created_at, created.updated_at);

    let fetched = posts
        .get_by_id(&admin, created.id)
        .await
        .expect("fetch post by id");
    assert_eq!(fetched, created);

    let matched = posts.get(&admin, by_title()).await.expect("fetch post by title");
    assert_eq!(matched.id, created.id);
    assert_eq!(posts.count(&admin, by_title()).await.expect("count"), 1);

    let renamed = format!("{title} (renamed)");
    let updated = posts
        .update(
            &admin,
            post::ActiveModel {
                id: Set(created.id),
                title: Set(renamed.clone()),
                ..Default::default()
            },
        )
        .await
        .expect("update post");
    assert_eq!(updated.title, renamed);
    assert_eq!(updated.body, created.body);
    assert!(updated.updated_at >= created.updated_at);

    let by_renamed = || Condition::all().add(post::Column::Title.eq(renamed.clone()));
    let hidden = posts.delete(&admin, by_renamed()).await.expect("soft delete");
    assert_eq!(hidden, 1);

    let err = posts
        .get_by_id(&admin, created.id)
        .await
        .expect_err("soft-deleted post should be invisible");
    assert!(matches!(err, RepoError::NotFound { .. }));
    assert_eq!(posts.count(&admin, by_renamed()).await.expect("count"), 0);

    // A second delete finds no live rows left to hide.
    assert_eq!(posts.delete(&admin, by_renamed()).await.expect("repeat delete"), 0);

    // Purge is the only operation that sees the hidden row.
    assert_eq!(posts.purge(&admin, by_renamed()).await.expect("purge post"), 1);
    let users = context.users().expect("users repo");
    assert_eq!(
        users
            .purge(&admin, Condition::all().add(user::Column::Email.eq(email.clone())))
            .await
            .expect("purge author"),
        1
    );
}

#[tokio::test]
#[ignore = "requires Postgres database"]
async fn pagination_walks_live_rows_in_pages() {
    let (context, registry) = live_context().await;
    let admin = registry.full_set();
    let (author, email) = create_author(&context, &admin).await;

    let posts = context.posts().expect("posts repo");
    let marker = format!("batch-{}", Uuid::new_v4());
    let by_marker = || Condition::all().add(post::Column::Kind.eq(marker.clone()));

    let mut created_ids = Vec::new();
    for index in 0..3 {
        let model = posts
            .create(
                &admin,
                post::ActiveModel {
                    kind: Set(marker.clone()),
                    body: Set("Batch body".to_string()),
                    title: Set(format!("Batch Post {index}")),
                    author_id: Set(author.id),
                    ..Default::default()
                },
            )
            .await
            .expect("create batch post");
        created_ids.push(model.id);
    }

    let first = posts
        .find_page(&admin, 1, 2, by_marker())
        .await
        .expect("first page");
    assert_eq!(first.data.len(), 2);
    assert!(first.has_next);

    let second = posts
        .find_page(&admin, 2, 2, by_marker())
        .await
        .expect("second page");
    assert_eq!(second.data.len(), 1);
    assert!(!second.has_next);

    let mut seen: Vec<Uuid> = first
        .data
        .iter()
        .chain(second.data.iter())
        .map(|model| model.id)
        .collect();
    seen.sort();
    let mut expected = created_ids.clone();
    expected.sort();
    assert_eq!(seen, expected);

    let rows = posts
        .find(&admin, Some(2), by_marker())
        .collect_all()
        .await
        .expect("collect batch");
    assert_eq!(rows.len(), 3);

    // Two records matching one lookup is an error, not a pick.
    let twin_title = format!("Twin {}", Uuid::new_v4());
    for _ in 0..2 {
        posts
            .create(
                &admin,
                post::ActiveModel {
                    kind: Set(marker.clone()),
                    body: Set("Twin body".to_string()),
                    title: Set(twin_title.clone()),
                    author_id: Set(author.id),
                    ..Default::default()
                },
            )
            .await
            .expect("create twin post");
    }
    let err = posts
        .get(&admin, Condition::all().add(post::Column::Title.eq(twin_title.clone())))
        .await
        .expect_err("twin lookup should fail");
    assert!(matches!(err, RepoError::Ambiguous { .. }));

    assert_eq!(posts.purge(&admin, by_marker()).await.expect("purge batch"), 5);
    let users = context.users().expect("users repo");
    assert_eq!(
        users
            .purge(&admin, Condition::all().add(user::Column::Email.eq(email.clone())))
            .await
            .expect("purge author"),
        1
    );
}
