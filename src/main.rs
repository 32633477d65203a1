use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use sea_orm::{ColumnTrait, Condition, Set};
use tower_http::trace::TraceLayer;

use cms_backend::{
    codegen,
    config::AppConfig,
    db,
    db::entities::{all_shapes, post, user},
    db::repo::RepoError,
    logging::init_tracing,
    permissions::{PermissionRegistry, PermissionSet, register_builtin_capabilities},
    routes::router,
    schema::SchemaCatalog,
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env().expect("failed to load config");
    init_tracing(&cfg.log_level);

    let permissions = Arc::new(PermissionRegistry::new());
    register_builtin_capabilities(&permissions)?;
    permissions.register("ViewPosts")?;

    let catalog = Arc::new(SchemaCatalog::build(all_shapes())?);
    tracing::info!("built schema catalog with {} entities", catalog.len());

    let db = db::connect(&cfg).await?;

    let state = AppState::new(&cfg, db, Arc::clone(&catalog), Arc::clone(&permissions));

    seed_demo_data(&state, &cfg).await?;

    let units = codegen::generate(catalog.descriptors(), &PermissionSet::empty(), &permissions)?;
    codegen::write_types_file(&cfg.types_out, &units).await?;
    tracing::info!("wrote client types to {}", cfg.types_out.display());

    let app = Router::new()
        .merge(router(Arc::clone(&state)))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .expect("invalid host/port");
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn seed_demo_data(state: &AppState, cfg: &AppConfig) -> anyhow::Result<()> {
    let users = state.repos.users()?;
    let admin_caps = state.permissions.full_set();

    let admin = match users
        .get(
            &admin_caps,
            Condition::all().add(user::Column::Email.eq(cfg.admin_email.as_str())),
        )
        .await
    {
        Ok(existing) => {
            tracing::info!("admin user already present: {}", existing.email);
            existing
        }
        Err(RepoError::NotFound { .. }) => {
            let created = users
                .create(
                    &admin_caps,
                    user::ActiveModel {
                        email: Set(cfg.admin_email.clone()),
                        password_hash: Set(String::new()),
                        display_name: Set("Administrator".to_string()),
                        permissions: Set(admin_caps.bits() as i64),
                        ..Default::default()
                    },
                )
                .await?;
            tracing::info!("seeded admin user {}", created.email);
            created
        }
        Err(err) => return Err(err.into()),
    };

    let posts = state.repos.posts()?;
    let seeded = posts
        .count(
            &admin_caps,
            Condition::all().add(post::Column::Title.eq("Test Post")),
        )
        .await?;
    if seeded == 0 {
        posts
            .create(
                &admin_caps,
                post::ActiveModel {
                    kind: Set("blog".to_string()),
                    title: Set("Test Post".to_string()),
                    body: Set("This is a test post".to_string()),
                    author_id: Set(admin.id),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!("seeded demo post");
    }

    Ok(())
}
