use std::sync::Arc;

use axum::Router;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};

use crate::{
    auth::{Claims, resolver::now_unix},
    config::AppConfig,
    db::entities::all_shapes,
    permissions::{PermissionRegistry, register_builtin_capabilities},
    routes::router,
    schema::SchemaCatalog,
    state::AppState,
};

pub const TEST_JWT_SECRET: &str = "test-secret";

pub fn test_state(db: DatabaseConnection) -> Arc<AppState> {
    let permissions = Arc::new(PermissionRegistry::new());
    register_builtin_capabilities(&permissions).expect("register builtin capabilities");
    permissions
        .register("ViewPosts")
        .expect("register ViewPosts capability");
    let catalog = Arc::new(SchemaCatalog::build(all_shapes()).expect("build schema catalog"));
    AppState::new(&test_config(), db, catalog, permissions)
}

pub fn test_router_with(db: DatabaseConnection) -> Router {
    router(test_state(db))
}

pub fn test_router() -> Router {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    test_router_with(db)
}

pub fn test_token(subject: &str, caps: &[&str]) -> String {
    let claims = Claims {
        sub: subject.to_string(),
        exp: now_unix() + 3600,
        iat: now_unix(),
        caps: caps.iter().map(|cap| cap.to_string()).collect(),
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("encode test token")
}

fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        log_level: "info".to_string(),
        database_url: String::new(),
        db_max_connections: 1,
        db_min_idle: 0,
        admin_email: "admin@example.com".to_string(),
        types_out: std::path::PathBuf::from("cms.types.ts"),
    }
}
