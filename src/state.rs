use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::auth::{IdentityResolver, JwtIdentityResolver};
use crate::config::AppConfig;
use crate::db::repo::RepoContext;
use crate::permissions::PermissionRegistry;
use crate::schema::SchemaCatalog;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub catalog: Arc<SchemaCatalog>,
    pub permissions: Arc<PermissionRegistry>,
    pub repos: RepoContext,
    pub identity: Arc<dyn IdentityResolver>,
}

impl AppState {
    pub fn new(
        cfg: &AppConfig,
        db: DatabaseConnection,
        catalog: Arc<SchemaCatalog>,
        permissions: Arc<PermissionRegistry>,
    ) -> Arc<Self> {
        let repos = RepoContext::new(&db, Arc::clone(&catalog), Arc::clone(&permissions));
        let identity: Arc<dyn IdentityResolver> = Arc::new(JwtIdentityResolver::new(
            &cfg.jwt_secret,
            Arc::clone(&permissions),
        ));
        Arc::new(Self {
            db,
            catalog,
            permissions,
            repos,
            identity,
        })
    }
}
