use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::db::entities::prelude::{ApiKey, Post, User};
use crate::permissions::PermissionRegistry;
use crate::schema::{HasModelShape, SchemaCatalog, SchemaError};

use super::base::Repo;

/// Hands out repositories wired to the shared connection, catalog and
/// capability registry.
#[derive(Clone)]
pub struct RepoContext {
    db: DatabaseConnection,
    catalog: Arc<SchemaCatalog>,
    registry: Arc<PermissionRegistry>,
}

impl RepoContext {
    pub fn new(
        db: &DatabaseConnection,
        catalog: Arc<SchemaCatalog>,
        registry: Arc<PermissionRegistry>,
    ) -> Self {
        Self {
            db: db.clone(),
            catalog,
            registry,
        }
    }

    /// Repository for any registered entity. Entities the catalog has never
    /// seen are rejected.
    pub fn repo<E>(&self) -> Result<Repo<E>, SchemaError>
    where
        E: sea_orm::EntityTrait + HasModelShape,
    {
        let shape = E::model_shape();
        match self.catalog.get(&shape.name) {
            Some(descriptor) => Ok(Repo::new(
                self.db.clone(),
                descriptor,
                Arc::clone(&self.registry),
            )),
            None => Err(SchemaError::UnknownEntity { entity: shape.name }),
        }
    }

    pub fn users(&self) -> Result<Repo<User>, SchemaError> {
        self.repo()
    }

    pub fn posts(&self) -> Result<Repo<Post>, SchemaError> {
        self.repo()
    }

    pub fn api_keys(&self) -> Result<Repo<ApiKey>, SchemaError> {
        self.repo()
    }
}
