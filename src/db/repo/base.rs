use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, IdenStatic, IntoActiveModel, Iterable, PaginatorTrait, PrimaryKeyToColumn,
    PrimaryKeyTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use uuid::Uuid;

use crate::permissions::{PermissionRegistry, PermissionSet};
use crate::schema::{EntityDescriptor, is_base_field};

use super::base_traits::{
    HasCreatedAtColumn, HasIdActiveModel, HasSoftDeleteColumn, SoftDeleteActiveModel,
    TimestampedActiveModel,
};
use super::error::{RepoError, RepoResult};

#[derive(Debug, serde::Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub has_next: bool,
    pub total: Option<u64>,
}

/// Descriptor-driven repository over a single entity.
///
/// Every operation validates the caller's permission set against the entity
/// descriptor before the first storage round trip; a forbidden call never
/// reaches the database. Reads only see live rows, `delete` fills
/// `deleted_at` instead of removing rows, and `purge` is the one operation
/// that touches dead rows.
pub struct Repo<E>
where
    E: EntityTrait,
{
    db: DatabaseConnection,
    descriptor: Arc<EntityDescriptor>,
    registry: Arc<PermissionRegistry>,
    _entity: PhantomData<E>,
}

impl<E> Clone for Repo<E>
where
    E: EntityTrait,
{
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            descriptor: Arc::clone(&self.descriptor),
            registry: Arc::clone(&self.registry),
            _entity: PhantomData,
        }
    }
}

impl<E> Repo<E>
where
    E: EntityTrait,
{
    pub const MAX_PAGE_SIZE: u64 = 100;

    pub(crate) fn new(
        db: DatabaseConnection,
        descriptor: Arc<EntityDescriptor>,
        registry: Arc<PermissionRegistry>,
    ) -> Self {
        Self {
            db,
            descriptor,
            registry,
            _entity: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    fn not_found(&self) -> RepoError {
        RepoError::NotFound {
            entity: self.descriptor.name.clone(),
        }
    }

    fn check_entity(&self, held: &PermissionSet) -> RepoResult<()> {
        if let Some(capability) = self
            .registry
            .missing_capability(held, &self.descriptor.required_capabilities)
        {
            return Err(RepoError::Forbidden {
                entity: self.descriptor.name.clone(),
                capability: capability.to_string(),
            });
        }
        Ok(())
    }

    fn check_field(&self, held: &PermissionSet, field_name: &str) -> RepoResult<()> {
        if let Some(field) = self.descriptor.field(field_name)
            && let Some(capability) = self
                .registry
                .missing_capability(held, &field.required_capabilities)
        {
            return Err(RepoError::Forbidden {
                entity: self.descriptor.name.clone(),
                capability: capability.to_string(),
            });
        }
        Ok(())
    }
}

impl<E> Repo<E>
where
    E: EntityTrait + HasCreatedAtColumn + HasSoftDeleteColumn + Send + Sync,
    E::Model: FromQueryResult + IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E>
        + HasIdActiveModel
        + TimestampedActiveModel
        + SoftDeleteActiveModel
        + Send,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid> + Send + Sync,
{
    fn live(&self) -> Select<E> {
        E::find().filter(E::deleted_at_column().is_null())
    }

    /// Writable non-base columns carried as `Set` in `active`, after the
    /// per-field capability checks. Base columns are repo-owned and silently
    /// dropped here.
    fn writable_changes(
        &self,
        held: &PermissionSet,
        active: &E::ActiveModel,
    ) -> RepoResult<Vec<(E::Column, sea_orm::Value)>> {
        let mut changes = Vec::new();
        for column in E::Column::iter() {
            let name = column.as_str();
            if is_base_field(name) {
                continue;
            }
            if let ActiveValue::Set(value) = active.get(column) {
                self.check_field(held, name)?;
                changes.push((column, value));
            }
        }
        Ok(changes)
    }

    pub async fn create(
        &self,
        held: &PermissionSet,
        data: impl IntoActiveModel<E::ActiveModel> + Send,
    ) -> RepoResult<E::Model> {
        self.check_entity(held)?;
        let mut active = data.into_active_model();
        self.writable_changes(held, &active)?;

        let now = Utc::now().fixed_offset();
        active.set_id(Uuid::new_v4());
        active.set_created_at(now);
        active.set_updated_at(now);
        active.set_deleted_at(None);
        Ok(active.insert(&self.db).await?)
    }

    /// Single live record matching `filter`. Zero matches and more than one
    /// match are distinct failures.
    pub async fn get(&self, held: &PermissionSet, filter: Condition) -> RepoResult<E::Model> {
        self.check_entity(held)?;
        let mut rows = self
            .live()
            .filter(filter)
            .limit(2)
            .all(&self.db)
            .await?
            .into_iter();
        match (rows.next(), rows.next()) {
            (None, _) => Err(self.not_found()),
            (Some(model), None) => Ok(model),
            (Some(_), Some(_)) => Err(RepoError::Ambiguous {
                entity: self.descriptor.name.clone(),
            }),
        }
    }

    pub async fn get_by_id(&self, held: &PermissionSet, id: Uuid) -> RepoResult<E::Model> {
        self.check_entity(held)?;
        let model = E::find_by_id(id)
            .filter(E::deleted_at_column().is_null())
            .one(&self.db)
            .await?;
        model.ok_or_else(|| self.not_found())
    }

    pub async fn find_page(
        &self,
        held: &PermissionSet,
        page: u64,
        page_size: u64,
        filter: Condition,
    ) -> RepoResult<PaginatedResponse<E::Model>> {
        self.check_entity(held)?;
        if page == 0 || page_size == 0 || page_size > Self::MAX_PAGE_SIZE {
            return Err(RepoError::InvalidPagination { page, page_size });
        }

        // Tie-break on the primary key so rows with equal timestamps keep a
        // stable order across pages.
        let mut ordered = self
            .live()
            .filter(filter)
            .order_by_desc(E::created_at_column());
        if let Some(pk) = E::PrimaryKey::iter().next() {
            ordered = ordered.order_by_desc(pk.into_column());
        }

        let fetch_size = page_size.saturating_add(1);
        let offset = page.saturating_sub(1).saturating_mul(page_size);
        let mut data = ordered.limit(fetch_size).offset(offset).all(&self.db).await?;

        let has_next = data.len() > page_size as usize;
        if has_next {
            data.truncate(page_size as usize);
        }

        Ok(PaginatedResponse {
            data,
            page,
            page_size,
            has_next,
            total: None,
        })
    }

    /// Lazy scan over every live record matching `filter`. Nothing is fetched
    /// until the first `next_page` call, and an exhausted scan stays
    /// exhausted.
    pub fn find(&self, held: &PermissionSet, page_size: Option<u64>, filter: Condition) -> RepoScan<E> {
        RepoScan {
            repo: self.clone(),
            held: held.clone(),
            filter,
            page: 1,
            page_size: page_size.unwrap_or(Self::MAX_PAGE_SIZE),
            done: false,
        }
    }

    /// Applies the `Set` fields of `data` on top of the stored record. The id
    /// must be present; base columns supplied by the caller are ignored and
    /// `updated_at` is stamped here.
    pub async fn update(
        &self,
        held: &PermissionSet,
        data: impl IntoActiveModel<E::ActiveModel> + Send,
    ) -> RepoResult<E::Model> {
        self.check_entity(held)?;
        let incoming = data.into_active_model();
        let id = incoming.id().ok_or_else(|| RepoError::MissingId {
            entity: self.descriptor.name.clone(),
        })?;
        let changes = self.writable_changes(held, &incoming)?;

        let current = E::find_by_id(id)
            .filter(E::deleted_at_column().is_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| self.not_found())?;

        let mut active = current.into_active_model();
        for (column, value) in changes {
            active.set(column, value);
        }
        active.set_updated_at(Utc::now().fixed_offset());
        match active.update(&self.db).await {
            Ok(model) => Ok(model),
            Err(DbErr::RecordNotUpdated) => Err(self.not_found()),
            Err(err) => Err(err.into()),
        }
    }

    /// Soft-deletes every live record matching `filter` and reports how many
    /// rows were hidden.
    pub async fn delete(&self, held: &PermissionSet, filter: Condition) -> RepoResult<u64> {
        self.check_entity(held)?;
        let now = Utc::now().fixed_offset();
        let result = E::update_many()
            .col_expr(E::deleted_at_column(), Expr::value(now))
            .filter(filter)
            .filter(E::deleted_at_column().is_null())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Physically removes matching rows, soft-deleted ones included.
    pub async fn purge(&self, held: &PermissionSet, filter: Condition) -> RepoResult<u64> {
        self.check_entity(held)?;
        let result = E::delete_many().filter(filter).exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    pub async fn count(&self, held: &PermissionSet, filter: Condition) -> RepoResult<u64> {
        self.check_entity(held)?;
        Ok(self.live().filter(filter).count(&self.db).await?)
    }
}

pub struct RepoScan<E>
where
    E: EntityTrait,
{
    repo: Repo<E>,
    held: PermissionSet,
    filter: Condition,
    page: u64,
    page_size: u64,
    done: bool,
}

impl<E> RepoScan<E>
where
    E: EntityTrait + HasCreatedAtColumn + HasSoftDeleteColumn + Send + Sync,
    E::Model: FromQueryResult + IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E>
        + HasIdActiveModel
        + TimestampedActiveModel
        + SoftDeleteActiveModel
        + Send,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid> + Send + Sync,
{
    pub async fn next_page(&mut self) -> RepoResult<Option<PaginatedResponse<E::Model>>> {
        if self.done {
            return Ok(None);
        }

        let response = self
            .repo
            .find_page(&self.held, self.page, self.page_size, self.filter.clone())
            .await?;

        if !response.has_next {
            self.done = true;
        }
        self.page = self.page.saturating_add(1);

        Ok(Some(response))
    }

    pub async fn collect_all(mut self) -> RepoResult<Vec<E::Model>> {
        let mut rows = Vec::new();
        while let Some(page) = self.next_page().await? {
            rows.extend(page.data);
        }
        Ok(rows)
    }
}
