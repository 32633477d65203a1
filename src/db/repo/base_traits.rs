pub trait HasCreatedAtColumn: sea_orm::EntityTrait {
    fn created_at_column() -> Self::Column;
}

pub trait HasSoftDeleteColumn: sea_orm::EntityTrait {
    fn deleted_at_column() -> Self::Column;
}

pub trait HasIdActiveModel {
    fn set_id(&mut self, id: uuid::Uuid);
    fn id(&self) -> Option<uuid::Uuid>;
}

pub trait TimestampedActiveModel {
    fn set_created_at(&mut self, ts: sea_orm::entity::prelude::DateTimeWithTimeZone);
    fn set_updated_at(&mut self, ts: sea_orm::entity::prelude::DateTimeWithTimeZone);
}

pub trait SoftDeleteActiveModel {
    fn set_deleted_at(&mut self, ts: Option<sea_orm::entity::prelude::DateTimeWithTimeZone>);
}
