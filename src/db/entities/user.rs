use base_model_derive::base_model;
use sea_orm::entity::prelude::*;

#[base_model]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(unique)]
    pub email: String,
    #[schema(requires = "admin")]
    pub password_hash: String,
    pub display_name: String,
    /// Bitmask of capability ids, decoded through `PermissionSet::from_bits`.
    pub permissions: i64,
    #[sea_orm(has_many)]
    pub posts: HasMany<super::post::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
