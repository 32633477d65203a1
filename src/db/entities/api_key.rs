use base_model_derive::base_model;
use sea_orm::entity::prelude::*;

#[base_model]
#[schema(requires = "admin")]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "api_keys")]
pub struct Model {
    #[sea_orm(unique)]
    #[schema(fixed_len = 64)]
    pub key: String,
    #[sea_orm(indexed)]
    #[schema(max_len = 100)]
    pub owner_email: String,
    #[sea_orm(indexed)]
    pub expires_at: i64,
}

impl ActiveModelBehavior for ActiveModel {}
