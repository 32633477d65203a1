use base_model_derive::base_model;
use sea_orm::entity::prelude::*;

#[base_model]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[schema(max_len = 100)]
    pub kind: String,
    #[schema(text)]
    pub body: String,
    #[sea_orm(indexed)]
    #[schema(max_len = 255)]
    pub title: String,
    #[sea_orm(indexed)]
    pub author_id: Uuid,
    #[sea_orm(belongs_to, from = "author_id", to = "id")]
    pub author: HasOne<super::user::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
