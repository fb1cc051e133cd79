use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub full_name: String,
    #[sea_orm(unique)]
    pub full_name_key: String, // normalised full name, one ticket per buyer
    #[sea_orm(indexed)]
    pub surname: String, // normalised first word of full_name
    pub ticket_type: String, // БАЗОВЫЙ, ВИП<n>, ОРГ
    pub price: i32,
    pub repost: bool,
    pub seller: String,
    pub passed_control_zone: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
