use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An account. Any user can act as a nursery by stocking inventory.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,

    #[sea_orm(has_many)]
    pub plants: HasMany<super::plant::Entity>,

    #[sea_orm(has_many)]
    pub inventory: HasMany<super::plant_inventory::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
