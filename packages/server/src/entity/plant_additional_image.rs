use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plant_additional_image")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub plant_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub plant_image_id: i32,
    #[sea_orm(belongs_to, from = "plant_id", to = "id", on_delete = "Cascade")]
    pub plant: Option<super::plant::Entity>,
    #[sea_orm(belongs_to, from = "plant_image_id", to = "id", on_delete = "Cascade")]
    pub plant_image: Option<super::plant_image::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
