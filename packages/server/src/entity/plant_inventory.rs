use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A nursery's stocked offering of a catalog plant.
///
/// `(plant_id, nursery_id, size)` is unique at the database level.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plant_inventory")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "plant_nursery_size")]
    pub plant_id: i32,
    #[sea_orm(belongs_to, from = "plant_id", to = "id", on_delete = "Cascade")]
    pub plant: HasOne<super::plant::Entity>,

    #[sea_orm(unique_key = "plant_nursery_size")]
    pub nursery_id: i32,
    #[sea_orm(belongs_to, from = "nursery_id", to = "id", on_delete = "Cascade")]
    pub nursery: HasOne<super::user::Entity>,

    pub quantity: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    /// Free text such as "2 gallon" or "4 inch pot".
    #[sea_orm(unique_key = "plant_nursery_size")]
    pub size: String,
    #[sea_orm(column_type = "Text")]
    pub notes: String,
    pub seasonal_availability: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
