use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A captioned image that can be attached to any number of plants.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plant_image")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Relative media path of the stored file.
    pub image: String,
    pub caption: String,

    #[sea_orm(has_many, via = "plant_additional_image")]
    pub plants: HasMany<super::plant::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
