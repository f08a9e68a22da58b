use common::{GrowthRate, LightLevel, Season};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A catalog entry for a plant species or variety.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plant")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub common_name: String,
    /// Natural key used by seeding to avoid duplicates.
    pub scientific_name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Text")]
    pub care_instructions: String,
    #[sea_orm(column_type = "Text")]
    pub planting_instructions: String,

    pub light_requirement: LightLevel,
    pub water_requirement: LightLevel,
    pub temperature_min: i32, // celsius
    pub temperature_max: i32, // celsius
    pub humidity_requirement: i32, // percent
    pub soil_type: String,
    #[sea_orm(column_type = "Text")]
    pub fertilizer_requirements: String,

    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub mature_height: Decimal, // centimeters
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub mature_spread: Decimal, // centimeters
    pub growth_rate: GrowthRate,
    pub time_to_maturity: String,

    /// NULL when the plant has no flowering season.
    pub flowering_season: Option<Season>,
    pub flowering_color: String,
    pub fruiting_season: Option<Season>,
    pub fragrant: bool,

    pub hardiness_zone: String,
    pub native_region: String,
    pub drought_tolerant: bool,
    pub deer_resistant: bool,
    pub pest_resistant: bool,
    pub edible: bool,
    pub indoor_suitable: bool,

    /// Relative media path of the main image.
    pub main_image: Option<String>,

    #[sea_orm(has_many, via = "plant_additional_image")]
    pub additional_images: HasMany<super::plant_image::Entity>,

    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    pub quantity: i32,
    pub featured: bool,

    #[sea_orm(has_many)]
    pub inventory: HasMany<super::plant_inventory::Entity>,

    pub created_by: Option<i32>,
    #[sea_orm(belongs_to, from = "created_by", to = "id", on_delete = "SetNull")]
    pub creator: HasOne<super::user::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
