use chrono::{DateTime, Utc};
use common::{GrowthRate, LightLevel, Season};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

use crate::entity::{plant, plant_image};

use super::shared::{NOT_NULL_MESSAGE, Pagination, Violations, double_option, fixed_scale, narrow};

pub const TEMPERATURE_MIN: i64 = -20;
pub const TEMPERATURE_MAX: i64 = 50;

/// Full plant body for create and replace. Absent fields take their declared default.
#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct PlantRequest {
    #[schema(example = "Peace Lily")]
    pub common_name: String,
    #[schema(example = "Spathiphyllum wallisii")]
    pub scientific_name: String,
    pub description: String,
    pub care_instructions: String,
    pub planting_instructions: String,
    /// One of `low`, `medium`, `high`.
    #[schema(example = "medium")]
    pub light_requirement: String,
    /// One of `low`, `medium`, `high`.
    #[schema(example = "medium")]
    pub water_requirement: String,
    /// Celsius, -20..=50.
    pub temperature_min: i64,
    /// Celsius, -20..=50.
    pub temperature_max: i64,
    /// Percent, 0..=100.
    pub humidity_requirement: i64,
    pub soil_type: String,
    pub fertilizer_requirements: String,
    /// Centimeters.
    #[schema(value_type = String, example = "60.00")]
    pub mature_height: Decimal,
    /// Centimeters.
    #[schema(value_type = String, example = "45.00")]
    pub mature_spread: Decimal,
    /// One of `slow`, `medium`, `fast`.
    pub growth_rate: String,
    pub time_to_maturity: String,
    /// A season value, or `""`/`null` for none.
    pub flowering_season: Option<String>,
    pub flowering_color: String,
    /// A season value, or `""`/`null` for none.
    pub fruiting_season: Option<String>,
    pub fragrant: bool,
    pub hardiness_zone: String,
    pub native_region: String,
    pub drought_tolerant: bool,
    pub deer_resistant: bool,
    pub pest_resistant: bool,
    pub edible: bool,
    pub indoor_suitable: bool,
    #[schema(value_type = String, example = "24.99")]
    pub price: Decimal,
    pub quantity: i64,
    pub featured: bool,
}

impl Default for PlantRequest {
    fn default() -> Self {
        Self {
            common_name: String::new(),
            scientific_name: String::new(),
            description: String::new(),
            care_instructions: String::new(),
            planting_instructions: String::new(),
            light_requirement: LightLevel::default().as_str().to_string(),
            water_requirement: LightLevel::default().as_str().to_string(),
            temperature_min: 0,
            temperature_max: 30,
            humidity_requirement: 50,
            soil_type: String::new(),
            fertilizer_requirements: String::new(),
            mature_height: Decimal::ZERO,
            mature_spread: Decimal::ZERO,
            growth_rate: GrowthRate::default().as_str().to_string(),
            time_to_maturity: String::new(),
            flowering_season: None,
            flowering_color: String::new(),
            fruiting_season: None,
            fragrant: false,
            hardiness_zone: String::new(),
            native_region: String::new(),
            drought_tolerant: false,
            deer_resistant: false,
            pest_resistant: false,
            edible: false,
            indoor_suitable: false,
            price: Decimal::ZERO,
            quantity: 0,
            featured: false,
        }
    }
}

impl From<&plant::Model> for PlantRequest {
    fn from(m: &plant::Model) -> Self {
        Self {
            common_name: m.common_name.clone(),
            scientific_name: m.scientific_name.clone(),
            description: m.description.clone(),
            care_instructions: m.care_instructions.clone(),
            planting_instructions: m.planting_instructions.clone(),
            light_requirement: m.light_requirement.as_str().to_string(),
            water_requirement: m.water_requirement.as_str().to_string(),
            temperature_min: m.temperature_min.into(),
            temperature_max: m.temperature_max.into(),
            humidity_requirement: m.humidity_requirement.into(),
            soil_type: m.soil_type.clone(),
            fertilizer_requirements: m.fertilizer_requirements.clone(),
            mature_height: m.mature_height,
            mature_spread: m.mature_spread,
            growth_rate: m.growth_rate.as_str().to_string(),
            time_to_maturity: m.time_to_maturity.clone(),
            flowering_season: m.flowering_season.map(|s| s.as_str().to_string()),
            flowering_color: m.flowering_color.clone(),
            fruiting_season: m.fruiting_season.map(|s| s.as_str().to_string()),
            fragrant: m.fragrant,
            hardiness_zone: m.hardiness_zone.clone(),
            native_region: m.native_region.clone(),
            drought_tolerant: m.drought_tolerant,
            deer_resistant: m.deer_resistant,
            pest_resistant: m.pest_resistant,
            edible: m.edible,
            indoor_suitable: m.indoor_suitable,
            price: m.price,
            quantity: m.quantity.into(),
            featured: m.featured,
        }
    }
}

/// Partial plant body. Only present fields are applied.
///
/// Every field but the seasons is non-nullable; an explicit `null` is a violation.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct PlantPatchRequest {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub common_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub scientific_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub care_instructions: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub planting_instructions: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub light_requirement: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub water_requirement: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub temperature_min: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub temperature_max: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub humidity_requirement: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub soil_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub fertilizer_requirements: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub mature_height: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub mature_spread: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub growth_rate: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub time_to_maturity: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub flowering_season: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub flowering_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub fruiting_season: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<bool>)]
    pub fragrant: Option<Option<bool>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub hardiness_zone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub native_region: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<bool>)]
    pub drought_tolerant: Option<Option<bool>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<bool>)]
    pub deer_resistant: Option<Option<bool>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<bool>)]
    pub pest_resistant: Option<Option<bool>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<bool>)]
    pub edible: Option<Option<bool>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<bool>)]
    pub indoor_suitable: Option<Option<bool>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub quantity: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<bool>)]
    pub featured: Option<Option<bool>>,
}

macro_rules! overlay {
    ($patch:ident, $target:ident, $v:ident, [$($field:ident),+ $(,)?]) => {
        $(match $patch.$field {
            Some(Some(value)) => $target.$field = value,
            Some(None) => $v.add(stringify!($field), NOT_NULL_MESSAGE),
            None => {}
        })+
    };
}

impl PlantPatchRequest {
    /// Overlay the present fields onto a full body, recording explicit nulls in `v`.
    pub fn apply_to(self, target: &mut PlantRequest, v: &mut Violations) {
        let patch = self;
        overlay!(
            patch,
            target,
            v,
            [
                common_name,
                scientific_name,
                description,
                care_instructions,
                planting_instructions,
                light_requirement,
                water_requirement,
                temperature_min,
                temperature_max,
                humidity_requirement,
                soil_type,
                fertilizer_requirements,
                mature_height,
                mature_spread,
                growth_rate,
                time_to_maturity,
                flowering_color,
                fragrant,
                hardiness_zone,
                native_region,
                drought_tolerant,
                deer_resistant,
                pest_resistant,
                edible,
                indoor_suitable,
                price,
                quantity,
                featured,
            ]
        );
        if let Some(season) = patch.flowering_season {
            target.flowering_season = season;
        }
        if let Some(season) = patch.fruiting_season {
            target.fruiting_season = season;
        }
    }
}

/// A plant body that passed validation, with vocabularies parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantDraft {
    pub common_name: String,
    pub scientific_name: String,
    pub description: String,
    pub care_instructions: String,
    pub planting_instructions: String,
    pub light_requirement: LightLevel,
    pub water_requirement: LightLevel,
    pub temperature_min: i32,
    pub temperature_max: i32,
    pub humidity_requirement: i32,
    pub soil_type: String,
    pub fertilizer_requirements: String,
    pub mature_height: Decimal,
    pub mature_spread: Decimal,
    pub growth_rate: GrowthRate,
    pub time_to_maturity: String,
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
    pub price: Decimal,
    pub quantity: i32,
    pub featured: bool,
}

fn season(v: &mut Violations, field: &str, raw: Option<&str>) -> Option<Season> {
    match Season::parse_blankable(raw.unwrap_or_default()) {
        Ok(season) => season,
        Err(e) => {
            v.add(field, e.to_string());
            None
        }
    }
}

/// Validate a full plant body, recording every violation in `v`.
///
/// The returned draft is only meaningful when `v` stays empty.
pub fn validate_plant(req: &PlantRequest, v: &mut Violations) -> PlantDraft {
    let common_name = v.text("common_name", &req.common_name, 100, true);
    let scientific_name = v.text("scientific_name", &req.scientific_name, 100, true);
    let description = v.long_text("description", &req.description, true);

    let light_requirement = v
        .choice("light_requirement", &req.light_requirement)
        .unwrap_or_default();
    let water_requirement = v
        .choice("water_requirement", &req.water_requirement)
        .unwrap_or_default();

    v.range("temperature_min", req.temperature_min, TEMPERATURE_MIN, TEMPERATURE_MAX);
    v.range("temperature_max", req.temperature_max, TEMPERATURE_MIN, TEMPERATURE_MAX);
    v.range("humidity_requirement", req.humidity_requirement, 0, 100);

    let soil_type = v.text("soil_type", &req.soil_type, 200, false);

    v.decimal("mature_height", req.mature_height, 5, 2);
    v.decimal("mature_spread", req.mature_spread, 5, 2);
    let growth_rate = v.choice("growth_rate", &req.growth_rate).unwrap_or_default();
    let time_to_maturity = v.text("time_to_maturity", &req.time_to_maturity, 100, false);

    let flowering_season = season(v, "flowering_season", req.flowering_season.as_deref());
    let flowering_color = v.text("flowering_color", &req.flowering_color, 100, false);
    let fruiting_season = season(v, "fruiting_season", req.fruiting_season.as_deref());

    let hardiness_zone = v.text("hardiness_zone", &req.hardiness_zone, 50, false);
    let native_region = v.text("native_region", &req.native_region, 200, false);

    v.decimal("price", req.price, 10, 2);
    v.non_negative("quantity", req.quantity);

    PlantDraft {
        common_name,
        scientific_name,
        description,
        care_instructions: req.care_instructions.trim().to_string(),
        planting_instructions: req.planting_instructions.trim().to_string(),
        light_requirement,
        water_requirement,
        temperature_min: narrow(req.temperature_min),
        temperature_max: narrow(req.temperature_max),
        humidity_requirement: narrow(req.humidity_requirement),
        soil_type,
        fertilizer_requirements: req.fertilizer_requirements.trim().to_string(),
        mature_height: req.mature_height,
        mature_spread: req.mature_spread,
        growth_rate,
        time_to_maturity,
        flowering_season,
        flowering_color,
        fruiting_season,
        fragrant: req.fragrant,
        hardiness_zone,
        native_region,
        drought_tolerant: req.drought_tolerant,
        deer_resistant: req.deer_resistant,
        pest_resistant: req.pest_resistant,
        edible: req.edible,
        indoor_suitable: req.indoor_suitable,
        price: req.price,
        quantity: narrow(req.quantity),
        featured: req.featured,
    }
}

impl PlantDraft {
    /// Write every catalog attribute into `active` and bump `updated_at`.
    pub fn apply(self, active: &mut plant::ActiveModel, now: DateTime<Utc>) {
        active.common_name = Set(self.common_name);
        active.scientific_name = Set(self.scientific_name);
        active.description = Set(self.description);
        active.care_instructions = Set(self.care_instructions);
        active.planting_instructions = Set(self.planting_instructions);
        active.light_requirement = Set(self.light_requirement);
        active.water_requirement = Set(self.water_requirement);
        active.temperature_min = Set(self.temperature_min);
        active.temperature_max = Set(self.temperature_max);
        active.humidity_requirement = Set(self.humidity_requirement);
        active.soil_type = Set(self.soil_type);
        active.fertilizer_requirements = Set(self.fertilizer_requirements);
        active.mature_height = Set(self.mature_height);
        active.mature_spread = Set(self.mature_spread);
        active.growth_rate = Set(self.growth_rate);
        active.time_to_maturity = Set(self.time_to_maturity);
        active.flowering_season = Set(self.flowering_season);
        active.flowering_color = Set(self.flowering_color);
        active.fruiting_season = Set(self.fruiting_season);
        active.fragrant = Set(self.fragrant);
        active.hardiness_zone = Set(self.hardiness_zone);
        active.native_region = Set(self.native_region);
        active.drought_tolerant = Set(self.drought_tolerant);
        active.deer_resistant = Set(self.deer_resistant);
        active.pest_resistant = Set(self.pest_resistant);
        active.edible = Set(self.edible);
        active.indoor_suitable = Set(self.indoor_suitable);
        active.price = Set(self.price);
        active.quantity = Set(self.quantity);
        active.featured = Set(self.featured);
        active.updated_at = Set(now);
    }

    /// A fresh row attributed to `created_by`.
    pub fn into_new(self, created_by: Option<i32>, now: DateTime<Utc>) -> plant::ActiveModel {
        let mut active = plant::ActiveModel {
            main_image: Set(None),
            created_by: Set(created_by),
            created_at: Set(now),
            ..Default::default()
        };
        self.apply(&mut active, now);
        active
    }
}

/// Plant category filter. Anything but `indoor`/`outdoor` means no filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantCategory {
    Indoor,
    Outdoor,
}

impl PlantCategory {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "indoor" => Some(Self::Indoor),
            "outdoor" => Some(Self::Outdoor),
            _ => None,
        }
    }

    pub fn indoor_suitable(self) -> bool {
        matches!(self, Self::Indoor)
    }
}

/// Image as embedded in a plant, without any link back to plants.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PlantImageResponse {
    pub id: i32,
    /// Relative media path, served under the media URL prefix.
    #[schema(example = "plants/additional/3f7a...c2.jpg")]
    pub image: String,
    pub caption: String,
}

impl From<plant_image::Model> for PlantImageResponse {
    fn from(m: plant_image::Model) -> Self {
        Self {
            id: m.id,
            image: m.image,
            caption: m.caption,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PlantResponse {
    pub id: i32,
    pub common_name: String,
    pub scientific_name: String,
    pub description: String,
    pub care_instructions: String,
    pub planting_instructions: String,
    pub light_requirement: LightLevel,
    pub water_requirement: LightLevel,
    pub temperature_min: i32,
    pub temperature_max: i32,
    pub humidity_requirement: i32,
    pub soil_type: String,
    pub fertilizer_requirements: String,
    #[schema(value_type = String, example = "60.00")]
    pub mature_height: Decimal,
    #[schema(value_type = String, example = "45.00")]
    pub mature_spread: Decimal,
    pub growth_rate: GrowthRate,
    pub time_to_maturity: String,
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
    /// Relative media path of the main image, if any.
    pub main_image: Option<String>,
    pub additional_images: Vec<PlantImageResponse>,
    #[schema(value_type = String, example = "24.99")]
    pub price: Decimal,
    pub quantity: i32,
    pub featured: bool,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlantResponse {
    pub fn new(m: plant::Model, images: Vec<plant_image::Model>) -> Self {
        Self {
            id: m.id,
            common_name: m.common_name,
            scientific_name: m.scientific_name,
            description: m.description,
            care_instructions: m.care_instructions,
            planting_instructions: m.planting_instructions,
            light_requirement: m.light_requirement,
            water_requirement: m.water_requirement,
            temperature_min: m.temperature_min,
            temperature_max: m.temperature_max,
            humidity_requirement: m.humidity_requirement,
            soil_type: m.soil_type,
            fertilizer_requirements: m.fertilizer_requirements,
            mature_height: fixed_scale(m.mature_height, 2),
            mature_spread: fixed_scale(m.mature_spread, 2),
            growth_rate: m.growth_rate,
            time_to_maturity: m.time_to_maturity,
            flowering_season: m.flowering_season,
            flowering_color: m.flowering_color,
            fruiting_season: m.fruiting_season,
            fragrant: m.fragrant,
            hardiness_zone: m.hardiness_zone,
            native_region: m.native_region,
            drought_tolerant: m.drought_tolerant,
            deer_resistant: m.deer_resistant,
            pest_resistant: m.pest_resistant,
            edible: m.edible,
            indoor_suitable: m.indoor_suitable,
            main_image: m.main_image,
            additional_images: images.into_iter().map(Into::into).collect(),
            price: fixed_scale(m.price, 2),
            quantity: m.quantity,
            featured: m.featured,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PlantListResponse {
    pub data: Vec<PlantResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PlantListQuery {
    /// Case-insensitive substring of the common or scientific name.
    pub search: Option<String>,
    /// `indoor` or `outdoor`; other values are ignored.
    pub category: Option<String>,
    pub light_requirement: Option<String>,
    pub water_requirement: Option<String>,
    pub growth_rate: Option<String>,
    pub flowering_season: Option<String>,
    pub featured: Option<bool>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// `common_name` (default), `scientific_name`, `price`, `created_at` or `updated_at`.
    pub sort_by: Option<String>,
    /// `asc` (default) or `desc`.
    pub sort_order: Option<String>,
}
