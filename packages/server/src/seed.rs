use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::*;
use tracing::info;

use crate::entity::{plant, user};
use crate::models::plant::{PlantRequest, validate_plant};
use crate::models::shared::Violations;
use crate::utils::hash;

/// Owner of the sample catalog. Its password is random and never handed out.
pub const SYSTEM_USERNAME: &str = "system";

fn sample_catalog() -> Vec<PlantRequest> {
    let plant = |common: &str, scientific: &str, description: &str, care: &str| PlantRequest {
        common_name: common.into(),
        scientific_name: scientific.into(),
        description: description.into(),
        care_instructions: care.into(),
        ..Default::default()
    };

    vec![
        PlantRequest {
            light_requirement: "medium".into(),
            water_requirement: "medium".into(),
            temperature_min: 0,
            temperature_max: 30,
            mature_height: Decimal::from(300),
            mature_spread: Decimal::from(250),
            ..plant(
                "Red Robin",
                "Photinia × fraseri",
                "Popular evergreen shrub with bright red young leaves.",
                "Regular watering, prune in spring for red growth.",
            )
        },
        PlantRequest {
            light_requirement: "high".into(),
            water_requirement: "low".into(),
            temperature_min: -5,
            temperature_max: 35,
            mature_height: Decimal::from(60),
            mature_spread: Decimal::from(60),
            fragrant: true,
            flowering_season: Some("summer".into()),
            flowering_color: "Purple".into(),
            drought_tolerant: true,
            deer_resistant: true,
            pest_resistant: true,
            edible: true,
            price: Decimal::new(899, 2),
            quantity: 40,
            featured: true,
            ..plant(
                "Lavender",
                "Lavandula angustifolia",
                "Fragrant perennial herb with purple flowers.",
                "Well-draining soil, trim after flowering.",
            )
        },
        PlantRequest {
            light_requirement: "low".into(),
            water_requirement: "medium".into(),
            temperature_min: 18,
            temperature_max: 30,
            humidity_requirement: 60,
            mature_height: Decimal::from(40),
            mature_spread: Decimal::from(40),
            flowering_season: Some("spring".into()),
            flowering_color: "White".into(),
            indoor_suitable: true,
            price: Decimal::new(2999, 2),
            quantity: 10,
            featured: true,
            ..plant(
                "Peace Lily",
                "Spathiphyllum wallisii",
                "Popular indoor plant with white flowers.",
                "Keep soil moist, medium to low light.",
            )
        },
        PlantRequest {
            light_requirement: "high".into(),
            water_requirement: "medium".into(),
            flowering_season: Some("summer".into()),
            flowering_color: "Purple".into(),
            drought_tolerant: true,
            deer_resistant: true,
            pest_resistant: true,
            price: Decimal::new(1299, 2),
            quantity: 25,
            featured: true,
            ..plant(
                "Purple Coneflower",
                "Echinacea purpurea",
                "Purple flowering perennial that attracts butterflies.",
                "Full sun, well-draining soil.",
            )
        },
        PlantRequest {
            light_requirement: "medium".into(),
            water_requirement: "low".into(),
            drought_tolerant: true,
            deer_resistant: true,
            pest_resistant: true,
            indoor_suitable: true,
            price: Decimal::new(1599, 2),
            quantity: 30,
            ..plant(
                "Jade Plant",
                "Crassula ovata",
                "Succulent with thick, woody stems and oval leaves.",
                "Bright indirect light, well-draining soil.",
            )
        },
        PlantRequest {
            light_requirement: "high".into(),
            water_requirement: "high".into(),
            growth_rate: "fast".into(),
            fruiting_season: Some("summer".into()),
            edible: true,
            price: Decimal::new(699, 2),
            quantity: 50,
            featured: true,
            ..plant(
                "Tomato Plant",
                "Solanum lycopersicum",
                "Vegetable plant that produces red fruits.",
                "Full sun, regular watering.",
            )
        },
        PlantRequest {
            light_requirement: "medium".into(),
            water_requirement: "medium".into(),
            growth_rate: "slow".into(),
            mature_height: Decimal::from(600),
            mature_spread: Decimal::from(500),
            price: Decimal::new(8999, 2),
            quantity: 5,
            featured: true,
            ..plant(
                "Japanese Maple",
                "Acer palmatum",
                "Elegant tree known for its red foliage.",
                "Partial shade, well-draining soil.",
            )
        },
    ]
}

/// Get or create the account that owns seeded rows.
async fn system_user(db: &DatabaseConnection) -> Result<user::Model, DbErr> {
    if let Some(existing) = user::Entity::find()
        .filter(user::Column::Username.eq(SYSTEM_USERNAME))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let secret = hex::encode(rand::random::<[u8; 32]>());
    let password = hash::hash_password(&secret)
        .map_err(|e| DbErr::Custom(format!("Password hash error: {e}")))?;

    let model = user::ActiveModel {
        username: Set(SYSTEM_USERNAME.to_string()),
        password: Set(password),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let result = user::Entity::insert(model)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;
    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e),
    }

    user::Entity::find()
        .filter(user::Column::Username.eq(SYSTEM_USERNAME))
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(SYSTEM_USERNAME.into()))
}

/// Load the sample catalog, skipping plants whose scientific name already exists.
///
/// Returns the number of plants created.
pub async fn seed_sample_catalog(db: &DatabaseConnection) -> Result<usize, DbErr> {
    let owner = system_user(db).await?;
    let now = Utc::now();
    let mut created = 0usize;

    for sample in sample_catalog() {
        let exists = plant::Entity::find()
            .filter(plant::Column::ScientificName.eq(sample.scientific_name.as_str()))
            .count(db)
            .await?
            > 0;
        if exists {
            continue;
        }

        let mut v = Violations::default();
        let draft = validate_plant(&sample, &mut v);
        if !v.is_empty() {
            return Err(DbErr::Custom(format!(
                "invalid sample plant {}: {:?}",
                sample.scientific_name,
                v.into_errors()
            )));
        }

        draft.into_new(Some(owner.id), now).insert(db).await?;
        created += 1;
    }

    if created > 0 {
        info!("Seeded {} sample plants", created);
    }
    Ok(created)
}
