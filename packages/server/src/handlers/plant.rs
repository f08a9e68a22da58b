use std::collections::HashMap;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{GrowthRate, LightLevel, Season};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{plant, plant_additional_image, plant_image, plant_inventory};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::params::{AppPath, AppQuery};
use crate::models::plant::*;
use crate::models::shared::{Pagination, Violations, escape_like, page_bounds, page_offset};
use crate::state::AppState;

use super::image::release_media;

#[utoipa::path(
    get,
    path = "/",
    tag = "Plants",
    operation_id = "listPlants",
    summary = "List catalog plants",
    description = "Paginated plant listing. `search` matches common or scientific name \
        case-insensitively (ASCII letters only on SQLite). `category=indoor` keeps \
        indoor-suitable plants, `category=outdoor` the rest; any other category value is \
        ignored. Ordered by `common_name` unless `sort_by` says otherwise.",
    params(PlantListQuery),
    responses(
        (status = 200, description = "Page of plants", body = PlantListResponse),
        (status = 400, description = "Invalid filter or sort (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_plants(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PlantListQuery>,
) -> Result<Json<PlantListResponse>, AppError> {
    let (page, per_page) = page_bounds(query.page, query.per_page);
    let select = filtered_plants(&query, state.db.get_database_backend())?;

    let sort_column = match query.sort_by.as_deref().unwrap_or("common_name") {
        "common_name" => plant::Column::CommonName,
        "scientific_name" => plant::Column::ScientificName,
        "price" => plant::Column::Price,
        "created_at" => plant::Column::CreatedAt,
        "updated_at" => plant::Column::UpdatedAt,
        _ => {
            return Err(AppError::Validation(
                "sort_by must be one of: common_name, scientific_name, price, created_at, updated_at"
                    .into(),
            ));
        }
    };
    let sort_order = match query.sort_order.as_deref().unwrap_or("asc") {
        "asc" => Order::Asc,
        "desc" => Order::Desc,
        _ => {
            return Err(AppError::Validation(
                "sort_order must be one of: asc, desc".into(),
            ));
        }
    };

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let models = select
        .order_by(sort_column, sort_order)
        .order_by_asc(plant::Column::Id)
        .offset(Some(page_offset(page, per_page)))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let data = plant_responses(&state.db, models).await?;

    Ok(Json(PlantListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

/// Apply the search, category and vocabulary filters of a listing query.
///
/// SQLite folds ASCII case only, so there the term is matched as typed and
/// `LIKE` ignores ASCII case. Postgres lowercases both sides.
fn filtered_plants(
    query: &PlantListQuery,
    backend: DbBackend,
) -> Result<Select<plant::Entity>, AppError> {
    let mut select = plant::Entity::find();
    let mut v = Violations::default();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let matches = |column: plant::Column| match backend {
                DbBackend::Postgres => Expr::expr(Func::lower(Expr::col(column)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
                _ => Expr::col(column).like(LikeExpr::new(format!("%{term}%")).escape('\\')),
            };
            select = select.filter(
                Condition::any()
                    .add(matches(plant::Column::CommonName))
                    .add(matches(plant::Column::ScientificName)),
            );
        }
    }

    if let Some(category) = query.category.as_deref().and_then(PlantCategory::parse) {
        select = select.filter(plant::Column::IndoorSuitable.eq(category.indoor_suitable()));
    }

    if let Some(ref raw) = query.light_requirement
        && let Some(level) = v.choice::<LightLevel>("light_requirement", raw)
    {
        select = select.filter(plant::Column::LightRequirement.eq(level));
    }
    if let Some(ref raw) = query.water_requirement
        && let Some(level) = v.choice::<LightLevel>("water_requirement", raw)
    {
        select = select.filter(plant::Column::WaterRequirement.eq(level));
    }
    if let Some(ref raw) = query.growth_rate
        && let Some(rate) = v.choice::<GrowthRate>("growth_rate", raw)
    {
        select = select.filter(plant::Column::GrowthRate.eq(rate));
    }
    if let Some(ref raw) = query.flowering_season
        && let Some(season) = v.choice::<Season>("flowering_season", raw)
    {
        select = select.filter(plant::Column::FloweringSeason.eq(season));
    }
    if let Some(featured) = query.featured {
        select = select.filter(plant::Column::Featured.eq(featured));
    }

    v.finish()?;
    Ok(select)
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Plants",
    operation_id = "createPlant",
    summary = "Create a plant",
    description = "Creates a catalog plant attributed to the caller. Absent fields take their \
        declared defaults. Every violated field is reported.",
    request_body = PlantRequest,
    responses(
        (status = 201, description = "Plant created", body = PlantResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_plant(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<PlantRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut v = Violations::default();
    let draft = validate_plant(&payload, &mut v);
    v.finish()?;

    let model = draft
        .into_new(Some(auth_user.user_id), chrono::Utc::now())
        .insert(&state.db)
        .await?;

    tracing::info!(plant_id = model.id, "Plant created");
    Ok((
        StatusCode::CREATED,
        Json(PlantResponse::new(model, Vec::new())),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Plants",
    operation_id = "getPlant",
    summary = "Get a plant",
    params(("id" = i32, Path, description = "Plant ID")),
    responses(
        (status = 200, description = "Plant with its additional images", body = PlantResponse),
        (status = 404, description = "Plant not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_plant(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<PlantResponse>, AppError> {
    let model = find_plant(&state.db, id).await?;
    Ok(Json(plant_response(&state.db, model).await?))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Plants",
    operation_id = "replacePlant",
    summary = "Replace a plant",
    description = "Replaces every catalog attribute. Same validation and defaults as create.",
    params(("id" = i32, Path, description = "Plant ID")),
    request_body = PlantRequest,
    responses(
        (status = 200, description = "Plant updated", body = PlantResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Plant not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn replace_plant(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<PlantRequest>,
) -> Result<Json<PlantResponse>, AppError> {
    let existing = find_plant(&state.db, id).await?;
    save_plant(&state.db, existing, &payload, Violations::default())
        .await
        .map(Json)
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Plants",
    operation_id = "updatePlant",
    summary = "Partially update a plant",
    description = "Applies only the fields present in the body. Send `null` or `\"\"` to clear a season; \
        any other field set to `null` is a violation.",
    params(("id" = i32, Path, description = "Plant ID")),
    request_body = PlantPatchRequest,
    responses(
        (status = 200, description = "Plant updated", body = PlantResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Plant not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_plant(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<PlantPatchRequest>,
) -> Result<Json<PlantResponse>, AppError> {
    let existing = find_plant(&state.db, id).await?;
    let mut merged = PlantRequest::from(&existing);
    let mut v = Violations::default();
    payload.apply_to(&mut merged, &mut v);
    save_plant(&state.db, existing, &merged, v).await.map(Json)
}

/// Validate `body` on top of the violations already in `v`, then write it.
async fn save_plant(
    db: &DatabaseConnection,
    existing: plant::Model,
    body: &PlantRequest,
    mut v: Violations,
) -> Result<PlantResponse, AppError> {
    let draft = validate_plant(body, &mut v);
    v.finish()?;

    let mut active: plant::ActiveModel = existing.into();
    draft.apply(&mut active, chrono::Utc::now());
    let model = active.update(db).await?;

    plant_response(db, model).await
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Plants",
    operation_id = "deletePlant",
    summary = "Delete a plant",
    description = "Deletes the plant together with every inventory row that references it. \
        Images stay in the library; only their links to this plant are removed.",
    params(("id" = i32, Path, description = "Plant ID")),
    responses(
        (status = 204, description = "Plant deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Plant not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_plant(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    let txn = state.db.begin().await?;

    let existing = find_plant(&txn, id).await?;

    let removed_inventory = plant_inventory::Entity::delete_many()
        .filter(plant_inventory::Column::PlantId.eq(id))
        .exec(&txn)
        .await?
        .rows_affected;

    plant_additional_image::Entity::delete_many()
        .filter(plant_additional_image::Column::PlantId.eq(id))
        .exec(&txn)
        .await?;

    plant::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    if let Some(path) = existing.main_image {
        release_media(&state, &path).await?;
    }

    tracing::info!(removed_inventory, "Plant deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_plant<C: ConnectionTrait>(db: &C, id: i32) -> Result<plant::Model, AppError> {
    plant::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Plant not found".into()))
}

/// Load the additional images of every given plant with one batch query,
/// keyed by plant id and ordered by image id.
pub(crate) async fn images_by_plant<C: ConnectionTrait>(
    db: &C,
    plant_ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<plant_image::Model>>, AppError> {
    if plant_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let links = plant_additional_image::Entity::find()
        .filter(plant_additional_image::Column::PlantId.is_in(plant_ids))
        .all(db)
        .await?;
    if links.is_empty() {
        return Ok(HashMap::new());
    }

    let image_ids: Vec<i32> = links.iter().map(|l| l.plant_image_id).collect();
    let images: HashMap<i32, plant_image::Model> = plant_image::Entity::find()
        .filter(plant_image::Column::Id.is_in(image_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|img| (img.id, img))
        .collect();

    let mut grouped: HashMap<i32, Vec<plant_image::Model>> = HashMap::new();
    for link in links {
        if let Some(image) = images.get(&link.plant_image_id) {
            grouped.entry(link.plant_id).or_default().push(image.clone());
        }
    }
    for list in grouped.values_mut() {
        list.sort_by_key(|img| img.id);
    }
    Ok(grouped)
}

pub(crate) async fn plant_responses<C: ConnectionTrait>(
    db: &C,
    models: Vec<plant::Model>,
) -> Result<Vec<PlantResponse>, AppError> {
    let mut images = images_by_plant(db, models.iter().map(|m| m.id).collect()).await?;
    Ok(models
        .into_iter()
        .map(|m| {
            let own = images.remove(&m.id).unwrap_or_default();
            PlantResponse::new(m, own)
        })
        .collect())
}

pub(crate) async fn plant_response<C: ConnectionTrait>(
    db: &C,
    model: plant::Model,
) -> Result<PlantResponse, AppError> {
    let mut images = images_by_plant(db, vec![model.id]).await?;
    let own = images.remove(&model.id).unwrap_or_default();
    Ok(PlantResponse::new(model, own))
}
