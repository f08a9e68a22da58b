use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{plant, plant_inventory};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, OptionalJson};
use crate::extractors::params::{AppPath, AppQuery};
use crate::models::inventory::*;
use crate::models::plant::PlantResponse;
use crate::models::shared::{Pagination, Violations, page_bounds, page_offset};
use crate::state::AppState;

use super::plant::{images_by_plant, plant_response};

#[utoipa::path(
    get,
    path = "/",
    tag = "Inventory",
    operation_id = "listInventory",
    summary = "List inventory",
    description = "Paginated inventory listing ordered by id. Every row embeds its full plant.",
    params(InventoryListQuery),
    responses(
        (status = 200, description = "Page of inventory rows", body = InventoryListResponse),
    ),
)]
#[instrument(skip(state, query), fields(nursery_id = query.nursery_id))]
pub async fn list_inventory(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<InventoryListQuery>,
) -> Result<Json<InventoryListResponse>, AppError> {
    let (page, per_page) = page_bounds(query.page, query.per_page);

    let mut select = plant_inventory::Entity::find();
    if let Some(nursery_id) = query.nursery_id {
        select = select.filter(plant_inventory::Column::NurseryId.eq(nursery_id));
    }
    if let Some(plant_id) = query.plant_id {
        select = select.filter(plant_inventory::Column::PlantId.eq(plant_id));
    }
    if let Some(ref size) = query.size {
        select = select.filter(plant_inventory::Column::Size.eq(size.trim()));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let rows = select
        .find_also_related(plant::Entity)
        .order_by_asc(plant_inventory::Column::Id)
        .offset(Some(page_offset(page, per_page)))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let data = inventory_responses(&state.db, rows).await?;

    Ok(Json(InventoryListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Inventory",
    operation_id = "createInventory",
    summary = "Add a plant to the caller's stock",
    description = "The caller is the nursery. A nursery may hold one row per plant and size; \
        a duplicate is rejected with a `non_field_errors` violation.",
    request_body = InventoryRequest,
    responses(
        (status = 201, description = "Inventory created", body = InventoryResponse),
        (status = 400, description = "Validation error or duplicate (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_inventory(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<InventoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let model = insert_inventory(&state.db, auth_user.user_id, &payload).await?;
    let response = inventory_response(&state.db, model).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/{id}/use_as_template",
    tag = "Inventory",
    operation_id = "useAsTemplate",
    summary = "Stock a catalog plant",
    description = "Creates an inventory row for the caller from a catalog plant. The body is \
        optional; quantity defaults to 1, price to 0.00 and size to \"Standard\".",
    params(("id" = i32, Path, description = "Plant ID")),
    request_body(content = Option<TemplateRequest>, description = "Optional overrides"),
    responses(
        (status = 201, description = "Inventory created", body = InventoryResponse),
        (status = 400, description = "Unknown plant, invalid value or duplicate (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn use_as_template(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    OptionalJson(payload): OptionalJson<TemplateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let request = payload.into_request(id);
    let model = insert_inventory(&state.db, auth_user.user_id, &request).await?;
    let response = inventory_response(&state.db, model).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Inventory",
    operation_id = "getInventory",
    summary = "Get an inventory row",
    params(("id" = i32, Path, description = "Inventory ID")),
    responses(
        (status = 200, description = "Inventory row", body = InventoryResponse),
        (status = 404, description = "Inventory not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_inventory(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<InventoryResponse>, AppError> {
    let row = plant_inventory::Entity::find_by_id(id)
        .find_also_related(plant::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory not found".into()))?;

    let mut responses = inventory_responses(&state.db, vec![row]).await?;
    responses
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal(format!("inventory {id} lost its plant")))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Inventory",
    operation_id = "replaceInventory",
    summary = "Replace an inventory row",
    params(("id" = i32, Path, description = "Inventory ID")),
    request_body = InventoryRequest,
    responses(
        (status = 200, description = "Inventory updated", body = InventoryResponse),
        (status = 400, description = "Validation error or duplicate (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Inventory not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn replace_inventory(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<InventoryRequest>,
) -> Result<Json<InventoryResponse>, AppError> {
    let existing = find_inventory(&state.db, id).await?;
    let model = save_inventory(&state.db, existing, &payload, Violations::default()).await?;
    Ok(Json(inventory_response(&state.db, model).await?))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Inventory",
    operation_id = "updateInventory",
    summary = "Partially update an inventory row",
    params(("id" = i32, Path, description = "Inventory ID")),
    request_body = InventoryPatchRequest,
    responses(
        (status = 200, description = "Inventory updated", body = InventoryResponse),
        (status = 400, description = "Validation error or duplicate (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Inventory not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_inventory(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<InventoryPatchRequest>,
) -> Result<Json<InventoryResponse>, AppError> {
    let existing = find_inventory(&state.db, id).await?;
    let mut merged = InventoryRequest::from(&existing);
    let mut v = Violations::default();
    payload.apply_to(&mut merged, &mut v);
    let model = save_inventory(&state.db, existing, &merged, v).await?;
    Ok(Json(inventory_response(&state.db, model).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Inventory",
    operation_id = "deleteInventory",
    summary = "Delete an inventory row",
    params(("id" = i32, Path, description = "Inventory ID")),
    responses(
        (status = 204, description = "Inventory deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Inventory not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_inventory(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    let result = plant_inventory::Entity::delete_by_id(id)
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Inventory not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Validate a write and resolve its plant reference, collecting every violation.
async fn validated_draft<C: ConnectionTrait>(
    db: &C,
    request: &InventoryRequest,
    mut v: Violations,
) -> Result<InventoryDraft, AppError> {
    let draft = validate_inventory(request, &mut v);

    if let Some(plant_id) = request.plant_id
        && plant::Entity::find_by_id(plant_id).one(db).await?.is_none()
    {
        v.add(
            "plant_id",
            format!("Invalid pk \"{plant_id}\" - object does not exist."),
        );
    }

    v.finish()?;
    Ok(draft)
}

/// Map the `(plant, nursery, size)` unique index violation to a field error.
fn unique_together(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::field("non_field_errors", UNIQUE_TOGETHER_MESSAGE)
        }
        _ => err.into(),
    }
}

async fn insert_inventory(
    db: &DatabaseConnection,
    nursery_id: i32,
    request: &InventoryRequest,
) -> Result<plant_inventory::Model, AppError> {
    let draft = validated_draft(db, request, Violations::default()).await?;

    let now = Utc::now();
    let model = plant_inventory::ActiveModel {
        plant_id: Set(draft.plant_id),
        nursery_id: Set(nursery_id),
        quantity: Set(draft.quantity),
        price: Set(draft.price),
        size: Set(draft.size),
        notes: Set(draft.notes),
        seasonal_availability: Set(draft.seasonal_availability),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(unique_together)?;

    tracing::info!(inventory_id = model.id, plant_id = model.plant_id, "Inventory created");
    Ok(model)
}

async fn save_inventory(
    db: &DatabaseConnection,
    existing: plant_inventory::Model,
    request: &InventoryRequest,
    violations: Violations,
) -> Result<plant_inventory::Model, AppError> {
    let draft = validated_draft(db, request, violations).await?;

    let mut active: plant_inventory::ActiveModel = existing.into();
    active.plant_id = Set(draft.plant_id);
    active.quantity = Set(draft.quantity);
    active.price = Set(draft.price);
    active.size = Set(draft.size);
    active.notes = Set(draft.notes);
    active.seasonal_availability = Set(draft.seasonal_availability);
    active.updated_at = Set(Utc::now());

    active.update(db).await.map_err(unique_together)
}

async fn find_inventory<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<plant_inventory::Model, AppError> {
    plant_inventory::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory not found".into()))
}

async fn inventory_response<C: ConnectionTrait>(
    db: &C,
    model: plant_inventory::Model,
) -> Result<InventoryResponse, AppError> {
    let plant = plant::Entity::find_by_id(model.plant_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("inventory {} lost its plant", model.id)))?;
    let plant = plant_response(db, plant).await?;
    Ok(InventoryResponse::new(model, plant))
}

/// Build read shapes for rows already joined with their plant; images for
/// all embedded plants come from one batch query.
async fn inventory_responses<C: ConnectionTrait>(
    db: &C,
    rows: Vec<(plant_inventory::Model, Option<plant::Model>)>,
) -> Result<Vec<InventoryResponse>, AppError> {
    let plant_ids = rows
        .iter()
        .filter_map(|(_, p)| p.as_ref().map(|p| p.id))
        .collect();
    let images = images_by_plant(db, plant_ids).await?;

    rows.into_iter()
        .map(|(row, plant)| {
            let plant = plant
                .ok_or_else(|| AppError::Internal(format!("inventory {} lost its plant", row.id)))?;
            let own = images.get(&plant.id).cloned().unwrap_or_default();
            Ok(InventoryResponse::new(row, PlantResponse::new(plant, own)))
        })
        .collect()
}
