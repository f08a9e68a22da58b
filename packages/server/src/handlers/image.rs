use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{plant, plant_additional_image, plant_image};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::params::AppPath;
use crate::models::image::*;
use crate::models::plant::PlantResponse;
use crate::models::shared::Violations;
use crate::state::AppState;
use crate::utils::filename::image_extension;

use super::plant::{find_plant, plant_response};

const ADDITIONAL_FOLDER: &str = "plants/additional";
const MAIN_FOLDER: &str = "plants/main";

/// Request body limit for image uploads: the file plus room for the other form fields.
pub fn image_upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_upload_size as usize + 64 * 1024)
}

/// An image file read from a multipart field.
struct UploadedImage {
    extension: String,
    bytes: Vec<u8>,
}

async fn read_image_field(field: Field<'_>) -> Result<UploadedImage, AppError> {
    let filename = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| AppError::field("file", "File field must have a filename"))?;
    let extension =
        image_extension(&filename).map_err(|e| AppError::field("file", e.message()))?;
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
    Ok(UploadedImage {
        extension,
        bytes: bytes.to_vec(),
    })
}

async fn read_text_field(field: Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Multipart error: {e}"))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Images",
    operation_id = "listImages",
    summary = "List the image library",
    responses(
        (status = 200, description = "All images ordered by id", body = Vec<PlantImageResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_images(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlantImageResponse>>, AppError> {
    let images = plant_image::Entity::find()
        .order_by_asc(plant_image::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(images.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Images",
    operation_id = "uploadImage",
    summary = "Upload an image",
    description = "Multipart upload. `file` is required (png, jpg, jpeg, gif or webp). \
        `caption` is optional. When `plant_id` is given the new image is linked to that plant.",
    request_body(content_type = "multipart/form-data", description = "`file`, optional `caption` and `plant_id`"),
    responses(
        (status = 201, description = "Image stored", body = PlantImageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut upload: Option<UploadedImage> = None;
    let mut caption = String::new();
    let mut plant_id_raw: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => upload = Some(read_image_field(field).await?),
            Some("caption") => caption = read_text_field(field).await?,
            Some("plant_id") => plant_id_raw = Some(read_text_field(field).await?),
            _ => {}
        }
    }

    let mut v = Violations::default();
    if upload.is_none() {
        v.add("file", "No file was submitted.");
    }
    let caption = v.text("caption", &caption, CAPTION_MAX_CHARS, false);
    let plant_id = match plant_id_raw.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<i32>() {
            Ok(id) if plant::Entity::find_by_id(id).one(&state.db).await?.is_some() => Some(id),
            Ok(id) => {
                v.add("plant_id", format!("Invalid pk \"{id}\" - object does not exist."));
                None
            }
            Err(_) => {
                v.add("plant_id", "Incorrect type. Expected pk value.");
                None
            }
        },
    };
    v.finish()?;

    let upload = upload.ok_or_else(|| AppError::field("file", "No file was submitted."))?;
    let path = state
        .media
        .save(ADDITIONAL_FOLDER, &upload.extension, &upload.bytes)
        .await?;

    let image = match insert_image(&state.db, path.clone(), caption, plant_id).await {
        Ok(image) => image,
        Err(e) => return Err(discard_media(&state, &path, e.into()).await),
    };

    tracing::info!(image_id = image.id, plant_id, "Image uploaded");
    Ok((StatusCode::CREATED, Json(PlantImageResponse::from(image))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Images",
    operation_id = "updateImage",
    summary = "Change an image caption",
    params(("id" = i32, Path, description = "Image ID")),
    request_body = UpdateImageRequest,
    responses(
        (status = 200, description = "Image updated", body = PlantImageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateImageRequest>,
) -> Result<Json<PlantImageResponse>, AppError> {
    let mut v = Violations::default();
    let caption = v.text("caption", &payload.caption, CAPTION_MAX_CHARS, false);
    v.finish()?;

    let existing = find_image(&state.db, id).await?;
    let mut active: plant_image::ActiveModel = existing.into();
    active.caption = Set(caption);
    let model = active.update(&state.db).await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Images",
    operation_id = "deleteImage",
    summary = "Delete an image",
    description = "Unlinks the image from every plant and removes it. The stored file is \
        removed once nothing references it.",
    params(("id" = i32, Path, description = "Image ID")),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    let txn = state.db.begin().await?;
    let image = find_image(&txn, id).await?;

    plant_additional_image::Entity::delete_many()
        .filter(plant_additional_image::Column::PlantImageId.eq(id))
        .exec(&txn)
        .await?;
    plant_image::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    release_media(&state, &image.image).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{id}/images/{image_id}",
    tag = "Images",
    operation_id = "attachImage",
    summary = "Link an image to a plant",
    description = "Idempotent: linking an already linked image succeeds.",
    params(
        ("id" = i32, Path, description = "Plant ID"),
        ("image_id" = i32, Path, description = "Image ID"),
    ),
    responses(
        (status = 204, description = "Image linked"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Plant or image not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn attach_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((id, image_id)): AppPath<(i32, i32)>,
) -> Result<StatusCode, AppError> {
    find_plant(&state.db, id).await?;
    find_image(&state.db, image_id).await?;

    plant_additional_image::Entity::insert(plant_additional_image::ActiveModel {
        plant_id: Set(id),
        plant_image_id: Set(image_id),
    })
    .on_conflict(
        OnConflict::columns([
            plant_additional_image::Column::PlantId,
            plant_additional_image::Column::PlantImageId,
        ])
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(&state.db)
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{id}/images/{image_id}",
    tag = "Images",
    operation_id = "detachImage",
    summary = "Unlink an image from a plant",
    description = "The image itself stays in the library.",
    params(
        ("id" = i32, Path, description = "Plant ID"),
        ("image_id" = i32, Path, description = "Image ID"),
    ),
    responses(
        (status = 204, description = "Image unlinked"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Image not linked to this plant (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn detach_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((id, image_id)): AppPath<(i32, i32)>,
) -> Result<StatusCode, AppError> {
    let result = plant_additional_image::Entity::delete_many()
        .filter(plant_additional_image::Column::PlantId.eq(id))
        .filter(plant_additional_image::Column::PlantImageId.eq(image_id))
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Image is not linked to this plant".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{id}/main_image",
    tag = "Images",
    operation_id = "setMainImage",
    summary = "Upload a plant's main image",
    description = "Multipart upload with a single `file` field. Replaces any previous main image.",
    params(("id" = i32, Path, description = "Plant ID")),
    request_body(content_type = "multipart/form-data", description = "`file`"),
    responses(
        (status = 200, description = "Plant with its new main image", body = PlantResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Plant not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn set_main_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    mut multipart: Multipart,
) -> Result<Json<PlantResponse>, AppError> {
    let existing = find_plant(&state.db, id).await?;

    let mut upload: Option<UploadedImage> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            upload = Some(read_image_field(field).await?);
        }
    }
    let upload = upload.ok_or_else(|| AppError::field("file", "No file was submitted."))?;

    let path = state
        .media
        .save(MAIN_FOLDER, &upload.extension, &upload.bytes)
        .await?;

    let previous = existing.main_image.clone();
    let mut active: plant::ActiveModel = existing.into();
    active.main_image = Set(Some(path.clone()));
    active.updated_at = Set(Utc::now());
    let model = match active.update(&state.db).await {
        Ok(model) => model,
        Err(e) => return Err(discard_media(&state, &path, e.into()).await),
    };

    if let Some(old) = previous.filter(|old| *old != path) {
        release_media(&state, &old).await?;
    }

    Ok(Json(plant_response(&state.db, model).await?))
}

/// Record a stored file as a library image, linked to `plant_id` if given.
async fn insert_image(
    db: &DatabaseConnection,
    path: String,
    caption: String,
    plant_id: Option<i32>,
) -> Result<plant_image::Model, DbErr> {
    let txn = db.begin().await?;
    let image = plant_image::ActiveModel {
        image: Set(path),
        caption: Set(caption),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if let Some(plant_id) = plant_id {
        plant_additional_image::ActiveModel {
            plant_id: Set(plant_id),
            plant_image_id: Set(image.id),
        }
        .insert(&txn)
        .await?;
    }
    txn.commit().await?;
    Ok(image)
}

/// Release a freshly stored file whose database write failed, returning `err`.
async fn discard_media(state: &AppState, path: &str, err: AppError) -> AppError {
    if let Err(cleanup) = release_media(state, path).await {
        tracing::warn!(path, error = ?cleanup, "Failed to release media after a failed write");
    }
    err
}

async fn find_image<C: ConnectionTrait>(db: &C, id: i32) -> Result<plant_image::Model, AppError> {
    plant_image::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".into()))
}

/// Delete a stored file once no image row and no plant main image points at it.
///
/// Identical uploads share one content-addressed file, so a path can have
/// several owners. The reference count and the delete are not atomic: an
/// identical upload committing in between can lose its file.
pub(crate) async fn release_media(state: &AppState, path: &str) -> Result<(), AppError> {
    let image_refs = plant_image::Entity::find()
        .filter(plant_image::Column::Image.eq(path))
        .count(&state.db)
        .await?;
    let main_refs = plant::Entity::find()
        .filter(plant::Column::MainImage.eq(path))
        .count(&state.db)
        .await?;
    if image_refs + main_refs > 0 {
        return Ok(());
    }

    if let Err(e) = state.media.delete(path).await {
        tracing::warn!(path, error = %e, "Failed to remove unreferenced media file");
    }
    Ok(())
}
