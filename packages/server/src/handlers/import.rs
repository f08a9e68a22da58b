use std::collections::HashSet;

use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use crate::entity::plant;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::import::{CsvImportResponse, PlantCsv};
use crate::state::AppState;

pub fn csv_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(16 * 1024 * 1024) // 16 MB
}

#[utoipa::path(
    post,
    path = "/upload_csv",
    tag = "Plants",
    operation_id = "uploadPlantCsv",
    summary = "Bulk import plants from CSV",
    description = "Multipart upload with a `file` field holding a CSV with a header row of plant \
        attribute names. Every row is validated before anything is written; if any row fails, \
        nothing is imported and every failing row is reported. A row whose scientific name is \
        already in the catalog, or repeats an earlier row, fails. Created plants are \
        attributed to the caller.",
    request_body(content_type = "multipart/form-data", description = "CSV file in the `file` field"),
    responses(
        (status = 201, description = "All rows imported", body = CsvImportResponse),
        (status = 400, description = "Malformed file (VALIDATION_ERROR) or rejected rows (IMPORT_REJECTED)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_csv(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?,
            );
        }
    }
    let data = data.ok_or_else(|| AppError::field("file", "No file was submitted."))?;

    let upload = PlantCsv::parse(&data)?;

    let txn = state.db.begin().await?;
    let in_catalog: HashSet<String> = plant::Entity::find()
        .filter(plant::Column::ScientificName.is_in(upload.scientific_names()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| p.scientific_name)
        .collect();
    let drafts = upload.into_drafts(&in_catalog)?;

    let now = Utc::now();
    let created = drafts.len();
    for draft in drafts {
        draft
            .into_new(Some(auth_user.user_id), now)
            .insert(&txn)
            .await?;
    }
    txn.commit().await?;

    tracing::info!(created, "CSV import committed");
    Ok((StatusCode::CREATED, Json(CsvImportResponse { created })))
}
