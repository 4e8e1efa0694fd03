use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use serde::Serialize;

use super::SuccessResponse;
use crate::error::AppError;
use crate::state::AppState;
use crate::upload::StoredFileInfo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/uploads", post(upload_image).get(list_images))
        .route("/api/uploads/{filename}", delete(delete_image))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub size: usize,
    pub mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub filename: String,
    pub url: String,
    pub size: u64,
    pub created_at: String,
}

impl From<StoredFileInfo> for ImageInfo {
    fn from(info: StoredFileInfo) -> Self {
        Self {
            filename: info.filename,
            url: info.url,
            size: info.size,
            created_at: info.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageListResponse {
    pub images: Vec<ImageInfo>,
    pub total: usize,
}

/// POST /api/uploads - the first file field of the form is stored.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
            .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let stored = state.uploads.store(&original_name, bytes).await?;
        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                url: stored.url,
                filename: stored.filename,
                size: stored.size,
                mime_type: stored.mime_type.to_string(),
            }),
        ));
    }
}

/// DELETE /api/uploads/{filename}
pub async fn delete_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if state.uploads.remove(&filename).await? {
        Ok(Json(SuccessResponse::ok()))
    } else {
        Err(AppError::NotFound)
    }
}

/// GET /api/uploads
pub async fn list_images(
    State(state): State<AppState>,
) -> Result<Json<ImageListResponse>, AppError> {
    let images: Vec<ImageInfo> = state
        .uploads
        .list()
        .await?
        .into_iter()
        .map(ImageInfo::from)
        .collect();
    let total = images.len();
    Ok(Json(ImageListResponse { images, total }))
}
