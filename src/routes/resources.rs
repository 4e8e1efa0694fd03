//! Uniform CRUD handlers, instantiated once per collection resource.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use super::payload::FormPayload;
use super::SuccessResponse;
use crate::db::documents;
use crate::error::{AppError, StoreError};
use crate::schema::{merge_fields, strip_metadata, Document, Resource};
use crate::state::AppState;

/// `GET/POST /api/<path>` and `GET/PUT/PATCH/DELETE /api/<path>/{key}`.
pub fn router<R: Resource>() -> Router<AppState> {
    let base = format!("/api/{}", R::COLLECTION.path());
    Router::new()
        .route(&base, get(list::<R>).post(create::<R>))
        .route(
            &format!("{base}/{{key}}"),
            get(fetch::<R>)
                .put(replace::<R>)
                .patch(update::<R>)
                .delete(remove::<R>),
        )
}

/// Ids that do not parse cannot exist.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}

pub async fn list<R: Resource>(
    State(state): State<AppState>,
) -> Result<Json<Vec<Document<R>>>, AppError> {
    let docs = documents::list::<R>(state.store()).await?;
    Ok(Json(docs))
}

pub async fn create<R: Resource>(
    State(state): State<AppState>,
    FormPayload(body): FormPayload,
) -> Result<(StatusCode, Json<Document<R>>), AppError> {
    let resource = R::from_body(strip_metadata(body))?;
    let doc = documents::create(state.store(), resource).await?;
    tracing::info!(
        collection = R::COLLECTION.as_str(),
        id = %doc.id,
        label = doc.body.label(),
        "document created"
    );
    Ok((StatusCode::CREATED, Json(doc)))
}

pub async fn fetch<R: Resource>(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Document<R>>, AppError> {
    documents::find::<R>(state.store(), &key)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

/// PUT: the body must be a complete document.
pub async fn replace<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    FormPayload(body): FormPayload,
) -> Result<Json<Document<R>>, AppError> {
    let id = parse_id(&id)?;
    let existing = documents::get::<R>(state.store(), id)
        .await?
        .ok_or(AppError::NotFound)?;
    let resource = R::from_body(strip_metadata(body))?;
    save(&state, existing, resource).await
}

/// PATCH: top-level fields of the body overlay the stored document.
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    FormPayload(body): FormPayload,
) -> Result<Json<Document<R>>, AppError> {
    let id = parse_id(&id)?;
    let existing = documents::get::<R>(state.store(), id)
        .await?
        .ok_or(AppError::NotFound)?;
    let current = serde_json::to_value(&existing.body).map_err(StoreError::from)?;
    let resource = R::from_body(merge_fields(current, strip_metadata(body)))?;
    save(&state, existing, resource).await
}

async fn save<R: Resource>(
    state: &AppState,
    existing: Document<R>,
    resource: R,
) -> Result<Json<Document<R>>, AppError> {
    let doc = documents::update(state.store(), existing.id, existing.body.slug(), resource)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(
        collection = R::COLLECTION.as_str(),
        id = %doc.id,
        "document updated"
    );
    Ok(Json(doc))
}

pub async fn remove<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let id = parse_id(&id)?;
    documents::delete::<R>(state.store(), id).await?;
    tracing::info!(collection = R::COLLECTION.as_str(), id = %id, "document deleted");
    Ok(Json(SuccessResponse::ok()))
}
