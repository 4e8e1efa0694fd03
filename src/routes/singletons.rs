//! Singleton documents: GET finds or creates, PUT replaces, PATCH merges.

use axum::{extract::State, routing::get, Json, Router};

use super::payload::FormPayload;
use crate::db::ContentStore;
use crate::error::{AppError, StoreError};
use crate::schema::{merge_fields, Singleton};
use crate::state::AppState;

pub fn router<S: Singleton>(path: &str) -> Router<AppState> {
    Router::new().route(path, get(fetch::<S>).put(replace::<S>).patch(update::<S>))
}

/// Stored document, inserting the default one first when none exists.
pub async fn load<S: Singleton>(store: &dyn ContentStore) -> Result<S, AppError> {
    let default = serde_json::to_value(S::default()).map_err(StoreError::from)?;
    let value = store.singleton(S::KEY, &default).await?;
    let doc = serde_json::from_value(value).map_err(StoreError::from)?;
    Ok(doc)
}

async fn save<S: Singleton>(store: &dyn ContentStore, doc: &S) -> Result<S, AppError> {
    let value = serde_json::to_value(doc).map_err(StoreError::from)?;
    let stored = store.put_singleton(S::KEY, &value).await?;
    tracing::info!(key = S::KEY, "singleton saved");
    Ok(serde_json::from_value(stored).map_err(StoreError::from)?)
}

pub async fn fetch<S: Singleton>(State(state): State<AppState>) -> Result<Json<S>, AppError> {
    load::<S>(state.store()).await.map(Json)
}

pub async fn replace<S: Singleton>(
    State(state): State<AppState>,
    FormPayload(body): FormPayload,
) -> Result<Json<S>, AppError> {
    let doc = S::from_body(body)?;
    save(state.store(), &doc).await.map(Json)
}

pub async fn update<S: Singleton>(
    State(state): State<AppState>,
    FormPayload(body): FormPayload,
) -> Result<Json<S>, AppError> {
    let current = load::<S>(state.store()).await?;
    let current = serde_json::to_value(&current).map_err(StoreError::from)?;
    let doc = S::from_body(merge_fields(current, body))?;
    save(state.store(), &doc).await.map(Json)
}
