//! Visitor contact intake and the operator status workflow.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use super::payload::{FormPayload, ValidJson};
use super::resources::{self, parse_id};
use crate::db::documents;
use crate::error::AppError;
use crate::schema::{strip_metadata, ContactStatus, ContactSubmission, Document, Resource, StatusUpdate};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/contact",
            post(submit).get(resources::list::<ContactSubmission>),
        )
        .route(
            "/api/contact/{id}",
            get(resources::fetch::<ContactSubmission>)
                .patch(update_status)
                .delete(resources::remove::<ContactSubmission>),
        )
}

/// POST /api/contact - public; any client-supplied status is discarded.
pub async fn submit(
    State(state): State<AppState>,
    FormPayload(body): FormPayload,
) -> Result<(StatusCode, Json<Document<ContactSubmission>>), AppError> {
    let mut submission = ContactSubmission::from_body(strip_metadata(body))?;
    submission.status = ContactStatus::New;
    let doc = documents::create(state.store(), submission).await?;
    tracing::info!(id = %doc.id, "contact submission received");
    Ok((StatusCode::CREATED, Json(doc)))
}

/// PATCH /api/contact/{id} - `{status}` only.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(update): ValidJson<StatusUpdate>,
) -> Result<Json<Document<ContactSubmission>>, AppError> {
    let id = parse_id(&id)?;
    let mut doc = documents::get::<ContactSubmission>(state.store(), id)
        .await?
        .ok_or(AppError::NotFound)?;
    let previous = doc.body.status;
    doc.body.status = update.status;

    let doc = documents::update(state.store(), id, None, doc.body)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(id = %id, from = %previous, to = %doc.body.status, "contact status changed");
    Ok(Json(doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::test_state;
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(res: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_submit_forces_new_status() {
        let (state, _dir) = test_state();
        let app = router().with_state(state);
        let res = app
            .oneshot(json_request(
                "POST",
                "/api/contact",
                json!({
                    "firstName": "Ada",
                    "email": "ada@example.com",
                    "message": "Hello",
                    "status": "resolved"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = body_json(res).await;
        assert_eq!(body["status"], "new");
    }

    #[tokio::test]
    async fn test_status_workflow() {
        let (state, _dir) = test_state();
        let app = router().with_state(state);
        let created = body_json(
            app.clone()
                .oneshot(json_request(
                    "POST",
                    "/api/contact",
                    json!({"firstName": "Ada", "email": "ada@example.com", "message": "Hi"}),
                ))
                .await
                .unwrap(),
        )
        .await;
        let uri = format!("/api/contact/{}", created["id"].as_str().unwrap());

        let res = app
            .clone()
            .oneshot(json_request("PATCH", &uri, json!({"status": "archived"})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app
            .clone()
            .oneshot(json_request("PATCH", &uri, json!({"status": "contacted"})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["status"], "contacted");
        assert_eq!(created["message"], "Hi");
    }

    #[tokio::test]
    async fn test_invalid_email_is_rejected() {
        let (state, _dir) = test_state();
        let app = router().with_state(state);
        let res = app
            .oneshot(json_request(
                "POST",
                "/api/contact",
                json!({"firstName": "Ada", "email": "nope", "message": "Hi"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
