//! Request body extractors shared by the resource handlers.
//!
//! `FormPayload` accepts either a JSON body or a multipart form. In the
//! multipart case a `data` field carries the document JSON, other text
//! fields become top-level strings, and every file field is stored through
//! the upload capability with its public path written at the field-name
//! path (`image`, `cards.0.image`, ...).

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header,
    Json,
};
use bytes::Bytes;
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::state::AppState;

/// Raw document body, files already stored.
#[derive(Debug)]
pub struct FormPayload(pub Value);

impl FromRequest<AppState> for FormPayload {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if !is_multipart {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            return Ok(Self(value));
        }

        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        read_multipart(multipart, state).await.map(Self)
    }
}

struct PendingFile {
    field: String,
    file_name: String,
    bytes: Bytes,
}

async fn read_multipart(mut multipart: Multipart, state: &AppState) -> Result<Value, AppError> {
    let mut data: Option<Value> = None;
    let mut text_fields = Vec::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            // Browsers send an empty part for an untouched file input.
            if file_name.is_empty() && bytes.is_empty() {
                continue;
            }
            files.push(PendingFile {
                field: name,
                file_name,
                bytes,
            });
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        if name == "data" {
            if !text.trim().is_empty() {
                let parsed = serde_json::from_str(&text)
                    .map_err(|e| AppError::BadRequest(format!("data: {e}")))?;
                data = Some(parsed);
            }
        } else {
            text_fields.push((name, text));
        }
    }

    let mut body = data.unwrap_or_else(|| Value::Object(Map::new()));
    let Value::Object(map) = &mut body else {
        return Err(AppError::BadRequest("data must be a JSON object".to_string()));
    };
    for (name, text) in text_fields {
        map.insert(name, Value::String(text));
    }

    let stored = try_join_all(files.into_iter().map(|file| {
        let uploads = state.uploads.clone();
        async move {
            let stored = uploads.store(&file.file_name, file.bytes).await?;
            Ok::<_, AppError>((file.field, stored.url))
        }
    }))
    .await?;

    for (field, url) in stored {
        set_path(&mut body, &field, Value::String(url))?;
    }

    Ok(body)
}

/// Write `value` at a dotted path, creating objects and arrays on the way.
/// Array segments may address an existing element or the next free slot.
fn set_path(root: &mut Value, path: &str, value: Value) -> Result<(), AppError> {
    let invalid = || AppError::BadRequest(format!("invalid field name `{path}`"));
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(invalid());
    }

    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        let slot = match current {
            Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
            Value::Array(items) => {
                let index: usize = segment.parse().map_err(|_| invalid())?;
                if index == items.len() {
                    items.push(Value::Null);
                }
                items.get_mut(index).ok_or_else(invalid)?
            }
            _ => return Err(invalid()),
        };

        let Some(next) = segments.get(i + 1) else {
            *slot = value;
            return Ok(());
        };
        if slot.is_null() {
            *slot = if next.parse::<usize>().is_ok() {
                Value::Array(Vec::new())
            } else {
                Value::Object(Map::new())
            };
        }
        current = slot;
    }

    Ok(())
}

/// `Json<T>` whose rejections come back as `400 Invalid request body`.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::test_state;
    use axum::body::Body;
    use serde_json::json;

    const BOUNDARY: &str = "XBOUNDARYX";
    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    fn text_part(name: &str, value: &str) -> Vec<u8> {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
        .into_bytes()
    }

    fn file_part(name: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
        let mut part = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        part.extend_from_slice(content);
        part.extend_from_slice(b"\r\n");
        part
    }

    fn multipart_request(parts: Vec<Vec<u8>>) -> Request {
        let mut body = parts.concat();
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn test_set_path_creates_nested_containers() {
        let mut body = json!({"title": "t"});
        set_path(&mut body, "image", json!("/a.png")).unwrap();
        set_path(&mut body, "cards.0.image", json!("/b.png")).unwrap();
        assert_eq!(
            body,
            json!({"title": "t", "image": "/a.png", "cards": [{"image": "/b.png"}]})
        );
    }

    #[test]
    fn test_set_path_updates_existing_element() {
        let mut body = json!({"cards": [{"title": "one"}, {"title": "two"}]});
        set_path(&mut body, "cards.1.image", json!("/c.png")).unwrap();
        assert_eq!(body["cards"][1], json!({"title": "two", "image": "/c.png"}));
        assert_eq!(body["cards"][0], json!({"title": "one"}));
    }

    #[test]
    fn test_set_path_rejects_bad_paths() {
        let mut body = json!({"cards": []});
        assert!(set_path(&mut body, "cards.5.image", json!("x")).is_err());
        assert!(set_path(&mut body, "a..b", json!("x")).is_err());
        let mut body = json!({"title": "t"});
        assert!(set_path(&mut body, "title.inner", json!("x")).is_err());
    }

    #[tokio::test]
    async fn test_json_body() {
        let (state, _dir) = test_state();
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":"x"}"#))
            .unwrap();
        let FormPayload(value) = FormPayload::from_request(req, &state).await.unwrap();
        assert_eq!(value, json!({"title": "x"}));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (state, _dir) = test_state();
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let err = FormPayload::from_request(req, &state).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_multipart_stores_files_at_field_paths() {
        let (state, dir) = test_state();
        let req = multipart_request(vec![
            text_part("data", r#"{"title":"Case","cards":[{"title":"c"}]}"#),
            text_part("subtitle", "plain text"),
            file_part("headerImage", "head.png", PNG),
            file_part("cards.0.image", "card.png", PNG),
            file_part("image", "", b""),
        ]);

        let FormPayload(value) = FormPayload::from_request(req, &state).await.unwrap();
        assert_eq!(value["title"], "Case");
        assert_eq!(value["subtitle"], "plain text");
        assert!(value.get("image").is_none());

        let header_url = value["headerImage"].as_str().unwrap();
        let card_url = value["cards"][0]["image"].as_str().unwrap();
        assert!(header_url.starts_with("/uploads/") && header_url.ends_with("-head.png"));
        assert!(card_url.ends_with("-card.png"));
        assert_eq!(value["cards"][0]["title"], "c");

        let stored = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(stored, 2);
    }

    #[tokio::test]
    async fn test_multipart_same_file_names_get_distinct_paths() {
        let (state, dir) = test_state();
        let mut other = PNG.to_vec();
        other.extend_from_slice(b"second");
        let req = multipart_request(vec![
            text_part("data", r#"{"tabName":"Team","cards":[{"title":"a"},{"title":"b"}]}"#),
            file_part("cards.0.image", "avatar.png", PNG),
            file_part("cards.1.image", "avatar.png", &other),
        ]);

        let FormPayload(value) = FormPayload::from_request(req, &state).await.unwrap();
        let first = value["cards"][0]["image"].as_str().unwrap();
        let second = value["cards"][1]["image"].as_str().unwrap();
        assert_ne!(first, second);

        let read = |url: &str| {
            let name = url.trim_start_matches("/uploads/");
            std::fs::read(dir.path().join(name)).unwrap()
        };
        let mut contents = vec![read(first), read(second)];
        contents.sort();
        let mut expected = vec![PNG.to_vec(), other];
        expected.sort();
        assert_eq!(contents, expected);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_multipart_rejects_invalid_upload() {
        let (state, _dir) = test_state();
        let req = multipart_request(vec![file_part("image", "notes.txt", b"hello")]);
        let err = FormPayload::from_request(req, &state).await.unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
    }

    #[tokio::test]
    async fn test_multipart_data_must_be_object() {
        let (state, _dir) = test_state();
        let req = multipart_request(vec![text_part("data", "[1,2]")]);
        let err = FormPayload::from_request(req, &state).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
