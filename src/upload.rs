//! Shared upload capability: store a file under the public uploads
//! directory and hand back the path it is served from.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::error::UploadError;

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "svg"];

/// Numbered names tried for one upload before giving up.
const MAX_NAME_ATTEMPTS: usize = 100;

#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Public path, e.g. `/uploads/1700000000000-logo.png`.
    pub url: String,
    pub filename: String,
    pub size: usize,
    pub mime_type: &'static str,
}

#[async_trait]
pub trait UploadStore: Send + Sync {
    async fn store(&self, original_name: &str, bytes: Bytes) -> Result<StoredFile, UploadError>;

    /// Stored files, newest first.
    async fn list(&self) -> Result<Vec<StoredFileInfo>, UploadError>;

    /// `Ok(false)` when there was no such file.
    async fn remove(&self, filename: &str) -> Result<bool, UploadError>;
}

#[derive(Debug, Clone)]
pub struct StoredFileInfo {
    pub filename: String,
    pub url: String,
    pub size: u64,
    pub created_at: String,
}

/// Files on the local disk, served by `ServeDir` under `public_prefix`.
#[derive(Debug, Clone)]
pub struct LocalUploads {
    dir: PathBuf,
    public_prefix: String,
    max_bytes: usize,
}

impl LocalUploads {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn public_url(&self, filename: &str) -> String {
        format!("{}/{}", self.public_prefix, filename)
    }

    /// Write `bytes` under `<unix-millis>-<name>`, or `<unix-millis>-<n>-<name>`
    /// when that file already exists. Existing files are never truncated.
    async fn write_new(&self, original_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let millis = Utc::now().timestamp_millis();
        let name = sanitize_filename(original_name);

        for n in 0..MAX_NAME_ATTEMPTS {
            let filename = if n == 0 {
                format!("{millis}-{name}")
            } else {
                format!("{millis}-{n}-{name}")
            };
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.dir.join(&filename))
                .await;
            match opened {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    return Ok(filename);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(UploadError::Rejected("Could not allocate a file name"))
    }
}

#[async_trait]
impl UploadStore for LocalUploads {
    async fn store(&self, original_name: &str, bytes: Bytes) -> Result<StoredFile, UploadError> {
        let ext = extension(original_name);
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(UploadError::Rejected(
                "Unsupported file type. Allowed: JPEG, PNG, WebP, GIF, SVG.",
            ));
        }
        if bytes.is_empty() {
            return Err(UploadError::Rejected("Empty file"));
        }
        if bytes.len() > self.max_bytes {
            return Err(UploadError::Rejected("File too large"));
        }
        let mime_type = detect_image_type(&bytes).ok_or(UploadError::Rejected(
            "File content does not match an allowed image type.",
        ))?;
        if mime_for_extension(&ext) != Some(mime_type) {
            return Err(UploadError::Rejected(
                "File content does not match its extension.",
            ));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let filename = self.write_new(original_name, &bytes).await?;

        tracing::info!("Image uploaded: {} ({} bytes)", filename, bytes.len());

        Ok(StoredFile {
            url: self.public_url(&filename),
            size: bytes.len(),
            filename,
            mime_type,
        })
    }

    async fn list(&self) -> Result<Vec<StoredFileInfo>, UploadError> {
        if !tokio::fs::try_exists(&self.dir).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(str::to_string)
            else {
                continue;
            };
            if !ALLOWED_EXTENSIONS.contains(&extension(&filename).as_str()) {
                continue;
            }
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let created_at = metadata
                .created()
                .or_else(|_| metadata.modified())
                .map(|t| {
                    let dt: chrono::DateTime<Utc> = t.into();
                    dt.to_rfc3339()
                })
                .unwrap_or_default();

            files.push(StoredFileInfo {
                url: self.public_url(&filename),
                filename,
                size: metadata.len(),
                created_at,
            });
        }

        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files)
    }

    async fn remove(&self, filename: &str) -> Result<bool, UploadError> {
        if !is_safe_filename(filename) {
            return Err(UploadError::Rejected("Invalid filename"));
        }
        match tokio::fs::remove_file(self.dir.join(filename)).await {
            Ok(()) => {
                tracing::info!("Image deleted: {}", filename);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn extension(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// MIME type an allowed extension must carry.
fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

pub fn detect_image_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        // WebP: 52 49 46 46 ... 57 45 42 50
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ if looks_like_svg(bytes) => Some("image/svg+xml"),
        _ => None,
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

/// Keep `[A-Za-z0-9._-]`, replace anything else with `-`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

fn is_safe_filename(filename: &str) -> bool {
    // Reject path traversal and special characters
    !filename.is_empty()
        && !filename.contains("..")
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    #[test]
    fn test_detect_image_type() {
        assert_eq!(detect_image_type(PNG), Some("image/png"));
        assert_eq!(detect_image_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(
            detect_image_type(b"<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>"),
            Some("image/svg+xml")
        );
        assert_eq!(detect_image_type(b"hello world"), None);
        assert_eq!(detect_image_type(&[0x89]), None);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my logo.png"), "my-logo.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\x\\pic.jpg"), "pic.jpg");
        assert_eq!(sanitize_filename(".hidden.png"), "hidden.png");
    }

    #[test]
    fn test_is_safe_filename() {
        assert!(is_safe_filename("1700-logo.png"));
        assert!(!is_safe_filename("../secret"));
        assert!(!is_safe_filename("a/b.png"));
        assert!(!is_safe_filename(""));
    }

    #[tokio::test]
    async fn test_store_list_remove() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = LocalUploads::new(dir.path(), "/uploads", 1024);

        let stored = uploads
            .store("Team Photo.png", Bytes::from_static(PNG))
            .await
            .unwrap();
        assert!(stored.url.starts_with("/uploads/"));
        assert!(stored.filename.ends_with("-Team-Photo.png"));
        assert_eq!(stored.mime_type, "image/png");
        assert!(dir.path().join(&stored.filename).exists());

        let listed = uploads.list().await.unwrap();
        assert_eq!(listed.len(), 1);

        assert!(uploads.remove(&stored.filename).await.unwrap());
        assert!(!uploads.remove(&stored.filename).await.unwrap());
    }

    #[tokio::test]
    async fn test_store_rejects_bad_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = LocalUploads::new(dir.path(), "/uploads", 8);

        let err = uploads
            .store("notes.txt", Bytes::from_static(b"text"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Rejected(_)));

        let err = uploads
            .store("big.png", Bytes::from_static(PNG))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Rejected("File too large")));

        let err = uploads
            .store("fake.png", Bytes::from_static(b"GIF-not"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_store_rejects_content_under_wrong_extension() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = LocalUploads::new(dir.path(), "/uploads", 1024);

        let err = uploads
            .store("x.png", Bytes::from_static(b"GIF89a\x01\x00"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UploadError::Rejected("File content does not match its extension.")
        ));

        let err = uploads
            .store("x.jpg", Bytes::from_static(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Rejected(_)));

        assert!(uploads.store("x.jpeg", Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0])).await.is_ok());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_same_name_uploads_never_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = LocalUploads::new(dir.path(), "/uploads", 1024);
        let mut second = PNG.to_vec();
        second.push(0xAA);

        let (a, b) = tokio::join!(
            uploads.store("avatar.png", Bytes::from_static(PNG)),
            uploads.store("avatar.png", Bytes::from(second.clone())),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.filename, b.filename);
        assert!(a.filename.ends_with("-avatar.png") && b.filename.ends_with("-avatar.png"));

        assert_eq!(std::fs::read(dir.path().join(&a.filename)).unwrap(), PNG);
        assert_eq!(std::fs::read(dir.path().join(&b.filename)).unwrap(), second);
    }
}
