//! In-process [`ContentStore`] used by tests and database-less local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AdminUser, ContentStore, DocumentRecord};
use crate::error::StoreError;
use crate::schema::Collection;

#[derive(Debug, Default)]
struct Inner {
    documents: Vec<DocumentRecord>,
    singletons: HashMap<String, Value>,
    admins: Vec<AdminUser>,
}

impl Inner {
    fn slug_taken(&self, collection: Collection, slug: &str, except: Option<Uuid>) -> bool {
        self.documents.iter().any(|d| {
            d.collection == collection.as_str()
                && d.slug.as_deref() == Some(slug)
                && Some(d.id) != except
        })
    }
}

/// All state sits behind one lock, so the slug check and the write happen
/// atomically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn ping(&self) -> Result<Duration, StoreError> {
        Ok(Duration::ZERO)
    }

    async fn list(&self, collection: Collection) -> Result<Vec<DocumentRecord>, StoreError> {
        let inner = self.inner.read().await;
        // Stored oldest first; reverse for newest first.
        Ok(inner
            .documents
            .iter()
            .rev()
            .filter(|d| d.collection == collection.as_str())
            .cloned()
            .collect())
    }

    async fn count(&self, collection: Collection) -> Result<i64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .iter()
            .filter(|d| d.collection == collection.as_str())
            .count() as i64)
    }

    async fn get(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<DocumentRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .iter()
            .find(|d| d.collection == collection.as_str() && d.id == id)
            .cloned())
    }

    async fn get_by_slug(
        &self,
        collection: Collection,
        slug: &str,
    ) -> Result<Option<DocumentRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .iter()
            .find(|d| d.collection == collection.as_str() && d.slug.as_deref() == Some(slug))
            .cloned())
    }

    async fn slugs_like(
        &self,
        collection: Collection,
        base: &str,
    ) -> Result<Vec<String>, StoreError> {
        let prefix = format!("{base}-");
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .iter()
            .filter(|d| d.collection == collection.as_str())
            .filter_map(|d| d.slug.clone())
            .filter(|s| s == base || s.starts_with(&prefix))
            .collect())
    }

    async fn missing_slugs(
        &self,
        collection: Collection,
    ) -> Result<Vec<DocumentRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .iter()
            .filter(|d| d.collection == collection.as_str() && d.slug.is_none())
            .cloned()
            .collect())
    }

    async fn insert(
        &self,
        collection: Collection,
        slug: Option<&str>,
        body: &Value,
    ) -> Result<DocumentRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(slug) = slug {
            if inner.slug_taken(collection, slug, None) {
                return Err(StoreError::SlugTaken(slug.to_string()));
            }
        }
        let now = Utc::now();
        let record = DocumentRecord {
            id: Uuid::new_v4(),
            collection: collection.as_str().to_string(),
            slug: slug.map(str::to_string),
            body: body.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.documents.push(record.clone());
        Ok(record)
    }

    async fn replace(
        &self,
        collection: Collection,
        id: Uuid,
        slug: Option<&str>,
        body: &Value,
    ) -> Result<Option<DocumentRecord>, StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(slug) = slug {
            if inner.slug_taken(collection, slug, Some(id)) {
                return Err(StoreError::SlugTaken(slug.to_string()));
            }
        }
        let Some(record) = inner
            .documents
            .iter_mut()
            .find(|d| d.collection == collection.as_str() && d.id == id)
        else {
            return Ok(None);
        };
        record.slug = slug.map(str::to_string);
        record.body = body.clone();
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.documents.len();
        inner
            .documents
            .retain(|d| !(d.collection == collection.as_str() && d.id == id));
        Ok(inner.documents.len() < before)
    }

    async fn singleton(&self, key: &str, default: &Value) -> Result<Value, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .singletons
            .entry(key.to_string())
            .or_insert_with(|| default.clone())
            .clone())
    }

    async fn put_singleton(&self, key: &str, body: &Value) -> Result<Value, StoreError> {
        let mut inner = self.inner.write().await;
        inner.singletons.insert(key.to_string(), body.clone());
        Ok(body.clone())
    }

    async fn admin_by_username(&self, username: &str) -> Result<Option<AdminUser>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .admins
            .iter()
            .find(|a| a.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn insert_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminUser, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .admins
            .iter()
            .any(|a| a.username.eq_ignore_ascii_case(username))
        {
            return Err(StoreError::Conflict(format!(
                "admin `{username}` already exists"
            )));
        }
        let now = Utc::now();
        let admin = AdminUser {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            reset_token_hash: None,
            reset_expires: None,
            created_at: now,
            updated_at: now,
        };
        inner.admins.push(admin.clone());
        Ok(admin)
    }

    async fn set_reset_token(
        &self,
        admin_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(admin) = inner.admins.iter_mut().find(|a| a.id == admin_id) {
            admin.reset_token_hash = Some(token_hash.to_string());
            admin.reset_expires = Some(expires_at);
            admin.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn admin_by_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<AdminUser>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .admins
            .iter()
            .find(|a| a.reset_token_hash.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn complete_password_reset(
        &self,
        admin_id: Uuid,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(admin) = inner.admins.iter_mut().find(|a| a.id == admin_id) {
            admin.password_hash = password_hash.to_string();
            admin.reset_token_hash = None;
            admin.reset_expires = None;
            admin.updated_at = Utc::now();
        }
        Ok(())
    }
}
