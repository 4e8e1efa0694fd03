//! PostgreSQL-backed [`ContentStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::{AdminUser, ContentStore, DocumentRecord};
use crate::error::StoreError;
use crate::schema::Collection;

const DOCUMENT_COLUMNS: &str = "id, collection, slug, body, created_at, updated_at";
const ADMIN_COLUMNS: &str =
    "id, username, password_hash, reset_token_hash, reset_expires, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(start.elapsed())
    }

    async fn list(&self, collection: Collection) -> Result<Vec<DocumentRecord>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE collection = $1 ORDER BY created_at DESC"
        ))
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count(&self, collection: Collection) -> Result<i64, StoreError> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents WHERE collection = $1")
            .bind(collection.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(total.0)
    }

    async fn get(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<DocumentRecord>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE collection = $1 AND id = $2"
        ))
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_by_slug(
        &self,
        collection: Collection,
        slug: &str,
    ) -> Result<Option<DocumentRecord>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE collection = $1 AND slug = $2"
        ))
        .bind(collection.as_str())
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn slugs_like(
        &self,
        collection: Collection,
        base: &str,
    ) -> Result<Vec<String>, StoreError> {
        // Slugs are restricted to [a-z0-9-], so `base` carries no LIKE wildcards.
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT slug FROM documents
            WHERE collection = $1 AND (slug = $2 OR slug LIKE $3)
            "#,
        )
        .bind(collection.as_str())
        .bind(base)
        .bind(format!("{base}-%"))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(s,)| s).collect())
    }

    async fn missing_slugs(
        &self,
        collection: Collection,
    ) -> Result<Vec<DocumentRecord>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE collection = $1 AND slug IS NULL ORDER BY created_at"
        ))
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert(
        &self,
        collection: Collection,
        slug: Option<&str>,
        body: &Value,
    ) -> Result<DocumentRecord, StoreError> {
        sqlx::query_as::<_, DocumentRecord>(&format!(
            r#"
            INSERT INTO documents (collection, slug, body, created_at, updated_at)
            VALUES ($1, $2, $3, now(), now())
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(collection.as_str())
        .bind(slug)
        .bind(body)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, slug))
    }

    async fn replace(
        &self,
        collection: Collection,
        id: Uuid,
        slug: Option<&str>,
        body: &Value,
    ) -> Result<Option<DocumentRecord>, StoreError> {
        sqlx::query_as::<_, DocumentRecord>(&format!(
            r#"
            UPDATE documents
            SET slug = $3, body = $4, updated_at = now()
            WHERE collection = $1 AND id = $2
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(collection.as_str())
        .bind(id)
        .bind(slug)
        .bind(body)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, slug))
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn singleton(&self, key: &str, default: &Value) -> Result<Value, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO singletons (key, body, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(default)
        .execute(&self.pool)
        .await?;

        let row: (Value,) = sqlx::query_as("SELECT body FROM singletons WHERE key = $1")
            .bind(key)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn put_singleton(&self, key: &str, body: &Value) -> Result<Value, StoreError> {
        let row: (Value,) = sqlx::query_as(
            r#"
            INSERT INTO singletons (key, body, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO UPDATE SET
                body = EXCLUDED.body,
                updated_at = now()
            RETURNING body
            "#,
        )
        .bind(key)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn admin_by_username(&self, username: &str) -> Result<Option<AdminUser>, StoreError> {
        let row = sqlx::query_as::<_, AdminUser>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE LOWER(username) = LOWER($1)"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminUser, StoreError> {
        sqlx::query_as::<_, AdminUser>(&format!(
            r#"
            INSERT INTO admins (username, password_hash, created_at, updated_at)
            VALUES ($1, $2, now(), now())
            RETURNING {ADMIN_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, None))
    }

    async fn set_reset_token(
        &self,
        admin_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE admins
            SET reset_token_hash = $2, reset_expires = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(admin_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn admin_by_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<AdminUser>, StoreError> {
        let row = sqlx::query_as::<_, AdminUser>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE reset_token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn complete_password_reset(
        &self,
        admin_id: Uuid,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE admins
            SET password_hash = $2, reset_token_hash = NULL, reset_expires = NULL, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(admin_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
