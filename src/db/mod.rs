pub mod documents;
pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use uuid::Uuid;

use crate::error::StoreError;
use crate::schema::Collection;

pub use memory::MemoryStore;
pub use models::{AdminUser, DocumentRecord};
pub use postgres::PgStore;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl DbConfig {
    /// Pool settings from `DB_POOL_*` variables around an explicit URL.
    pub fn from_env(url: String) -> Self {
        Self {
            url,
            max_connections: std::env::var("DB_POOL_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            min_connections: std::env::var("DB_POOL_MIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            connect_timeout_secs: std::env::var("DB_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            idle_timeout_secs: std::env::var("DB_IDLE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        }
    }
}

/// Persistence seam for every handler. Implementations must enforce slug
/// uniqueness per collection atomically and report a clash as
/// [`StoreError::SlugTaken`].
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Round-trip to the backing store.
    async fn ping(&self) -> Result<Duration, StoreError>;

    /// All documents in a collection, newest first.
    async fn list(&self, collection: Collection) -> Result<Vec<DocumentRecord>, StoreError>;

    async fn count(&self, collection: Collection) -> Result<i64, StoreError>;

    async fn get(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<DocumentRecord>, StoreError>;

    async fn get_by_slug(
        &self,
        collection: Collection,
        slug: &str,
    ) -> Result<Option<DocumentRecord>, StoreError>;

    /// Slugs equal to `base` or of the form `base-*`.
    async fn slugs_like(&self, collection: Collection, base: &str)
        -> Result<Vec<String>, StoreError>;

    /// Documents whose slug has never been assigned.
    async fn missing_slugs(&self, collection: Collection)
        -> Result<Vec<DocumentRecord>, StoreError>;

    async fn insert(
        &self,
        collection: Collection,
        slug: Option<&str>,
        body: &Value,
    ) -> Result<DocumentRecord, StoreError>;

    /// Replace the body (and slug) of an existing document. `Ok(None)` if
    /// the id does not exist.
    async fn replace(
        &self,
        collection: Collection,
        id: Uuid,
        slug: Option<&str>,
        body: &Value,
    ) -> Result<Option<DocumentRecord>, StoreError>;

    /// `Ok(false)` if nothing was deleted.
    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError>;

    /// Find-or-create: returns the stored singleton, inserting `default`
    /// first if none exists.
    async fn singleton(&self, key: &str, default: &Value) -> Result<Value, StoreError>;

    /// Update-if-exists-else-create.
    async fn put_singleton(&self, key: &str, body: &Value) -> Result<Value, StoreError>;

    async fn admin_by_username(&self, username: &str) -> Result<Option<AdminUser>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the username exists.
    async fn insert_admin(&self, username: &str, password_hash: &str)
        -> Result<AdminUser, StoreError>;

    async fn set_reset_token(
        &self,
        admin_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn admin_by_reset_token(&self, token_hash: &str)
        -> Result<Option<AdminUser>, StoreError>;

    /// Store a new password hash and clear any reset token.
    async fn complete_password_reset(
        &self,
        admin_id: Uuid,
        password_hash: &str,
    ) -> Result<(), StoreError>;
}

pub async fn init_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Initializing database connection pool...");
    tracing::debug!(
        "Database URL: {}",
        config.url.replace(
            |c: char| !c.is_ascii_alphanumeric() && c != ':' && c != '/' && c != '@' && c != '.',
            "*"
        )
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            collection TEXT NOT NULL,
            slug TEXT,
            body JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_documents_collection_slug
            ON documents(collection, slug) WHERE slug IS NOT NULL
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_documents_collection_created
            ON documents(collection, created_at DESC)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS singletons (
            key TEXT PRIMARY KEY,
            body JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS admins (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            username TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            reset_token_hash TEXT,
            reset_expires TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_admins_reset_token_hash
            ON admins(reset_token_hash) WHERE reset_token_hash IS NOT NULL
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");

    Ok(())
}
