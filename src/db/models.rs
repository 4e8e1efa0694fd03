//! Database Models - rows of the `documents` and `admins` tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::StoreError;
use crate::schema::{Document, Resource};

/// One stored document. `body` is the JSON shape of the owning resource.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub collection: String,
    pub slug: Option<String>,
    pub body: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn decode<R: Resource>(self) -> Result<Document<R>, StoreError> {
        Ok(Document {
            id: self.id,
            body: serde_json::from_value(self.body)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Admin account. Hashes only; never serialized back to clients.
#[derive(Debug, Clone, FromRow)]
pub struct AdminUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub reset_token_hash: Option<String>,
    pub reset_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
