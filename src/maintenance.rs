//! One-off administrative tasks run from the command-line tools.

use crate::auth::hash_password;
use crate::db::{documents, AdminUser, ContentStore};
use crate::error::{AppError, StoreError};
use crate::schema::{BlogPost, CaseStudy, Resource};

/// Create an admin account. Usernames are unique; a second account with the
/// same name is refused with [`AppError::Conflict`].
pub async fn bootstrap_admin(
    store: &dyn ContentStore,
    username: &str,
    password: &str,
    cost: u32,
) -> Result<AdminUser, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username is required".to_string()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }
    if store.admin_by_username(username).await?.is_some() {
        return Err(AppError::Conflict(format!("admin `{username}` already exists")));
    }

    let hash = hash_password(password.to_string(), cost).await?;
    let admin = store.insert_admin(username, &hash).await.map_err(|e| match e {
        StoreError::Conflict(msg) => AppError::Conflict(msg),
        other => AppError::Store(other),
    })?;
    tracing::info!(username = %admin.username, "admin created");
    Ok(admin)
}

/// Assign slugs to blog posts and case studies stored without one. Returns
/// how many documents were updated.
pub async fn backfill_slugs(store: &dyn ContentStore) -> Result<usize, AppError> {
    let posts = backfill::<BlogPost>(store).await?;
    let studies = backfill::<CaseStudy>(store).await?;
    Ok(posts + studies)
}

async fn backfill<R: Resource>(store: &dyn ContentStore) -> Result<usize, AppError> {
    let mut updated = 0;
    for record in store.missing_slugs(R::COLLECTION).await? {
        let id = record.id;
        let doc = record.decode::<R>()?;
        if let Some(doc) = documents::backfill_slug(store, id, doc.body).await? {
            tracing::info!(
                collection = R::COLLECTION.as_str(),
                %id,
                slug = doc.body.slug().unwrap_or_default(),
                "slug assigned"
            );
            updated += 1;
        }
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_bootstrap_admin_refuses_duplicates() {
        let store = MemoryStore::new();
        let admin = bootstrap_admin(&store, " root ", "correct horse", 4)
            .await
            .unwrap();
        assert_eq!(admin.username, "root");
        assert!(bcrypt::verify("correct horse", &admin.password_hash).unwrap());

        let err = bootstrap_admin(&store, "root", "another one", 4)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_bootstrap_admin_requires_password() {
        let store = MemoryStore::new();
        let err = bootstrap_admin(&store, "root", "", 4).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_backfill_assigns_unique_slugs() {
        let store = MemoryStore::new();
        let body = json!({"title": "Launch Notes", "description": "d"});
        store.insert(BlogPost::COLLECTION, None, &body).await.unwrap();
        store.insert(BlogPost::COLLECTION, None, &body).await.unwrap();
        store
            .insert(
                CaseStudy::COLLECTION,
                None,
                &json!({"title": "!!!", "content": "c"}),
            )
            .await
            .unwrap();

        assert_eq!(backfill_slugs(&store).await.unwrap(), 3);

        let mut slugs: Vec<String> = documents::list::<BlogPost>(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.body.slug)
            .collect();
        slugs.sort();
        assert_eq!(slugs, vec!["launch-notes", "launch-notes-1"]);

        let studies = documents::list::<CaseStudy>(&store).await.unwrap();
        assert_eq!(studies[0].body.slug, "case-study");

        assert_eq!(backfill_slugs(&store).await.unwrap(), 0);
    }
}
