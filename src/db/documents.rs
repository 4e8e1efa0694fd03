//! Typed document operations on top of [`ContentStore`], including slug
//! assignment for slugged resources.

use uuid::Uuid;

use super::ContentStore;
use crate::error::{AppError, StoreError};
use crate::schema::{Document, Resource};
use crate::slug::{base_slug, candidate, first_free, MAX_SLUG_ATTEMPTS};

pub async fn list<R: Resource>(store: &dyn ContentStore) -> Result<Vec<Document<R>>, AppError> {
    let records = store.list(R::COLLECTION).await?;
    let docs = records
        .into_iter()
        .map(|r| r.decode::<R>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(docs)
}

pub async fn get<R: Resource>(
    store: &dyn ContentStore,
    id: Uuid,
) -> Result<Option<Document<R>>, AppError> {
    match store.get(R::COLLECTION, id).await? {
        Some(record) => Ok(Some(record.decode()?)),
        None => Ok(None),
    }
}

/// Look a document up by id, or by slug when `key` is not a UUID.
pub async fn find<R: Resource>(
    store: &dyn ContentStore,
    key: &str,
) -> Result<Option<Document<R>>, AppError> {
    if let Ok(id) = Uuid::parse_str(key) {
        return get(store, id).await;
    }
    if R::COLLECTION.slug_fallback().is_none() {
        return Ok(None);
    }
    match store.get_by_slug(R::COLLECTION, key).await? {
        Some(record) => Ok(Some(record.decode()?)),
        None => Ok(None),
    }
}

pub async fn create<R: Resource>(
    store: &dyn ContentStore,
    mut body: R,
) -> Result<Document<R>, AppError> {
    if body.slug_title().is_some() {
        let record = write_with_fresh_slug(store, None, &mut body).await?;
        return record.ok_or(AppError::NotFound);
    }
    let value = serde_json::to_value(&body).map_err(StoreError::from)?;
    let record = store.insert(R::COLLECTION, None, &value).await?;
    Ok(record.decode()?)
}

/// Replace a document's body. A slug already derived from the (possibly
/// new) title is kept; otherwise a fresh one is assigned.
pub async fn update<R: Resource>(
    store: &dyn ContentStore,
    id: Uuid,
    previous_slug: Option<&str>,
    mut body: R,
) -> Result<Option<Document<R>>, AppError> {
    let Some(title) = body.slug_title() else {
        let value = serde_json::to_value(&body).map_err(StoreError::from)?;
        return match store.replace(R::COLLECTION, id, None, &value).await? {
            Some(record) => Ok(Some(record.decode()?)),
            None => Ok(None),
        };
    };

    let base = base_slug(title, R::COLLECTION.slug_fallback().unwrap_or("item"));
    if let Some(current) = previous_slug.filter(|s| derived_from(s, &base)) {
        body.set_slug(current.to_string());
        let value = serde_json::to_value(&body).map_err(StoreError::from)?;
        return match store.replace(R::COLLECTION, id, Some(current), &value).await? {
            Some(record) => Ok(Some(record.decode()?)),
            None => Ok(None),
        };
    }

    match write_with_fresh_slug(store, Some(id), &mut body).await? {
        Some(record) => Ok(Some(record)),
        None => Ok(None),
    }
}

/// Assign a slug to a stored document that has none and persist it.
pub async fn backfill_slug<R: Resource>(
    store: &dyn ContentStore,
    id: Uuid,
    mut body: R,
) -> Result<Option<Document<R>>, AppError> {
    write_with_fresh_slug(store, Some(id), &mut body).await
}

pub async fn delete<R: Resource>(store: &dyn ContentStore, id: Uuid) -> Result<(), AppError> {
    if store.delete(R::COLLECTION, id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

/// `slug` is `base` or `base-<n>`.
fn derived_from(slug: &str, base: &str) -> bool {
    slug == base
        || slug
            .strip_prefix(base)
            .and_then(|rest| rest.strip_prefix('-'))
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Write `body` under the first free slug for its title, moving to the next
/// candidate whenever the store's unique index reports a clash. `target`
/// selects insert (`None`) or replace.
async fn write_with_fresh_slug<R: Resource>(
    store: &dyn ContentStore,
    target: Option<Uuid>,
    body: &mut R,
) -> Result<Option<Document<R>>, AppError> {
    let title = body.slug_title().unwrap_or_default();
    let base = base_slug(title, R::COLLECTION.slug_fallback().unwrap_or("item"));
    let taken = store.slugs_like(R::COLLECTION, &base).await?;
    let mut n = first_free(&base, &taken);

    for _ in 0..MAX_SLUG_ATTEMPTS {
        let slug = candidate(&base, n);
        body.set_slug(slug.clone());
        let value = serde_json::to_value(&*body).map_err(StoreError::from)?;
        let written = match target {
            None => store
                .insert(R::COLLECTION, Some(&slug), &value)
                .await
                .map(Some),
            Some(id) => store.replace(R::COLLECTION, id, Some(&slug), &value).await,
        };
        match written {
            Ok(Some(record)) => return Ok(Some(record.decode()?)),
            Ok(None) => return Ok(None),
            Err(StoreError::SlugTaken(slug)) => {
                tracing::debug!(slug = %slug, "slug claimed concurrently, trying next candidate");
                n += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Conflict(format!(
        "could not find a free slug for `{base}`"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AdminUser, DocumentRecord, MemoryStore};
    use crate::schema::{BlogPost, CaseStudy, Collection, Testimonial};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde_json::Value;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn case_study(title: &str) -> CaseStudy {
        CaseStudy {
            title: title.to_string(),
            content: "body".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_derived_from() {
        assert!(derived_from("hello", "hello"));
        assert!(derived_from("hello-3", "hello"));
        assert!(!derived_from("hello-world", "hello"));
        assert!(!derived_from("hello-", "hello"));
        assert!(!derived_from("other", "hello"));
    }

    #[tokio::test]
    async fn test_identical_titles_get_suffixed_slugs() {
        let store = MemoryStore::new();
        let first = create(&store, case_study("Hello, World!")).await.unwrap();
        let second = create(&store, case_study("Hello, World!")).await.unwrap();
        let third = create(&store, case_study("hello world")).await.unwrap();
        assert_eq!(first.body.slug, "hello-world");
        assert_eq!(second.body.slug, "hello-world-1");
        assert_eq!(third.body.slug, "hello-world-2");
    }

    #[tokio::test]
    async fn test_client_supplied_slug_is_ignored() {
        let store = MemoryStore::new();
        let post = BlogPost {
            title: "Launch Day".into(),
            description: "d".into(),
            slug: "custom".into(),
            ..Default::default()
        };
        let doc = create(&store, post).await.unwrap();
        assert_eq!(doc.body.slug, "launch-day");
    }

    #[tokio::test]
    async fn test_update_keeps_slug_when_title_base_unchanged() {
        let store = MemoryStore::new();
        create(&store, case_study("Growth")).await.unwrap();
        let second = create(&store, case_study("Growth")).await.unwrap();
        assert_eq!(second.body.slug, "growth-1");

        let mut edited = second.body.clone();
        edited.content = "edited".into();
        let updated = update(&store, second.id, Some("growth-1"), edited)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.body.slug, "growth-1");
        assert_eq!(updated.body.content, "edited");
    }

    #[tokio::test]
    async fn test_update_regenerates_slug_on_title_change() {
        let store = MemoryStore::new();
        let doc = create(&store, case_study("Old Title")).await.unwrap();
        let mut edited = doc.body.clone();
        edited.title = "New Title".into();
        let updated = update(&store, doc.id, Some("old-title"), edited)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.body.slug, "new-title");
        assert!(find::<CaseStudy>(&store, "new-title").await.unwrap().is_some());
        assert!(find::<CaseStudy>(&store, "old-title").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_id_is_none() {
        let store = MemoryStore::new();
        let result = update(&store, Uuid::new_v4(), None, case_study("x"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_by_slug_only_for_slugged_collections() {
        let store = MemoryStore::new();
        let doc = create(
            &store,
            Testimonial {
                name: "Ada".into(),
                quote: "q".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(find::<Testimonial>(&store, &doc.id.to_string())
            .await
            .unwrap()
            .is_some());
        assert!(find::<Testimonial>(&store, "ada").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = delete::<Testimonial>(&store, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    /// Memory store that never reports taken slugs up front, so every clash
    /// surfaces from the write itself. With `always_taken` every slugged
    /// insert fails.
    struct BlindSlugs {
        inner: MemoryStore,
        always_taken: bool,
        inserts: AtomicUsize,
    }

    impl BlindSlugs {
        fn new(always_taken: bool) -> Self {
            Self {
                inner: MemoryStore::new(),
                always_taken,
                inserts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ContentStore for BlindSlugs {
        async fn ping(&self) -> Result<Duration, StoreError> {
            self.inner.ping().await
        }
        async fn list(&self, c: Collection) -> Result<Vec<DocumentRecord>, StoreError> {
            self.inner.list(c).await
        }
        async fn count(&self, c: Collection) -> Result<i64, StoreError> {
            self.inner.count(c).await
        }
        async fn get(&self, c: Collection, id: Uuid) -> Result<Option<DocumentRecord>, StoreError> {
            self.inner.get(c, id).await
        }
        async fn get_by_slug(
            &self,
            c: Collection,
            slug: &str,
        ) -> Result<Option<DocumentRecord>, StoreError> {
            self.inner.get_by_slug(c, slug).await
        }
        async fn slugs_like(&self, _c: Collection, _base: &str) -> Result<Vec<String>, StoreError> {
            Ok(Vec::new())
        }
        async fn missing_slugs(&self, c: Collection) -> Result<Vec<DocumentRecord>, StoreError> {
            self.inner.missing_slugs(c).await
        }
        async fn insert(
            &self,
            c: Collection,
            slug: Option<&str>,
            body: &Value,
        ) -> Result<DocumentRecord, StoreError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            match slug {
                Some(slug) if self.always_taken => Err(StoreError::SlugTaken(slug.to_string())),
                _ => self.inner.insert(c, slug, body).await,
            }
        }
        async fn replace(
            &self,
            c: Collection,
            id: Uuid,
            slug: Option<&str>,
            body: &Value,
        ) -> Result<Option<DocumentRecord>, StoreError> {
            self.inner.replace(c, id, slug, body).await
        }
        async fn delete(&self, c: Collection, id: Uuid) -> Result<bool, StoreError> {
            self.inner.delete(c, id).await
        }
        async fn singleton(&self, key: &str, default: &Value) -> Result<Value, StoreError> {
            self.inner.singleton(key, default).await
        }
        async fn put_singleton(&self, key: &str, body: &Value) -> Result<Value, StoreError> {
            self.inner.put_singleton(key, body).await
        }
        async fn admin_by_username(&self, username: &str) -> Result<Option<AdminUser>, StoreError> {
            self.inner.admin_by_username(username).await
        }
        async fn insert_admin(&self, username: &str, hash: &str) -> Result<AdminUser, StoreError> {
            self.inner.insert_admin(username, hash).await
        }
        async fn set_reset_token(
            &self,
            admin_id: Uuid,
            token_hash: &str,
            expires_at: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            self.inner.set_reset_token(admin_id, token_hash, expires_at).await
        }
        async fn admin_by_reset_token(&self, token_hash: &str) -> Result<Option<AdminUser>, StoreError> {
            self.inner.admin_by_reset_token(token_hash).await
        }
        async fn complete_password_reset(&self, admin_id: Uuid, hash: &str) -> Result<(), StoreError> {
            self.inner.complete_password_reset(admin_id, hash).await
        }
    }

    #[tokio::test]
    async fn test_slug_clash_on_write_moves_to_next_candidate() {
        let store = BlindSlugs::new(false);
        let first = create(&store, case_study("Same Title")).await.unwrap();
        let second = create(&store, case_study("Same Title")).await.unwrap();
        let third = create(&store, case_study("Same Title")).await.unwrap();
        assert_eq!(first.body.slug, "same-title");
        assert_eq!(second.body.slug, "same-title-1");
        assert_eq!(third.body.slug, "same-title-2");
        // 1 + 2 + 3 insert attempts
        assert_eq!(store.inserts.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_persistent_slug_clash_gives_up_with_conflict() {
        let store = BlindSlugs::new(true);
        let err = create(&store, case_study("Crowded")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.inserts.load(Ordering::SeqCst), MAX_SLUG_ATTEMPTS);
        assert_eq!(store.count(Collection::CaseStudies).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_get_distinct_slugs() {
        let store = Arc::new(MemoryStore::new());
        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { create(store.as_ref(), case_study("Busy Title")).await })
            })
            .collect();

        let mut slugs = HashSet::new();
        for task in tasks {
            let doc = task.await.unwrap().unwrap();
            assert!(doc.body.slug == "busy-title" || doc.body.slug.starts_with("busy-title-"));
            slugs.insert(doc.body.slug);
        }
        assert_eq!(slugs.len(), 32);
        assert_eq!(store.count(Collection::CaseStudies).await.unwrap(), 32);
    }
}
