//! Document schemas.
//!
//! Every resource is a typed struct with serde defaults for optional fields
//! and `validator` rules for required ones. Handlers never touch raw JSON
//! past the point where a body is turned into one of these types.

pub mod contact;
pub mod content;
pub mod singletons;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

pub use contact::{ContactStatus, ContactSubmission, StatusUpdate};
pub use content::{
    BlogPost, CaseStudy, CaseStudyCard, ContentBlock, HeroSection, IndustryCard, TeamCard,
    TeamCategory, Testimonial, TrustedCompany,
};
pub use singletons::{FooterSettings, Singleton, WhyChooseUs};

/// Document collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    BlogPosts,
    CaseStudies,
    Industries,
    TeamCategories,
    Testimonials,
    TrustedCompanies,
    HeroSections,
    ContentBlocks,
    ContactSubmissions,
}

impl Collection {
    /// Collections managed through the generic admin CRUD pages.
    pub const MANAGED: [Collection; 8] = [
        Collection::BlogPosts,
        Collection::CaseStudies,
        Collection::Industries,
        Collection::TeamCategories,
        Collection::Testimonials,
        Collection::TrustedCompanies,
        Collection::HeroSections,
        Collection::ContentBlocks,
    ];

    /// Name stored in the `collection` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::BlogPosts => "blog_posts",
            Collection::CaseStudies => "case_studies",
            Collection::Industries => "industries",
            Collection::TeamCategories => "team_categories",
            Collection::Testimonials => "testimonials",
            Collection::TrustedCompanies => "trusted_companies",
            Collection::HeroSections => "hero_sections",
            Collection::ContentBlocks => "content_blocks",
            Collection::ContactSubmissions => "contact_submissions",
        }
    }

    /// Path segment under `/api` and `/admin`.
    pub fn path(self) -> &'static str {
        match self {
            Collection::BlogPosts => "blog",
            Collection::CaseStudies => "case-studies",
            Collection::Industries => "industries",
            Collection::TeamCategories => "team-categories",
            Collection::Testimonials => "testimonials",
            Collection::TrustedCompanies => "trusted-companies",
            Collection::HeroSections => "hero-sections",
            Collection::ContentBlocks => "content-blocks",
            Collection::ContactSubmissions => "contact",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Collection::BlogPosts => "Blog posts",
            Collection::CaseStudies => "Case studies",
            Collection::Industries => "Industries",
            Collection::TeamCategories => "Team categories",
            Collection::Testimonials => "Testimonials",
            Collection::TrustedCompanies => "Trusted companies",
            Collection::HeroSections => "Hero sections",
            Collection::ContentBlocks => "Content blocks",
            Collection::ContactSubmissions => "Contact submissions",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::MANAGED
            .into_iter()
            .chain([Collection::ContactSubmissions])
            .find(|c| c.path() == path)
    }

    /// Slug used when a title has no slug-safe characters. `None` for
    /// collections that do not carry slugs.
    pub fn slug_fallback(self) -> Option<&'static str> {
        match self {
            Collection::BlogPosts => Some("post"),
            Collection::CaseStudies => Some("case-study"),
            _ => None,
        }
    }
}

/// A typed document body stored in one collection.
pub trait Resource:
    Serialize + DeserializeOwned + Validate + Clone + Default + Send + Sync + 'static
{
    const COLLECTION: Collection;

    /// Title the slug is derived from; `None` for unslugged resources.
    fn slug_title(&self) -> Option<&str> {
        None
    }

    fn slug(&self) -> Option<&str> {
        None
    }

    fn set_slug(&mut self, _slug: String) {}

    /// Clean HTML-bearing fields before persistence.
    fn sanitize(&mut self) {}

    /// Short human label for admin listings.
    fn label(&self) -> &str;

    /// Decode and validate a request body.
    fn from_body(body: Value) -> Result<Self, AppError> {
        let mut value: Self = serde_json::from_value(body)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        value.validate()?;
        value.sanitize();
        Ok(value)
    }
}

/// A stored document as returned by the API: identity and timestamps with
/// the body fields flattened alongside.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document<R> {
    pub id: Uuid,
    #[serde(flatten)]
    pub body: R,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Overlay the top-level fields of `patch` onto `base`. Non-object patches
/// replace the base entirely.
pub fn merge_fields(base: Value, patch: Value) -> Value {
    match (base, patch) {
        (Value::Object(mut base), Value::Object(patch)) => {
            for (key, value) in patch {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (_, patch) => patch,
    }
}

/// Strip server-owned keys a client may echo back in a body.
pub fn strip_metadata(mut body: Value) -> Value {
    if let Value::Object(map) = &mut body {
        for key in ["id", "createdAt", "updatedAt"] {
            map.remove(key);
        }
    }
    body
}
