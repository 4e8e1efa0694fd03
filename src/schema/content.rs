//! Collection resources rendered on the public site.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Collection, Resource};

fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct BlogPost {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub slug: String,
    pub image: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    /// Sanitized HTML body.
    pub content: String,
}

impl Resource for BlogPost {
    const COLLECTION: Collection = Collection::BlogPosts;

    fn slug_title(&self) -> Option<&str> {
        Some(self.title.as_str())
    }

    fn slug(&self) -> Option<&str> {
        Some(self.slug.as_str()).filter(|s| !s.is_empty())
    }

    fn set_slug(&mut self, slug: String) {
        self.slug = slug;
    }

    fn sanitize(&mut self) {
        self.content = sanitize_html(&self.content);
    }

    fn label(&self) -> &str {
        &self.title
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct CaseStudyCard {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub description: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct CaseStudy {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub slug: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
    pub header_title: String,
    pub header_description: String,
    pub header_image: String,
    #[validate(nested)]
    pub cards: Vec<CaseStudyCard>,
}

impl Resource for CaseStudy {
    const COLLECTION: Collection = Collection::CaseStudies;

    fn slug_title(&self) -> Option<&str> {
        Some(self.title.as_str())
    }

    fn slug(&self) -> Option<&str> {
        Some(self.slug.as_str()).filter(|s| !s.is_empty())
    }

    fn set_slug(&mut self, slug: String) {
        self.slug = slug;
    }

    fn sanitize(&mut self) {
        self.content = sanitize_html(&self.content);
    }

    fn label(&self) -> &str {
        &self.title
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct IndustryCard {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    pub image: String,
    pub tags: Vec<String>,
}

impl Resource for IndustryCard {
    const COLLECTION: Collection = Collection::Industries;

    fn label(&self) -> &str {
        &self.title
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct TeamCard {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub description: String,
    pub image: String,
    pub tags: Vec<String>,
    pub button_text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct TeamCategory {
    #[validate(length(min = 1, message = "tabName is required"))]
    pub tab_name: String,
    #[validate(nested)]
    pub cards: Vec<TeamCard>,
}

impl Resource for TeamCategory {
    const COLLECTION: Collection = Collection::TeamCategories;

    fn label(&self) -> &str {
        &self.tab_name
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct Testimonial {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    /// Job title of the person quoted.
    pub title: String,
    #[validate(length(min = 1, message = "quote is required"))]
    pub quote: String,
    pub image: String,
}

impl Resource for Testimonial {
    const COLLECTION: Collection = Collection::Testimonials;

    fn label(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct TrustedCompany {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "image is required"))]
    pub image: String,
}

impl Resource for TrustedCompany {
    const COLLECTION: Collection = Collection::TrustedCompanies;

    fn label(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct HeroSection {
    /// Page key the hero belongs to, e.g. `home`.
    #[validate(length(min = 1, message = "page is required"))]
    pub page: String,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub subtitle: String,
    pub image: String,
    pub button_text: String,
    pub button_link: String,
}

impl Resource for HeroSection {
    const COLLECTION: Collection = Collection::HeroSections;

    fn label(&self) -> &str {
        &self.title
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentBlock {
    #[validate(length(min = 1, message = "section is required"))]
    pub section: String,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    /// Sanitized HTML body.
    pub body: String,
    pub image: String,
    pub position: i32,
}

impl Resource for ContentBlock {
    const COLLECTION: Collection = Collection::ContentBlocks;

    fn sanitize(&mut self) {
        self.body = sanitize_html(&self.body);
    }

    fn label(&self) -> &str {
        &self.title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use serde_json::json;

    #[test]
    fn test_blog_post_requires_title() {
        let err = BlogPost::from_body(json!({"description": "d"})).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("title is required")));
    }

    #[test]
    fn test_blog_post_content_is_sanitized() {
        let post = BlogPost::from_body(json!({
            "title": "t",
            "description": "d",
            "content": "<p>hi</p><script>alert(1)</script>"
        }))
        .unwrap();
        assert_eq!(post.content, "<p>hi</p>");
    }

    #[test]
    fn test_case_study_cards_are_validated() {
        let err = CaseStudy::from_body(json!({
            "title": "t",
            "content": "c",
            "cards": [{"description": "no title"}]
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("cards.0")));
    }

    #[test]
    fn test_wrong_field_type_is_bad_request() {
        let err = IndustryCard::from_body(json!({
            "title": "t",
            "description": "d",
            "tags": "not-a-list"
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_team_category_defaults() {
        let team = TeamCategory::from_body(json!({"tabName": "Engineering"})).unwrap();
        assert!(team.cards.is_empty());
        assert_eq!(team.label(), "Engineering");
    }
}
