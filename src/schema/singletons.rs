//! Singleton documents: at most one of each exists, managed by find-or-create.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::error::AppError;

pub trait Singleton:
    Serialize + DeserializeOwned + Validate + Default + Clone + Send + Sync + 'static
{
    /// Primary key in the `singletons` table.
    const KEY: &'static str;

    fn from_body(body: Value) -> Result<Self, AppError> {
        let value: Self = serde_json::from_value(body)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        value.validate()?;
        Ok(value)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct Branding {
    pub logo: String,
    pub tagline: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct FooterLink {
    #[validate(length(min = 1, message = "label is required"))]
    pub label: String,
    #[validate(length(min = 1, message = "href is required"))]
    pub href: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct Certification {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactBlock {
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddressBlock {
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct FooterSettings {
    pub branding: Branding,
    #[validate(nested)]
    pub links: Vec<FooterLink>,
    #[validate(nested)]
    pub certifications: Vec<Certification>,
    pub contact: ContactBlock,
    pub address: AddressBlock,
}

impl Singleton for FooterSettings {
    const KEY: &'static str = "footer";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct Benefit {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct WhyChooseUs {
    pub title: String,
    pub intro: Vec<String>,
    #[validate(nested)]
    pub benefits: Vec<Benefit>,
    pub mission: String,
    pub vision: String,
}

impl Singleton for WhyChooseUs {
    const KEY: &'static str = "why_choose_us";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_footer_has_present_arrays() {
        let value = serde_json::to_value(FooterSettings::default()).unwrap();
        assert_eq!(value["links"], json!([]));
        assert_eq!(value["certifications"], json!([]));
        assert!(value["contact"].is_object());
    }

    #[test]
    fn test_footer_link_requires_href() {
        let err = FooterSettings::from_body(json!({"links": [{"label": "Home"}]})).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("href is required")));
    }

    #[test]
    fn test_why_choose_us_partial_body() {
        let why = WhyChooseUs::from_body(json!({"mission": "Ship"})).unwrap();
        assert_eq!(why.mission, "Ship");
        assert!(why.benefits.is_empty());
    }
}
