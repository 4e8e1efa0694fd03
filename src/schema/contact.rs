use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Collection, Resource};

/// Operator-driven workflow state; any value may follow any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    New,
    Contacted,
    Resolved,
}

impl ContactStatus {
    pub const ALL: [ContactStatus; 3] = [
        ContactStatus::New,
        ContactStatus::Contacted,
        ContactStatus::Resolved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContactStatus::New => "new",
            ContactStatus::Contacted => "contacted",
            ContactStatus::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactSubmission {
    #[validate(length(min = 1, message = "firstName is required"))]
    pub first_name: String,
    pub last_name: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    pub phone: String,
    #[validate(length(min = 1, message = "message is required"))]
    pub message: String,
    pub status: ContactStatus,
}

impl Resource for ContactSubmission {
    const COLLECTION: Collection = Collection::ContactSubmissions;

    fn label(&self) -> &str {
        &self.email
    }
}

/// Body of `PATCH /api/contact/{id}`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: ContactStatus,
}
