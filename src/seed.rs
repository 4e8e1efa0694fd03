//! Content seeding through the public API: fixed samples, or the entries of
//! an archived-site snapshot.

use reqwest::{header, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::auth::SESSION_COOKIE;
use crate::schema::{strip_metadata, Collection};

const FOOTER_PATH: &str = "/api/footer";
const WHY_CHOOSE_US_PATH: &str = "/api/why-choose-us";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{method} {path} returned {status}: {body}")]
    Status {
        method: &'static str,
        path: String,
        status: StatusCode,
        body: String,
    },
    #[error("invalid snapshot: {0}")]
    Snapshot(String),
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything one seeding run sends.
#[derive(Debug, Default)]
pub struct SeedPlan {
    /// Documents per collection, posted in order.
    pub collections: Vec<(Collection, Vec<Value>)>,
    pub footer: Option<Value>,
    pub why_choose_us: Option<Value>,
}

impl SeedPlan {
    pub fn document_count(&self) -> usize {
        self.collections.iter().map(|(_, docs)| docs.len()).sum()
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub singletons: usize,
}

/// Read a snapshot: an object mapping API path (`blog`, `/api/blog`, ...)
/// to an array of documents, with optional `footer` and `whyChooseUs`
/// objects.
pub fn parse_snapshot(snapshot: Value) -> Result<SeedPlan, SeedError> {
    let Value::Object(entries) = snapshot else {
        return Err(SeedError::Snapshot("top level must be an object".to_string()));
    };

    let mut plan = SeedPlan::default();
    for (key, value) in entries {
        match key.as_str() {
            "footer" => plan.footer = Some(singleton_entry(&key, value)?),
            "whyChooseUs" => plan.why_choose_us = Some(singleton_entry(&key, value)?),
            _ => {
                let path = key.trim_start_matches('/');
                let path = path.strip_prefix("api/").unwrap_or(path);
                let collection = Collection::from_path(path)
                    .ok_or_else(|| SeedError::Snapshot(format!("unknown collection `{key}`")))?;
                let Value::Array(items) = value else {
                    return Err(SeedError::Snapshot(format!("`{key}` must be an array")));
                };
                let docs = items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(_) => Ok(strip_server_fields(item)),
                        _ => Err(SeedError::Snapshot(format!(
                            "`{key}` entries must be objects"
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                plan.collections.push((collection, docs));
            }
        }
    }
    Ok(plan)
}

fn singleton_entry(key: &str, value: Value) -> Result<Value, SeedError> {
    match value {
        Value::Object(_) => Ok(strip_server_fields(value)),
        _ => Err(SeedError::Snapshot(format!("`{key}` must be an object"))),
    }
}

/// Slugs are server-assigned; archived ones are dropped along with ids and
/// timestamps.
fn strip_server_fields(doc: Value) -> Value {
    let mut doc = strip_metadata(doc);
    if let Value::Object(map) = &mut doc {
        map.remove("slug");
        map.remove("_id");
    }
    doc
}

pub fn sample_plan() -> SeedPlan {
    SeedPlan {
        collections: vec![
            (
                Collection::HeroSections,
                vec![json!({
                    "page": "home",
                    "title": "Engineering teams that ship",
                    "subtitle": "Dedicated squads for product companies",
                    "buttonText": "Talk to us",
                    "buttonLink": "/contact"
                })],
            ),
            (
                Collection::BlogPosts,
                vec![
                    json!({
                        "title": "Scaling a Remote Team",
                        "description": "Lessons from growing from five to fifty engineers.",
                        "content": "<p>Hiring is the easy part. Keeping context is not.</p>"
                    }),
                    json!({
                        "title": "Why We Write Design Docs",
                        "description": "Short documents, fewer meetings.",
                        "content": "<p>A page of prose saves a week of rework.</p>"
                    }),
                ],
            ),
            (
                Collection::CaseStudies,
                vec![json!({
                    "title": "Fintech Platform Rebuild",
                    "content": "<p>Moved a monolith to services without downtime.</p>",
                    "headerTitle": "Rebuilding payments",
                    "headerDescription": "A twelve month migration",
                    "cards": [
                        {"title": "Challenge", "description": "Legacy batch jobs"},
                        {"title": "Result", "description": "Real-time settlement"}
                    ]
                })],
            ),
            (
                Collection::Industries,
                vec![
                    json!({
                        "title": "Healthcare",
                        "description": "Compliant data platforms.",
                        "tags": ["HIPAA", "Data"]
                    }),
                    json!({
                        "title": "Logistics",
                        "description": "Routing and tracking at scale.",
                        "tags": ["IoT"]
                    }),
                ],
            ),
            (
                Collection::TeamCategories,
                vec![json!({
                    "tabName": "Engineering",
                    "cards": [{
                        "title": "Backend",
                        "description": "APIs and data pipelines",
                        "tags": ["Rust", "PostgreSQL"],
                        "buttonText": "Meet the team"
                    }]
                })],
            ),
            (
                Collection::Testimonials,
                vec![json!({
                    "name": "Dana Reyes",
                    "title": "CTO, Northwind",
                    "quote": "They felt like part of our own team from week one."
                })],
            ),
            (
                Collection::TrustedCompanies,
                vec![json!({"name": "Northwind", "image": "/uploads/northwind.svg"})],
            ),
            (
                Collection::ContentBlocks,
                vec![json!({
                    "section": "about",
                    "title": "How we work",
                    "body": "Small teams, weekly demos, shared ownership.",
                    "position": 1
                })],
            ),
        ],
        footer: Some(json!({
            "branding": {"tagline": "Software teams on demand"},
            "links": [
                {"label": "Blog", "href": "/blog"},
                {"label": "Contact", "href": "/contact"}
            ],
            "contact": {"email": "hello@example.com"}
        })),
        why_choose_us: Some(json!({
            "title": "Why choose us",
            "intro": ["We build long-lived teams, not one-off projects."],
            "benefits": [
                {"title": "Senior engineers", "description": "Every squad is led by a staff engineer."},
                {"title": "Transparent delivery", "description": "Weekly demos and open roadmaps."}
            ],
            "mission": "Make great engineering accessible.",
            "vision": "Every product team has the people it needs."
        })),
    }
}

#[derive(Deserialize)]
struct LoginBody {
    token: String,
}

/// Authenticated client for the content API.
pub struct SeedClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl SeedClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), SeedError> {
        let path = "/api/auth/login";
        let res = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(&json!({"username": username, "password": password}))
            .send()
            .await?;
        let res = check("POST", path, res).await?;
        let body: LoginBody = res.json().await?;
        self.token = Some(body.token);
        tracing::info!(username, "logged in");
        Ok(())
    }

    async fn send(
        &self,
        method: &'static str,
        path: &str,
        body: &Value,
    ) -> Result<Value, SeedError> {
        let url = format!("{}{path}", self.base_url);
        let mut req = match method {
            "PUT" => self.http.put(url),
            _ => self.http.post(url),
        };
        if let Some(token) = &self.token {
            req = req.header(header::COOKIE, format!("{SESSION_COOKIE}={token}"));
        }
        let res = req.json(body).send().await?;
        let res = check(method, path, res).await?;
        Ok(res.json().await?)
    }

    /// Send every document of `plan`, stopping at the first rejected one.
    pub async fn seed(&self, plan: &SeedPlan) -> Result<SeedReport, SeedError> {
        let mut report = SeedReport::default();
        for (collection, docs) in &plan.collections {
            let path = format!("/api/{}", collection.path());
            for doc in docs {
                self.send("POST", &path, doc).await?;
                report.created += 1;
            }
            tracing::info!(collection = collection.as_str(), count = docs.len(), "seeded");
        }
        for (path, doc) in [
            (FOOTER_PATH, &plan.footer),
            (WHY_CHOOSE_US_PATH, &plan.why_choose_us),
        ] {
            if let Some(doc) = doc {
                self.send("PUT", path, doc).await?;
                report.singletons += 1;
                tracing::info!(path, "singleton seeded");
            }
        }
        Ok(report)
    }
}

async fn check(
    method: &'static str,
    path: &str,
    res: reqwest::Response,
) -> Result<reqwest::Response, SeedError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(SeedError::Status {
        method,
        path: path.to_string(),
        status,
        body,
    })
}

/// Snapshot file contents as a plan.
pub fn load_snapshot(path: &std::path::Path) -> Result<SeedPlan, SeedError> {
    let raw = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;
    parse_snapshot(value)
}
