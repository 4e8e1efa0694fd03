//! Process configuration, read once at startup from the environment.

use axum::http::HeaderValue;
use thiserror::Error;

use crate::db::DbConfig;

pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
    #[error(
        "JWT_SECRET must be set to a secure, unique value in production. \
         Refusing to start with the default secret."
    )]
    InsecureSecret,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    /// Adds `Secure` to the session cookie.
    pub secure_cookie: bool,
    pub bcrypt_cost: u32,
    pub login_max_attempts: u32,
    pub login_window_secs: i64,
    /// Lifetime of a password-reset token.
    pub reset_ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: String,
    pub public_prefix: String,
    pub max_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub url: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    /// `None` only for configs built in code; `from_env` requires it.
    pub database: Option<DbConfig>,
    pub auth: AuthConfig,
    pub uploads: UploadConfig,
    pub site: SiteConfig,
    pub allowed_origins: Vec<HeaderValue>,
    /// Global request body cap; covers multipart forms with several images.
    pub body_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3001,
            database: None,
            auth: AuthConfig {
                jwt_secret: DEFAULT_JWT_SECRET.to_string(),
                token_ttl_hours: 24,
                secure_cookie: false,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                login_max_attempts: 5,
                login_window_secs: 60,
                reset_ttl_minutes: 60,
            },
            uploads: UploadConfig {
                dir: "uploads".to_string(),
                public_prefix: "/uploads".to_string(),
                max_bytes: 5 * 1024 * 1024,
            },
            site: SiteConfig {
                url: "http://localhost:3001".to_string(),
                title: "Sitedesk".to_string(),
                description: "Latest articles and case studies".to_string(),
            },
            allowed_origins: vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ],
            body_limit: 25 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Read configuration from the process environment. `DATABASE_URL` is
    /// mandatory.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(environment) = std::env::var("ENVIRONMENT") {
            config.environment = environment;
        }
        if let Ok(host) = std::env::var("HOST") {
            config.host = host;
        }
        config.port = parse_var("PORT", config.port)?;

        let url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        config.database = Some(DbConfig::from_env(url));

        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        if config.is_production() && (secret.is_empty() || secret == DEFAULT_JWT_SECRET) {
            return Err(ConfigError::InsecureSecret);
        }
        if !secret.is_empty() {
            config.auth.jwt_secret = secret;
        }
        config.auth.secure_cookie = config.is_production();
        config.auth.token_ttl_hours = parse_var("TOKEN_TTL_HOURS", config.auth.token_ttl_hours)?;
        config.auth.login_max_attempts =
            parse_var("LOGIN_MAX_ATTEMPTS", config.auth.login_max_attempts)?;
        config.auth.login_window_secs =
            parse_var("LOGIN_WINDOW_SECS", config.auth.login_window_secs)?;

        if let Ok(dir) = std::env::var("UPLOAD_DIR") {
            config.uploads.dir = dir;
        }
        config.uploads.max_bytes = parse_var("UPLOAD_MAX_BYTES", config.uploads.max_bytes)?;

        if let Ok(url) = std::env::var("SITE_URL") {
            config.site.url = url.trim_end_matches('/').to_string();
        }
        if let Ok(title) = std::env::var("SITE_TITLE") {
            config.site.title = title;
        }
        if let Ok(description) = std::env::var("SITE_DESCRIPTION") {
            config.site.description = description;
        }

        if let Some(origins) = allowed_origins_from_env() {
            config.allowed_origins = origins;
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, fallback: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        _ => Ok(fallback),
    }
}

/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
fn allowed_origins_from_env() -> Option<Vec<HeaderValue>> {
    std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
}
