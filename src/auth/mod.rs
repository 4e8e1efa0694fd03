/*!
 * Admin authentication
 * Stateless signed tokens carried in a cookie, bcrypt password hashes,
 * reset tokens and login throttling.
 */
pub mod middleware;

use axum::http::{header, HeaderMap, HeaderValue};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::config::AuthConfig;
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "admin_token";

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,      // Admin ID
    pub username: String, // Admin username
    pub exp: i64,         // Expiry timestamp
    pub iat: i64,         // Issued at timestamp
}

pub fn issue_token(
    config: &AuthConfig,
    admin_id: &str,
    username: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::hours(config.token_ttl_hours);

    let claims = Claims {
        sub: admin_id.to_string(),
        username: username.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

/// Verify signature and expiry.
pub fn verify_token(config: &AuthConfig, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Value of the session cookie, if the request carries one.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty())
}

/// Claims of a valid session cookie.
pub fn authenticate(config: &AuthConfig, headers: &HeaderMap) -> Option<Claims> {
    let token = session_token(headers)?;
    match verify_token(config, &token) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!("Token verification failed: {}", e);
            None
        }
    }
}

pub fn session_cookie(config: &AuthConfig, token: &str) -> Result<HeaderValue, AppError> {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        config.token_ttl_hours * 3600
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| AppError::Internal(e.to_string()))
}

pub fn clear_session_cookie(config: &AuthConfig) -> HeaderValue {
    let cookie = if config.secure_cookie {
        format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0; Secure")
    } else {
        format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
    };
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// bcrypt is CPU-bound; run it outside the async executor.
pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash(&password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("spawn_blocking panic during hash: {e}")))?
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

pub async fn verify_password(password: String, password_hash: String) -> bool {
    tokio::task::spawn_blocking(move || verify(&password, &password_hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

pub fn generate_reset_token() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 48)
}

/// Reset tokens are stored as SHA-256 digests, never in the clear.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fixed-window login attempt counter keyed by client address.
#[derive(Debug)]
pub struct LoginThrottle {
    max_attempts: u32,
    window_secs: i64,
    attempts: RwLock<HashMap<String, (i64, u32)>>,
}

impl LoginThrottle {
    pub fn new(max_attempts: u32, window_secs: i64) -> Self {
        Self {
            max_attempts,
            window_secs,
            attempts: RwLock::new(HashMap::new()),
        }
    }

    /// Record an attempt; `false` when the client is over its budget.
    pub async fn check(&self, client: &str) -> bool {
        if self.max_attempts == 0 {
            return true;
        }
        let now = Utc::now().timestamp();
        let mut attempts = self.attempts.write().await;

        // Evict expired windows so memory tracks active clients only.
        attempts.retain(|_, (start, _)| now - *start < self.window_secs);

        let entry = attempts.entry(client.to_string()).or_insert((now, 0));
        if entry.1 >= self.max_attempts {
            return false;
        }
        entry.1 += 1;
        true
    }

    pub async fn reset(&self, client: &str) {
        self.attempts.write().await.remove(client);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn auth_config() -> AuthConfig {
        AppConfig::default().auth
    }

    #[test]
    fn test_token_round_trip() {
        let config = auth_config();
        let token = issue_token(&config, "id-1", "root").unwrap();
        let claims = verify_token(&config, &token).unwrap();
        assert_eq!(claims.sub, "id-1");
        assert_eq!(claims.username, "root");
    }

    #[test]
    fn test_token_with_other_secret_is_rejected() {
        let config = auth_config();
        let token = issue_token(&config, "id-1", "root").unwrap();
        let mut other = auth_config();
        other.jwt_secret = "another-secret".into();
        assert!(verify_token(&other, &token).is_err());
        assert!(verify_token(&config, "invalid.jwt.token").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let mut config = auth_config();
        config.token_ttl_hours = -2;
        let token = issue_token(&config, "id-1", "root").unwrap();
        assert!(verify_token(&config, &token).is_err());
    }

    #[test]
    fn test_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; admin_token=abc.def; other=1"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def"));

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("admin_token="));
        assert!(session_token(&empty).is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let mut config = auth_config();
        let cookie = session_cookie(&config, "tok").unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("admin_token=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));

        config.secure_cookie = true;
        let cleared = clear_session_cookie(&config);
        let cleared = cleared.to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));
        assert!(cleared.contains("Secure"));
    }

    #[test]
    fn test_hash_token_is_stable_hex() {
        let a = hash_token("abc");
        assert_eq!(a, hash_token("abc"));
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_token("abd"));
    }

    #[tokio::test]
    async fn test_password_hash_and_verify() {
        let hashed = hash_password("correct horse".into(), 4).await.unwrap();
        assert!(verify_password("correct horse".into(), hashed.clone()).await);
        assert!(!verify_password("wrong".into(), hashed).await);
    }

    #[tokio::test]
    async fn test_login_throttle_limits_attempts() {
        let throttle = LoginThrottle::new(2, 60);
        assert!(throttle.check("1.2.3.4").await);
        assert!(throttle.check("1.2.3.4").await);
        assert!(!throttle.check("1.2.3.4").await);
        assert!(throttle.check("5.6.7.8").await);
        throttle.reset("1.2.3.4").await;
        assert!(throttle.check("1.2.3.4").await);
    }
}
