use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level `{other}`")),
        }
    }
}

/// Logging settings, read separately from `AppConfig` so that logging is up
/// before configuration errors need reporting.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub production: bool,
    pub level: LogLevel,
    pub dir: String,
}

impl LogConfig {
    pub fn from_env() -> Self {
        let production = std::env::var("ENVIRONMENT").is_ok_and(|e| e == "production");
        let default_level = if production { LogLevel::Info } else { LogLevel::Debug };
        let level = std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default_level);
        let dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
        Self {
            production,
            level,
            dir,
        }
    }

    /// Default directive when `RUST_LOG` is unset.
    pub fn filter_directive(&self) -> String {
        format!("sitedesk={},tower_http=debug,axum=debug", self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("info".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_filter_directive() {
        let config = LogConfig {
            production: false,
            level: LogLevel::Debug,
            dir: "logs".into(),
        };
        assert_eq!(
            config.filter_directive(),
            "sitedesk=debug,tower_http=debug,axum=debug"
        );
    }
}
