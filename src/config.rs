//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::{net::IpAddr, path::PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Public domain (e.g., "grievance.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the base URL for the service
    ///
    /// # Returns
    /// Full URL like "https://grievance.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Authentication and session policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Session cookie name
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// TTL for short-lived sessions in seconds (default: 300 = 5 minutes)
    pub short_session_ttl_seconds: i64,
    /// TTL for long-lived (remember-me) sessions in seconds (default: 2592000 = 30 days)
    pub long_session_ttl_seconds: i64,
    /// Minimum password length for registration
    pub min_password_length: usize,
    /// Interval between expired-session cleanup sweeps in seconds
    pub sweep_interval_seconds: u64,
    /// Login attempt throttling
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Login rate limiter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Attempts allowed per identifier within one window
    pub max_attempts: u32,
    /// Lockout window length in seconds (default: 900 = 15 minutes)
    pub window_seconds: u64,
    /// Maximum number of identifiers tracked in memory
    pub max_tracked_identifiers: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 900,
            max_tracked_identifiers: 10_000,
        }
    }
}

fn default_cookie_name() -> String {
    "sulabh_session".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (SULABH_AUTH_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3001)?
            .set_default("server.protocol", "http")?
            .set_default("database.path", "data/sulabh-auth.db")?
            .set_default("auth.cookie_name", "sulabh_session")?
            .set_default("auth.short_session_ttl_seconds", 300)?
            .set_default("auth.long_session_ttl_seconds", 2_592_000)?
            .set_default("auth.min_password_length", 6)?
            .set_default("auth.sweep_interval_seconds", 300)?
            .set_default("auth.rate_limit.max_attempts", 5)?
            .set_default("auth.rate_limit.window_seconds", 900)?
            .set_default("auth.rate_limit.max_tracked_identifiers", 10000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (SULABH_AUTH_*)
            .add_source(
                Environment::with_prefix("SULABH_AUTH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Whether session cookies should carry the Secure attribute.
    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
            || !is_local_server_domain(&self.server.domain)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.auth.short_session_ttl_seconds <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.short_session_ttl_seconds must be greater than 0".to_string(),
            ));
        }

        if self.auth.long_session_ttl_seconds <= self.auth.short_session_ttl_seconds {
            return Err(crate::error::AppError::Config(
                "auth.long_session_ttl_seconds must exceed auth.short_session_ttl_seconds"
                    .to_string(),
            ));
        }

        if self.auth.rate_limit.max_attempts == 0 {
            return Err(crate::error::AppError::Config(
                "auth.rate_limit.max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.auth.cookie_name.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "auth.cookie_name must not be empty".to_string(),
            ));
        }

        if !self.should_use_secure_cookies() {
            let host = normalized_server_host(&self.server.domain);
            tracing::warn!(
                host = %host,
                protocol = %self.server.protocol,
                "Using insecure session cookies for local development"
            );
        } else if !self.server.protocol.eq_ignore_ascii_case("https") {
            return Err(crate::error::AppError::Config(
                "server.protocol must be https for non-local server domains".to_string(),
            ));
        }

        Ok(())
    }
}

fn normalized_server_host(domain: &str) -> String {
    let trimmed = domain.trim();
    let parsed_host = url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_local_server_domain(domain: &str) -> bool {
    let host = normalized_server_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3001,
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/sulabh-auth-test.db"),
            },
            auth: AuthConfig {
                cookie_name: "sulabh_session".to_string(),
                short_session_ttl_seconds: 300,
                long_session_ttl_seconds: 2_592_000,
                min_password_length: 6,
                sweep_interval_seconds: 300,
                rate_limit: RateLimitConfig::default(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_http_on_localhost() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert!(!config.should_use_secure_cookies());
    }

    #[test]
    fn validate_rejects_http_for_non_local_domain() {
        let mut config = valid_config();
        config.server.domain = "grievance.example.com".to_string();
        config.server.protocol = "http".to_string();

        let error = config
            .validate()
            .expect_err("public domains must require https");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("server.protocol must be https")
        ));
    }

    #[test]
    fn validate_rejects_long_ttl_not_exceeding_short_ttl() {
        let mut config = valid_config();
        config.auth.long_session_ttl_seconds = config.auth.short_session_ttl_seconds;

        let error = config
            .validate()
            .expect_err("long TTL must exceed short TTL");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("long_session_ttl_seconds")
        ));
    }

    #[test]
    fn validate_rejects_zero_max_attempts() {
        let mut config = valid_config();
        config.auth.rate_limit.max_attempts = 0;

        assert!(config.validate().is_err());
    }
}
