//! Application configuration loaded from environment variables.

use std::env;

use chrono::FixedOffset;

use news_core::SiteClock;
use news_infra::{DatabaseConfig, JwtConfig};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    /// Mark the session cookie `Secure`.
    pub cookie_secure: bool,
    /// Offset of the site's calendar day from UTC.
    pub utc_offset: FixedOffset,
    pub site: SiteConfig,
}

/// Where notification emails come from and link to.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub url: String,
    pub notify_from: String,
    pub notify_webhook_url: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080".to_string(),
            notify_from: "news@localhost".to_string(),
            notify_webhook_url: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = SiteConfig::default();

        let utc_offset = match env::var("SITE_UTC_OFFSET") {
            Ok(raw) => SiteClock::parse_offset(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unparseable SITE_UTC_OFFSET, using UTC");
                SiteClock::utc().offset()
            }),
            Err(_) => SiteClock::utc().offset(),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database: DatabaseConfig::from_env(),
            jwt: JwtConfig::from_env(),
            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            utc_offset,
            site: SiteConfig {
                url: env::var("SITE_URL").unwrap_or(defaults.url),
                notify_from: env::var("NOTIFY_FROM").unwrap_or(defaults.notify_from),
                notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL")
                    .ok()
                    .filter(|u| !u.is_empty()),
            },
        }
    }

    /// In-memory configuration for tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database: None,
            jwt: JwtConfig {
                secret: "test-secret".to_string(),
                expiration_hours: 1,
                issuer: "news-portal-test".to_string(),
            },
            cookie_secure: false,
            utc_offset: SiteClock::utc().offset(),
            site: SiteConfig::default(),
        }
    }
}
