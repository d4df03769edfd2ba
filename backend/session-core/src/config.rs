//! Configuration management for the session core
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)
//!
//! Token lifetimes are supplied as duration strings (`"15m"`, `"7d"`); the
//! 2FA-pending and OTP lifetimes are fixed by the protocol and are not
//! configurable.

use anyhow::{bail, Context, Result};
use chrono::Duration;
use std::env;

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub tokens: TokenSettings,
    pub session: SessionSettings,
    pub linking: LinkingSettings,
    pub sweeper: SweeperSettings,
    pub email: EmailSettings,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self> {
        // Load .env file in development
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
        }

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            tokens: TokenSettings::from_env()?,
            session: SessionSettings::from_env()?,
            linking: LinkingSettings::from_env()?,
            sweeper: SweeperSettings::from_env()?,
            email: EmailSettings::from_env()?,
        })
    }
}

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("Invalid DATABASE_MIN_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }
}

/// Signing secrets and lifetimes for issued tokens
///
/// The refresh secret is optional; when absent the access secret signs both
/// token families.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: Option<String>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            access_secret: env::var("AUTH_ACCESS_TOKEN_SECRET")
                .context("AUTH_ACCESS_TOKEN_SECRET must be set")?,
            refresh_secret: env::var("AUTH_REFRESH_TOKEN_SECRET").ok(),
            access_ttl: parse_duration(
                &env::var("AUTH_ACCESS_TOKEN_TTL").unwrap_or_else(|_| "15m".to_string()),
            )
            .context("Invalid AUTH_ACCESS_TOKEN_TTL")?,
            refresh_ttl: parse_duration(
                &env::var("AUTH_REFRESH_TOKEN_TTL").unwrap_or_else(|_| "7d".to_string()),
            )
            .context("Invalid AUTH_REFRESH_TOKEN_TTL")?,
        })
    }
}

/// Login behavior knobs
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// When set, login with an unknown email reports invalid credentials
    /// instead of "user not found", closing the enumeration side channel.
    pub mask_unknown_email: bool,
}

impl SessionSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            mask_unknown_email: env::var("AUTH_MASK_UNKNOWN_EMAIL")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .context("Invalid AUTH_MASK_UNKNOWN_EMAIL")?,
        })
    }
}

/// External-provider linking-state settings
#[derive(Debug, Clone)]
pub struct LinkingSettings {
    pub state_ttl: Duration,
}

impl LinkingSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            state_ttl: parse_duration(
                &env::var("AUTH_LINKING_STATE_TTL").unwrap_or_else(|_| "10m".to_string()),
            )
            .context("Invalid AUTH_LINKING_STATE_TTL")?,
        })
    }
}

/// Expiry sweeper schedule
#[derive(Debug, Clone)]
pub struct SweeperSettings {
    pub period: Duration,
}

impl SweeperSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            period: parse_duration(
                &env::var("AUTH_SWEEP_INTERVAL").unwrap_or_else(|_| "1h".to_string()),
            )
            .context("Invalid AUTH_SWEEP_INTERVAL")?,
        })
    }
}

/// SMTP configuration for OTP delivery
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub use_starttls: bool,
}

impl EmailSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .context("Invalid SMTP_PORT")?,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "noreply@example.com".to_string()),
            use_starttls: env::var("SMTP_USE_STARTTLS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        })
    }
}

/// Parse a duration string of the form `<count><unit>` where unit is one of
/// `s`, `m`, `h`, `d` (e.g. `"15m"`, `"7d"`).
pub fn parse_duration(value: &str) -> Result<Duration> {
    let value = value.trim();
    // char_indices keeps the split on a char boundary for multibyte input.
    let Some((unit_start, unit)) = value.char_indices().last() else {
        bail!("empty duration");
    };
    let count: i64 = value[..unit_start]
        .parse()
        .with_context(|| format!("invalid duration count in {value:?}"))?;
    if count < 0 {
        bail!("duration must not be negative: {value:?}");
    }
    match unit {
        's' => Ok(Duration::seconds(count)),
        'm' => Ok(Duration::minutes(count)),
        'h' => Ok(Duration::hours(count)),
        'd' => Ok(Duration::days(count)),
        other => bail!("unknown duration unit {other:?} in {value:?}"),
    }
}
