//! Process configuration, read from environment variables.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use shopdesk_auth::TokenLifetimes;
use shopdesk_infra::DatabaseConfig;
use shopdesk_observability::LogFormat;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACCESS_TTL_MINUTES: i64 = 15;
const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;
const MAX_ACCESS_TTL_MINUTES: i64 = 24 * 60;
const MAX_REFRESH_TTL_DAYS: i64 = 365;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone)]
pub struct ApiConfig {
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    /// `None` selects the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub cookie_secure: bool,
    pub cors_origins: Vec<String>,
    pub lifetimes: TokenLifetimes,
    pub log_format: LogFormat,
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("jwt_secret", &"<redacted>")
            .field("bind_addr", &self.bind_addr)
            .field("database", &self.database.as_ref().map(|d| d.max_connections))
            .field("cookie_secure", &self.cookie_secure)
            .field("cors_origins", &self.cors_origins)
            .field("lifetimes", &self.lifetimes)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let bind_addr = parse_var("BIND_ADDR", get("BIND_ADDR"), DEFAULT_BIND_ADDR.parse().ok())?;

        let database = match get("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_var(
                    "DB_MAX_CONNECTIONS",
                    get("DB_MAX_CONNECTIONS"),
                    Some(DEFAULT_DB_MAX_CONNECTIONS),
                )?,
            }),
            None => None,
        };

        let cookie_secure = parse_var("COOKIE_SECURE", get("COOKIE_SECURE"), Some(false))?;

        let cors_origins = cors_origins(get("CORS_ORIGINS"))?;

        let access_minutes: i64 = parse_var(
            "ACCESS_TOKEN_TTL_MINUTES",
            get("ACCESS_TOKEN_TTL_MINUTES"),
            Some(DEFAULT_ACCESS_TTL_MINUTES),
        )?;
        let access = bounded_ttl(
            "ACCESS_TOKEN_TTL_MINUTES",
            access_minutes,
            MAX_ACCESS_TTL_MINUTES,
            Duration::try_minutes,
        )?;

        let refresh_days: i64 = parse_var(
            "REFRESH_TOKEN_TTL_DAYS",
            get("REFRESH_TOKEN_TTL_DAYS"),
            Some(DEFAULT_REFRESH_TTL_DAYS),
        )?;
        let refresh = bounded_ttl(
            "REFRESH_TOKEN_TTL_DAYS",
            refresh_days,
            MAX_REFRESH_TTL_DAYS,
            Duration::try_days,
        )?;

        let log_format = match get("LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>().map_err(|reason| ConfigError::Invalid {
                var: "LOG_FORMAT",
                value: raw.clone(),
                reason,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            jwt_secret,
            bind_addr,
            database,
            cookie_secure,
            cors_origins,
            lifetimes: TokenLifetimes { access, refresh },
            log_format,
        })
    }
}

/// Comma separated origin list. Credentialed CORS needs explicit origins,
/// so a wildcard entry is refused.
fn cors_origins(raw: Option<String>) -> Result<Vec<String>, ConfigError> {
    let raw = raw.unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string());
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect();

    if origins.iter().any(|o| o == "*") {
        return Err(ConfigError::Invalid {
            var: "CORS_ORIGINS",
            value: raw,
            reason: "wildcard origin is not allowed with cookie credentials".into(),
        });
    }
    Ok(origins)
}

fn bounded_ttl(
    var: &'static str,
    value: i64,
    max: i64,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason,
    };

    if value <= 0 {
        return Err(invalid("must be positive".into()));
    }
    if value > max {
        return Err(invalid(format!("must be at most {max}")));
    }
    to_duration(value).ok_or_else(|| invalid("out of range".into()))
}

fn parse_var<T>(var: &'static str, raw: Option<String>, default: Option<T>) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    match raw {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
        None => default.ok_or(ConfigError::Missing(var)),
    }
}
