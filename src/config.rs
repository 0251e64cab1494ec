/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, token secret, timeouts など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // None → in-memory policy backend (development only)
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    pub access_token_secret: String,
    pub access_token_leeway_seconds: u64,
    pub access_token_issuer: Option<String>,
    pub access_token_audience: Option<String>,

    pub cors_allowed_origins: Vec<String>,

    pub request_timeout: Duration,
    pub dispatch_timeout: Duration,
    pub request_body_limit_bytes: usize,

    pub policy_seed_defaults: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secrets and connection strings stay out of logs.
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("database_max_connections", &self.database_max_connections)
            .field("access_token_leeway_seconds", &self.access_token_leeway_seconds)
            .field("access_token_issuer", &self.access_token_issuer)
            .field("access_token_audience", &self.access_token_audience)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("request_timeout", &self.request_timeout)
            .field("dispatch_timeout", &self.dispatch_timeout)
            .field("request_body_limit_bytes", &self.request_body_limit_bytes)
            .field("policy_seed_defaults", &self.policy_seed_defaults)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = parse_or(&non_empty, "PORT", 8080)?;
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));

        let app_env = AppEnv::parse(non_empty("APP_ENV"));

        let database_url = non_empty("DATABASE_URL");
        if database_url.is_none() && app_env.is_production() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        let database_max_connections = parse_or(&non_empty, "DATABASE_MAX_CONNECTIONS", 5)?;

        let access_token_secret =
            non_empty("ACCESS_TOKEN_SECRET").ok_or(ConfigError::Missing("ACCESS_TOKEN_SECRET"))?;
        let access_token_leeway_seconds = parse_or(&non_empty, "ACCESS_TOKEN_LEEWAY_SECONDS", 0)?;
        let access_token_issuer = non_empty("ACCESS_TOKEN_ISSUER");
        let access_token_audience = non_empty("ACCESS_TOKEN_AUDIENCE");

        let cors_allowed_origins = non_empty("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let request_timeout_seconds: u64 = parse_or(&non_empty, "REQUEST_TIMEOUT_SECONDS", 30)?;
        let dispatch_timeout_seconds: u64 = parse_or(&non_empty, "DISPATCH_TIMEOUT_SECONDS", 10)?;
        if request_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS"));
        }
        if dispatch_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("DISPATCH_TIMEOUT_SECONDS"));
        }

        let request_body_limit_bytes =
            parse_or(&non_empty, "REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;

        let policy_seed_defaults = match non_empty("POLICY_SEED_DEFAULTS")
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("true" | "1" | "yes") => true,
            Some("false" | "0" | "no") => false,
            Some(_) => return Err(ConfigError::Invalid("POLICY_SEED_DEFAULTS")),
        };

        Ok(Self {
            addr,
            app_env,
            database_url,
            database_max_connections,
            access_token_secret,
            access_token_leeway_seconds,
            access_token_issuer,
            access_token_audience,
            cors_allowed_origins,
            request_timeout: Duration::from_secs(request_timeout_seconds),
            dispatch_timeout: Duration::from_secs(dispatch_timeout_seconds),
            request_body_limit_bytes,
            policy_seed_defaults,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_in_development() {
        let c = config(&[("ACCESS_TOKEN_SECRET", "s")]).unwrap();
        assert_eq!(c.addr.port(), 8080);
        assert_eq!(c.app_env, AppEnv::Development);
        assert_eq!(c.database_url, None);
        assert_eq!(c.access_token_leeway_seconds, 0);
        assert_eq!(c.request_timeout, Duration::from_secs(30));
        assert_eq!(c.dispatch_timeout, Duration::from_secs(10));
        assert_eq!(c.request_body_limit_bytes, 1024 * 1024);
        assert!(c.policy_seed_defaults);
    }

    #[test]
    fn secret_is_required() {
        assert_eq!(
            config(&[]).unwrap_err(),
            ConfigError::Missing("ACCESS_TOKEN_SECRET")
        );
        assert_eq!(
            config(&[("ACCESS_TOKEN_SECRET", "   ")]).unwrap_err(),
            ConfigError::Missing("ACCESS_TOKEN_SECRET")
        );
    }

    #[test]
    fn production_requires_durable_policy_store() {
        assert_eq!(
            config(&[("ACCESS_TOKEN_SECRET", "s"), ("APP_ENV", "prod")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        let c = config(&[
            ("ACCESS_TOKEN_SECRET", "s"),
            ("APP_ENV", "Production"),
            ("DATABASE_URL", "postgres://localhost/policies"),
        ])
        .unwrap();
        assert!(c.app_env.is_production());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_eq!(
            config(&[("ACCESS_TOKEN_SECRET", "s"), ("PORT", "http")]).unwrap_err(),
            ConfigError::Invalid("PORT")
        );
        assert_eq!(
            config(&[("ACCESS_TOKEN_SECRET", "s"), ("DISPATCH_TIMEOUT_SECONDS", "0")]).unwrap_err(),
            ConfigError::Invalid("DISPATCH_TIMEOUT_SECONDS")
        );
        assert_eq!(
            config(&[("ACCESS_TOKEN_SECRET", "s"), ("POLICY_SEED_DEFAULTS", "maybe")]).unwrap_err(),
            ConfigError::Invalid("POLICY_SEED_DEFAULTS")
        );
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let c = config(&[
            ("ACCESS_TOKEN_SECRET", "s"),
            ("CORS_ALLOWED_ORIGINS", " https://a.example , ,https://b.example"),
        ])
        .unwrap();
        assert_eq!(
            c.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let c = config(&[("ACCESS_TOKEN_SECRET", "super-secret-value")]).unwrap();
        assert!(!format!("{c:?}").contains("super-secret-value"));
    }
}
