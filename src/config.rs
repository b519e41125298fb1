/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, DATABASE_URL, JWT 設定, seed 設定など)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::services::auth::role::Role;
use crate::services::auth::token_codec::MIN_SECRET_LEN;

/// Upper bound for `TOKEN_TTL_SECONDS` (one year).
pub const MAX_TOKEN_TTL_SECONDS: i64 = 365 * 86_400;

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

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Accounts created at startup when absent.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub admin_username: String,
    pub admin_email: String,
    /// `None` skips the admin account.
    pub admin_password: Option<String>,
    pub demo_accounts: bool,
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    /// `None` selects the in-memory credential store.
    pub database_url: Option<String>,

    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub token_ttl_seconds: i64,
    pub registration_default_role: Role,

    pub request_timeout: Duration,
    pub body_limit_bytes: usize,

    pub seed: SeedConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // secrets stay out of logs
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("database", &self.database_url.is_some())
            .field("jwt_issuer", &self.jwt_issuer)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("registration_default_role", &self.registration_default_role)
            .field("request_timeout", &self.request_timeout)
            .field("body_limit_bytes", &self.body_limit_bytes)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = parse_or(var("PORT"), "PORT", 3000)?;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::parse(var("APP_ENV"));

        let database_url = var("DATABASE_URL");

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let jwt_issuer = var("JWT_ISSUER").unwrap_or_else(|| "regioninvest".to_string());

        let token_ttl_seconds: i64 = parse_or(var("TOKEN_TTL_SECONDS"), "TOKEN_TTL_SECONDS", 86_400)?;
        if !(1..=MAX_TOKEN_TTL_SECONDS).contains(&token_ttl_seconds) {
            return Err(ConfigError::Invalid("TOKEN_TTL_SECONDS"));
        }

        let registration_default_role = match var("REGISTRATION_DEFAULT_ROLE") {
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|_| ConfigError::Invalid("REGISTRATION_DEFAULT_ROLE"))?,
            None => Role::User,
        };
        // Self-registration must never mint administrators.
        if registration_default_role.is_admin() {
            return Err(ConfigError::Invalid("REGISTRATION_DEFAULT_ROLE"));
        }

        let request_timeout_seconds: u64 =
            parse_or(var("REQUEST_TIMEOUT_SECONDS"), "REQUEST_TIMEOUT_SECONDS", 30)?;
        let body_limit_bytes: usize =
            parse_or(var("BODY_LIMIT_BYTES"), "BODY_LIMIT_BYTES", 1024 * 1024)?;

        let admin_password = match var("SEED_ADMIN_PASSWORD") {
            Some(pw) => Some(pw),
            None if app_env.is_production() => None,
            None => Some("admin123".to_string()),
        };
        let demo_accounts = match var("SEED_DEMO_ACCOUNTS") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid("SEED_DEMO_ACCOUNTS"))?,
            None => !app_env.is_production(),
        };

        let seed = SeedConfig {
            admin_username: var("SEED_ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
            admin_email: var("SEED_ADMIN_EMAIL")
                .unwrap_or_else(|| "admin@regioninvest.local".to_string()),
            admin_password,
            demo_accounts,
        };

        Ok(Self {
            addr,
            app_env,
            database_url,
            jwt_secret,
            jwt_issuer,
            token_ttl_seconds,
            registration_default_role,
            request_timeout: Duration::from_secs(request_timeout_seconds),
            body_limit_bytes,
            seed,
        })
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_ttl_seconds)
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
