use serde::Deserialize;

pub const MAX_JWT_TTL_MINUTES: i64 = 10 * 365 * 24 * 60;
pub const MAX_COOKIE_EXPIRE_DAYS: i64 = 10 * 365;
pub const MAX_RESET_TTL_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Settings for the `token` cookie set on every token-issuing response.
#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub expire_days: i64,
    pub secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetConfig {
    pub ttl_minutes: i64,
    /// When false, forgot-password answers success-shaped for unknown emails.
    pub disclose_unknown_email: bool,
    /// Base used for reset links; falls back to the request's Host header.
    pub public_base_url: Option<String>,
    /// Deliver the reset link by mail only and leave it out of the response.
    pub mail_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    pub reset: ResetConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "bootcamp-api".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "bootcamp-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(60 * 24 * 30),
        };
        let cookie = CookieConfig {
            expire_days: env_parse("JWT_COOKIE_EXPIRE_DAYS").unwrap_or(30),
            secure: std::env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
        };
        let reset = ResetConfig {
            ttl_minutes: env_parse("RESET_TOKEN_TTL_MINUTES").unwrap_or(10),
            disclose_unknown_email: env_parse("RESET_DISCLOSE_UNKNOWN_EMAIL").unwrap_or(true),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .ok()
                .map(|v| v.trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty()),
            mail_only: env_parse("RESET_MAIL_ONLY").unwrap_or(false),
        };
        let config = Self {
            database_url,
            jwt,
            cookie,
            reset,
        };
        config.validate()?;
        Ok(config)
    }

    /// Bounds keep every derived expiry well inside `OffsetDateTime` range.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.jwt.secret.is_empty(), "JWT_SECRET must not be empty");
        anyhow::ensure!(
            (1..=MAX_JWT_TTL_MINUTES).contains(&self.jwt.ttl_minutes),
            "JWT_TTL_MINUTES must be between 1 and {MAX_JWT_TTL_MINUTES}"
        );
        anyhow::ensure!(
            (1..=MAX_COOKIE_EXPIRE_DAYS).contains(&self.cookie.expire_days),
            "JWT_COOKIE_EXPIRE_DAYS must be between 1 and {MAX_COOKIE_EXPIRE_DAYS}"
        );
        anyhow::ensure!(
            (1..=MAX_RESET_TTL_MINUTES).contains(&self.reset.ttl_minutes),
            "RESET_TOKEN_TTL_MINUTES must be between 1 and {MAX_RESET_TTL_MINUTES}"
        );
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
