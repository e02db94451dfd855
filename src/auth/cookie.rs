use axum_extra::extract::cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

use crate::config::CookieConfig;

pub const TOKEN_COOKIE: &str = "token";
/// Value written over the credential on logout.
pub const LOGGED_OUT_VALUE: &str = "none";
pub const LOGOUT_COOKIE_SECS: i64 = 10;

/// HTTP-only cookie carrying a freshly issued token.
pub fn token_cookie(cfg: &CookieConfig, token: String) -> Cookie<'static> {
    let lifetime = Duration::days(cfg.expire_days);
    Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .secure(cfg.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(lifetime)
        .expires(OffsetDateTime::now_utc() + lifetime)
        .build()
}

/// Placeholder that replaces the credential and expires shortly after.
pub fn logout_cookie(cfg: &CookieConfig) -> Cookie<'static> {
    let lifetime = Duration::seconds(LOGOUT_COOKIE_SECS);
    Cookie::build((TOKEN_COOKIE, LOGGED_OUT_VALUE))
        .http_only(true)
        .secure(cfg.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(lifetime)
        .expires(OffsetDateTime::now_utc() + lifetime)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(secure: bool) -> CookieConfig {
        CookieConfig {
            expire_days: 30,
            secure,
        }
    }

    #[test]
    fn token_cookie_is_http_only() {
        let c = token_cookie(&cfg(false), "abc".into());
        assert_eq!(c.name(), "token");
        assert_eq!(c.value(), "abc");
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.secure(), Some(false));
        assert_eq!(c.max_age(), Some(Duration::days(30)));
    }

    #[test]
    fn secure_flag_follows_config() {
        let c = token_cookie(&cfg(true), "abc".into());
        assert_eq!(c.secure(), Some(true));
        assert!(c.to_string().contains("Secure"));
    }

    #[test]
    fn logout_cookie_expires_in_ten_seconds() {
        let c = logout_cookie(&cfg(false));
        assert_eq!(c.value(), "none");
        assert_eq!(c.max_age(), Some(Duration::seconds(10)));
        let expires = c.expires_datetime().unwrap();
        assert!(expires <= OffsetDateTime::now_utc() + Duration::seconds(10));
        assert!(c.to_string().contains("HttpOnly"));
    }
}
