use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::{debug, warn};

use super::cookie::TOKEN_COOKIE;
use crate::{error::ApiError, state::AppState, users::model::User};

/// The authenticated user, attached to request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Bearer header first, then the `token` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            let token = token.trim();
            return (!token.is_empty()).then(|| token.to_string());
        }
    }
    CookieJar::from_headers(headers)
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolves the request's bearer credential to a stored user.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let Some(token) = extract_token(headers) else {
        debug!("no bearer credential");
        return Err(ApiError::Unauthenticated);
    };

    let claims = state.keys.verify(&token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        ApiError::Unauthenticated
    })?;

    match state.store.find_by_id(claims.sub).await? {
        Some(user) => Ok(user),
        None => {
            warn!(user_id = %claims.sub, "token subject no longer exists");
            Err(ApiError::Unauthenticated)
        }
    }
}

/// Guard: rejects the request unless it carries a valid credential.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, req.headers()).await?;
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(ApiError::Unauthenticated)
    }
}
