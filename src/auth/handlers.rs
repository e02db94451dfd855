use axum::{
    extract::State,
    http::{header::HOST, HeaderMap},
    Json,
};
use axum_extra::extract::CookieJar;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{
    cookie::{logout_cookie, token_cookie},
    dto::{
        ChangePasswordRequest, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest,
        RegisterRequest, ResetPasswordRequest, UpdateAccountRequest,
    },
    gate::CurrentUser,
    mailer::MailMessage,
    password::{hash_password, verify_against_dummy, verify_password},
    reset::hash_token,
};
use crate::{
    error::{ApiError, ApiJson, ApiPath},
    response::{Data, TokenIssued},
    state::AppState,
    users::model::{
        normalize_email, validate_email, validate_name, validate_password, NewUser, Role, User,
        UserChanges,
    },
};

type TokenReply = (CookieJar, Json<TokenIssued>);

/// Signs a token for `user_id`, sets it as the `token` cookie and echoes it in the body.
fn send_token(state: &AppState, jar: CookieJar, user_id: Uuid) -> Result<TokenReply, ApiError> {
    let token = state.keys.sign(user_id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::internal(e)
    })?;
    let jar = jar.add(token_cookie(&state.config.cookie, token.clone()));
    Ok((
        jar,
        Json(TokenIssued {
            success: true,
            token,
        }),
    ))
}

fn hash(plain: &str) -> Result<String, ApiError> {
    hash_password(plain).map_err(ApiError::internal)
}

fn reset_url(state: &AppState, headers: &HeaderMap, raw: &str) -> String {
    let base = match &state.config.reset.public_base_url {
        Some(base) => base.clone(),
        None => {
            let host = headers
                .get(HOST)
                .and_then(|h| h.to_str().ok())
                .unwrap_or("localhost");
            let scheme = if state.config.cookie.secure { "https" } else { "http" };
            format!("{scheme}://{host}")
        }
    };
    format!("{base}/api/auth/reset-password/{raw}")
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<TokenReply, ApiError> {
    let name = validate_name(&payload.name).map_err(ApiError::validation)?;
    let email = validate_email(&payload.email).map_err(ApiError::validation)?;
    validate_password(&payload.password).map_err(ApiError::validation)?;

    let role = payload.role.unwrap_or_default();
    if role == Role::Admin {
        warn!(email = %email, "self-assigned admin role refused");
        return Err(ApiError::validation("Role admin can not be self-assigned"));
    }

    let user = state
        .store
        .create(NewUser {
            name,
            email,
            password_hash: hash(&payload.password)?,
            role,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, role = %user.role, "user registered");
    send_token(&state, jar, user.id)
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<TokenReply, ApiError> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation(
            "Please provide both email and password",
        ));
    }

    let Some(creds) = state.store.credentials_by_email(&email).await? else {
        verify_against_dummy(&payload.password);
        warn!(email = %email, "login unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&payload.password, &creds.password_hash).map_err(ApiError::internal)? {
        warn!(user_id = %creds.user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    info!(user_id = %creds.user.id, "user logged in");
    send_token(&state, jar, creds.user.id)
}

#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<Data<serde_json::Value>>) {
    (
        jar.add(logout_cookie(&state.config.cookie)),
        Json(Data::new(serde_json::json!({}))),
    )
}

#[instrument(skip_all)]
pub async fn my_account(CurrentUser(user): CurrentUser) -> Json<Data<User>> {
    Json(Data::new(user))
}

#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, ApiError> {
    let email = normalize_email(&payload.email);
    if email.is_empty() {
        return Err(ApiError::validation("Please provide an email"));
    }

    let Some(user) = state.store.find_by_email(&email).await? else {
        warn!(email = %email, "password reset for unknown email");
        if state.config.reset.disclose_unknown_email {
            return Err(ApiError::NotFound("No user with that email found".into()));
        }
        return Ok(Json(ForgotPasswordResponse {
            success: true,
            data: "Email sent",
            message: None,
        }));
    };

    let issued = state.resets.generate();
    state
        .store
        .set_reset_ticket(user.id, Some(issued.ticket))
        .await?;

    let url = reset_url(&state, &headers, &issued.raw);
    let msg = MailMessage {
        to: user.email.clone(),
        subject: "Password reset token".into(),
        body: format!(
            "You are receiving this email because you (or someone else) has requested \
             the reset of a password. Please make a PUT request to:\n\n{url}"
        ),
    };

    if let Err(e) = state.mailer.send(&msg).await {
        state.store.set_reset_ticket(user.id, None).await?;
        return Err(ApiError::EmailDeliveryFailed(e));
    }

    // Unknown emails get no message when existence is hidden, so known ones get none either.
    let reset = &state.config.reset;
    let echo = !reset.mail_only && reset.disclose_unknown_email;

    info!(user_id = %user.id, "password reset requested");
    Ok(Json(ForgotPasswordResponse {
        success: true,
        data: "Email sent",
        message: echo.then_some(msg.body),
    }))
}

#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiPath(token): ApiPath<String>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> Result<TokenReply, ApiError> {
    validate_password(&payload.password).map_err(ApiError::validation)?;
    let new_hash = hash(&payload.password)?;

    let user = state
        .store
        .consume_reset_token(&hash_token(&token), OffsetDateTime::now_utc(), &new_hash)
        .await?
        .ok_or_else(|| {
            warn!("reset token wrong or expired");
            ApiError::InvalidToken
        })?;

    info!(user_id = %user.id, "password reset");
    send_token(&state, jar, user.id)
}

#[instrument(skip_all)]
pub async fn update_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<UpdateAccountRequest>,
) -> Result<Json<Data<User>>, ApiError> {
    let mut changes = UserChanges::default();
    if let Some(name) = payload.name {
        changes.name = Some(validate_name(&name).map_err(ApiError::validation)?);
    }
    if let Some(email) = payload.email {
        changes.email = Some(validate_email(&email).map_err(ApiError::validation)?);
    }
    if changes.is_empty() {
        return Ok(Json(Data::new(user)));
    }

    let updated = state
        .store
        .update(user.id, changes)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    info!(user_id = %updated.id, "account updated");
    Ok(Json(Data::new(updated)))
}

#[instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    jar: CookieJar,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<TokenReply, ApiError> {
    let creds = state
        .store
        .credentials_by_id(user.id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if !verify_password(&payload.current_password, &creds.password_hash)
        .map_err(ApiError::internal)?
    {
        warn!(user_id = %user.id, "change password with wrong current password");
        return Err(ApiError::InvalidCredentials);
    }
    validate_password(&payload.new_password).map_err(ApiError::validation)?;

    state
        .store
        .set_password(user.id, &hash(&payload.new_password)?)
        .await?;

    info!(user_id = %user.id, "password changed");
    send_token(&state, jar, user.id)
}
