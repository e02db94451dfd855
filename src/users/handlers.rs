use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateUserRequest, UpdateUserRequest},
    model::{validate_email, validate_name, validate_password, NewUser, User, UserChanges},
};
use crate::{
    auth::password::hash_password,
    error::{ApiError, ApiJson, ApiPath},
    response::{Data, List},
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("No user with id {id}"))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<List<User>>, ApiError> {
    let users = state.store.list().await?;
    Ok(Json(List::new(users)))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Data<User>>, ApiError> {
    let user = state.store.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(Data::new(user)))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<Data<User>>), ApiError> {
    let name = validate_name(&payload.name).map_err(ApiError::validation)?;
    let email = validate_email(&payload.email).map_err(ApiError::validation)?;
    validate_password(&payload.password).map_err(ApiError::validation)?;
    let password_hash = hash_password(&payload.password).map_err(ApiError::internal)?;

    let user = state
        .store
        .create(NewUser {
            name,
            email,
            password_hash,
            role: payload.role.unwrap_or_default(),
        })
        .await?;

    info!(user_id = %user.id, role = %user.role, "user created by admin");
    Ok((StatusCode::CREATED, Json(Data::new(user))))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<Data<User>>, ApiError> {
    let changes = UserChanges {
        name: payload
            .name
            .map(|n| validate_name(&n))
            .transpose()
            .map_err(ApiError::validation)?,
        email: payload
            .email
            .map(|e| validate_email(&e))
            .transpose()
            .map_err(ApiError::validation)?,
        role: payload.role,
    };

    let user = if changes.is_empty() {
        state.store.find_by_id(id).await?
    } else {
        state.store.update(id, changes).await?
    };
    let user = user.ok_or_else(|| not_found(id))?;

    info!(user_id = %user.id, "user updated by admin");
    Ok(Json(Data::new(user)))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Data<serde_json::Value>>, ApiError> {
    if !state.store.delete(id).await? {
        return Err(not_found(id));
    }
    info!(user_id = %id, "user deleted by admin");
    Ok(Json(Data::new(serde_json::json!({}))))
}
