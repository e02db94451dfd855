use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

pub mod claims;
pub mod cookie;
mod dto;
pub mod gate;
pub mod handlers;
pub mod jwt;
pub mod mailer;
pub mod password;
pub mod reset;
pub mod roles;

use gate::require_auth;
use roles::{require_role, RoleGate};

pub fn router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", get(handlers::logout))
        .route("/auth/forgot-password", post(handlers::forgot_password))
        .route("/auth/reset-password/:token", put(handlers::reset_password));

    let account = Router::new()
        .route("/auth/my-account", get(handlers::my_account))
        .route("/auth/update-account", put(handlers::update_account))
        .route("/auth/change-password", put(handlers::change_password));

    public.merge(guarded(account, state, None))
}

/// Puts `routes` behind the guard chain: authentication, then the role check when one is given.
pub fn guarded(
    routes: Router<AppState>,
    state: &AppState,
    roles: Option<RoleGate>,
) -> Router<AppState> {
    let routes = match roles {
        Some(gate) => routes.route_layer(middleware::from_fn_with_state(gate, require_role)),
        None => routes,
    };
    routes.route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::{
        error::ApiError,
        store::UserStore,
        testing::{call, register, request},
        users::model::{Role, UserChanges},
    };

    async fn publish() -> Result<&'static str, ApiError> {
        Ok("published")
    }

    #[tokio::test]
    async fn publisher_routes_admit_publishers_and_admins_only() {
        let (app, state, ..) = crate::testing::app();
        let gated = guarded(
            Router::new().route("/bootcamps", post(publish)),
            &state,
            Some(RoleGate::new([Role::Publisher, Role::Admin])),
        )
        .with_state(state.clone());

        let mut tokens = Vec::new();
        for (i, role) in Role::ALL.into_iter().enumerate() {
            let token = register(&app, "Someone", &format!("p{i}@example.com"), "secret1").await;
            let id = state.keys.verify(&token).unwrap().sub;
            state
                .store
                .update(
                    id,
                    UserChanges {
                        role: Some(role),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            tokens.push((role, token));
        }

        for (role, token) in &tokens {
            let (status, ..) = call(&gated, request("POST", "/bootcamps", Some(token), None)).await;
            let expected = match role {
                Role::User => StatusCode::FORBIDDEN,
                Role::Publisher | Role::Admin => StatusCode::OK,
            };
            assert_eq!(status, expected, "role {role}");
        }

        let (status, ..) = call(&gated, request("POST", "/bootcamps", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
