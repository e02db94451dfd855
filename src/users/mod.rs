use axum::Router;

use crate::{auth, auth::roles::RoleGate, state::AppState};

mod dto;
pub mod handlers;
pub mod model;

use model::Role;

/// User administration, open to admins only.
pub fn router(state: &AppState) -> Router<AppState> {
    auth::guarded(
        handlers::admin_routes(),
        state,
        Some(RoleGate::new([Role::Admin])),
    )
}
