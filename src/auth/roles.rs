use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::gate::CurrentUser;
use crate::{
    error::ApiError,
    users::model::{Role, UnknownRole},
};

/// Allow-list of roles for a group of routes. Must run after `require_auth`.
#[derive(Debug, Clone)]
pub struct RoleGate {
    allowed: Arc<[Role]>,
}

impl RoleGate {
    pub fn new(allowed: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    /// Builds a gate from role names, rejecting any name outside the role set.
    pub fn parse<I, S>(names: I) -> Result<Self, UnknownRole>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roles = names
            .into_iter()
            .map(|n| n.as_ref().parse::<Role>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(roles))
    }

    pub fn permits(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }

    pub fn check(&self, identity: Option<&CurrentUser>) -> Result<(), ApiError> {
        let Some(CurrentUser(user)) = identity else {
            return Err(ApiError::LoginRequired);
        };
        if !self.permits(user.role) {
            warn!(user_id = %user.id, role = %user.role, "role not allowed");
            return Err(ApiError::Forbidden(format!(
                "User role {} is not authorized to access this route",
                user.role
            )));
        }
        Ok(())
    }
}

/// Guard: continues only when the attached user's role is allowed.
pub async fn require_role(
    State(gate): State<RoleGate>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate.check(req.extensions().get::<CurrentUser>())?;
    Ok(next.run(req).await)
}
