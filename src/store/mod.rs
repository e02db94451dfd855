use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::model::{Credentials, NewUser, ResetTicket, User, UserChanges};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgUserStore;

/// Persistence failures, typed so the HTTP layer can map them in one place.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate value for `{field}`")]
    Duplicate { field: String },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid value: {0}")]
    Cast(String),
    #[error("record not found")]
    NotFound,
    #[error("stored record is malformed: {0}")]
    Corrupt(String),
    #[error("database error")]
    Backend(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let sqlx::Error::Database(db_err) = &err else {
            return match err {
                sqlx::Error::RowNotFound => StoreError::NotFound,
                other => StoreError::Backend(other),
            };
        };
        // https://www.postgresql.org/docs/current/errcodes-appendix.html
        let code = db_err.code().map(|c| c.into_owned());
        match code.as_deref() {
            Some("23505") => StoreError::Duplicate {
                field: field_from_constraint(db_err.constraint()),
            },
            Some("23502") | Some("23514") => StoreError::Validation(db_err.message().to_string()),
            Some("22P02") => StoreError::Cast(db_err.message().to_string()),
            _ => StoreError::Backend(err),
        }
    }
}

/// `users_email_key` -> `email`
fn field_from_constraint(constraint: Option<&str>) -> String {
    let Some(name) = constraint else {
        return "value".into();
    };
    name.trim_start_matches("users_")
        .trim_end_matches("_key")
        .trim_end_matches("_idx")
        .to_string()
}

/// Credential store. Default lookups never return the password hash;
/// the `credentials_*` methods select it explicitly.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn credentials_by_email(&self, email: &str) -> Result<Option<Credentials>, StoreError>;
    async fn credentials_by_id(&self, id: Uuid) -> Result<Option<Credentials>, StoreError>;
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Sets or clears the outstanding reset token without touching anything else.
    async fn set_reset_ticket(
        &self,
        id: Uuid,
        ticket: Option<ResetTicket>,
    ) -> Result<(), StoreError>;

    /// Finds the user holding an unexpired reset token with this hash, stores the
    /// new password hash and clears both reset fields, all in one step.
    /// Returns `None` for wrong and expired tokens alike.
    async fn consume_reset_token(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Replaces the password hash and drops any outstanding reset token.
    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_names_map_to_fields() {
        assert_eq!(field_from_constraint(Some("users_email_key")), "email");
        assert_eq!(field_from_constraint(None), "value");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn pool_errors_stay_backend() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
