use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::users::model::{Credentials, NewUser, ResetTicket, Role, User, UserChanges};

/// User row as stored; `role` is TEXT guarded by a CHECK constraint.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct CredentialsRow {
    #[sqlx(flatten)]
    pub user: UserRow,
    pub password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let role = r
            .role
            .parse::<Role>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Self {
            id: r.id,
            name: r.name,
            email: r.email,
            role,
            created_at: r.created_at,
        })
    }
}

impl TryFrom<CredentialsRow> for Credentials {
    type Error = StoreError;

    fn try_from(r: CredentialsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user: r.user.try_into()?,
            password_hash: r.password_hash,
        })
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, role, created_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .fetch_one(&self.db)
        .await?;
        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn credentials_by_email(&self, email: &str) -> Result<Option<Credentials>, StoreError> {
        sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT id, name, email, role, created_at, password_hash
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .map(Credentials::try_from)
        .transpose()
    }

    async fn credentials_by_id(&self, id: Uuid) -> Result<Option<Credentials>, StoreError> {
        sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT id, name, email, role, created_at, password_hash
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .map(Credentials::try_from)
        .transpose()
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, created_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
               SET name  = COALESCE($2, name),
                   email = COALESCE($3, email),
                   role  = COALESCE($4, role)
             WHERE id = $1
            RETURNING id, name, email, role, created_at
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.role.map(|r| r.as_str()))
        .fetch_optional(&self.db)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let done = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn set_reset_ticket(
        &self,
        id: Uuid,
        ticket: Option<ResetTicket>,
    ) -> Result<(), StoreError> {
        let (hash, expires_at) = match ticket {
            Some(t) => (Some(t.token_hash), Some(t.expires_at)),
            None => (None, None),
        };
        let done = sqlx::query(
            r#"
            UPDATE users
               SET reset_password_token = $2,
                   reset_password_expires_at = $3
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(hash)
        .bind(expires_at)
        .execute(&self.db)
        .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
               SET password_hash = $3,
                   reset_password_token = NULL,
                   reset_password_expires_at = NULL
             WHERE reset_password_token = $1
               AND reset_password_expires_at > $2
            RETURNING id, name, email, role, created_at
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let done = sqlx::query(
            r#"
            UPDATE users
               SET password_hash = $2,
                   reset_password_token = NULL,
                   reset_password_expires_at = NULL
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.db)
        .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
