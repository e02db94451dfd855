//! In-memory `UserStore` used by the handler tests.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::users::model::{Credentials, NewUser, ResetTicket, User, UserChanges};

#[derive(Debug, Clone)]
struct Record {
    user: User,
    password_hash: String,
    reset: Option<ResetTicket>,
}

#[derive(Default)]
pub struct MemoryUserStore {
    records: Mutex<Vec<Record>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset ticket currently stored for `id`.
    pub fn reset_ticket(&self, id: Uuid) -> Option<ResetTicket> {
        let records = self.records.lock().unwrap();
        records
            .iter()
            .find(|r| r.user.id == id)
            .and_then(|r| r.reset.clone())
    }

    pub fn password_hash(&self, id: Uuid) -> Option<String> {
        let records = self.records.lock().unwrap();
        records
            .iter()
            .find(|r| r.user.id == id)
            .map(|r| r.password_hash.clone())
    }

    fn email_taken(records: &[Record], email: &str, except: Option<Uuid>) -> bool {
        records
            .iter()
            .any(|r| r.user.email == email && Some(r.user.id) != except)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut records = self.records.lock().unwrap();
        if Self::email_taken(&records, &new.email, None) {
            return Err(StoreError::Duplicate {
                field: "email".into(),
            });
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            role: new.role,
            created_at: OffsetDateTime::now_utc(),
        };
        records.push(Record {
            user: user.clone(),
            password_hash: new.password_hash,
            reset: None,
        });
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.user.id == id).map(|r| r.user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .find(|r| r.user.email == email)
            .map(|r| r.user.clone()))
    }

    async fn credentials_by_email(&self, email: &str) -> Result<Option<Credentials>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .find(|r| r.user.email == email)
            .map(|r| Credentials {
                user: r.user.clone(),
                password_hash: r.password_hash.clone(),
            }))
    }

    async fn credentials_by_id(&self, id: Uuid) -> Result<Option<Credentials>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.user.id == id).map(|r| Credentials {
            user: r.user.clone(),
            password_hash: r.password_hash.clone(),
        }))
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().map(|r| r.user.clone()).collect())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut records = self.records.lock().unwrap();
        if let Some(email) = &changes.email {
            if Self::email_taken(&records, email, Some(id)) {
                return Err(StoreError::Duplicate {
                    field: "email".into(),
                });
            }
        }
        let Some(record) = records.iter_mut().find(|r| r.user.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            record.user.name = name;
        }
        if let Some(email) = changes.email {
            record.user.email = email;
        }
        if let Some(role) = changes.role {
            record.user.role = role;
        }
        Ok(Some(record.user.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.user.id != id);
        Ok(records.len() != before)
    }

    async fn set_reset_ticket(
        &self,
        id: Uuid,
        ticket: Option<ResetTicket>,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.user.id == id)
            .ok_or(StoreError::NotFound)?;
        record.reset = ticket;
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        let mut records = self.records.lock().unwrap();
        let Some(record) = records.iter_mut().find(|r| {
            r.reset
                .as_ref()
                .is_some_and(|t| t.token_hash == token_hash && t.expires_at > now)
        }) else {
            return Ok(None);
        };
        record.password_hash = password_hash.to_string();
        record.reset = None;
        Ok(Some(record.user.clone()))
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.user.id == id)
            .ok_or(StoreError::NotFound)?;
        record.password_hash = password_hash.to_string();
        record.reset = None;
        Ok(())
    }
}
