use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

use crate::{config::ResetConfig, users::model::ResetTicket};

const TOKEN_BYTES: usize = 20;

/// A freshly generated reset token. `raw` goes to the user, `ticket` to the store.
#[derive(Debug, Clone)]
pub struct IssuedReset {
    pub raw: String,
    pub ticket: ResetTicket,
}

/// Generates one-time password reset tokens with a fixed validity window.
#[derive(Debug, Clone)]
pub struct ResetTokens {
    ttl: Duration,
}

impl ResetTokens {
    pub fn new(cfg: &ResetConfig) -> Self {
        Self {
            ttl: Duration::minutes(cfg.ttl_minutes),
        }
    }

    pub fn generate(&self) -> IssuedReset {
        self.generate_at(OffsetDateTime::now_utc())
    }

    pub fn generate_at(&self, now: OffsetDateTime) -> IssuedReset {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let raw = hex::encode(bytes);
        let ticket = ResetTicket {
            token_hash: hash_token(&raw),
            expires_at: now + self.ttl,
        };
        IssuedReset { raw, ticket }
    }
}

/// Hex SHA-256 of the raw token; only this form is ever stored.
pub fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
