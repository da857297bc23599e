use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// A freshly minted session token. `token` goes to the client, only
/// `token_hash` is persisted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

pub fn issue_session_token(max_age_hours: i64) -> IssuedToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let token_hash = hash_token(&token);

    IssuedToken {
        token,
        token_hash,
        expires_at: Utc::now() + Duration::hours(max_age_hours),
    }
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
