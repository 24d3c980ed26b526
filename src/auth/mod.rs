pub mod capability;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String, role: String) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self { sub: user_id, email, role, exp, iat: now.timestamp() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
}

pub fn generate_jwt(claims: Claims) -> Result<String, JwtError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, &claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// SHA-256 hex digest used for the internal login endpoint's password check
pub fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Constant-length comparison of a candidate password against a stored digest
pub fn verify_password(password: &str, stored_digest: &str) -> bool {
    let candidate = password_digest(password);
    if candidate.len() != stored_digest.len() {
        return false;
    }
    candidate
        .bytes()
        .zip(stored_digest.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_hex() {
        let d = password_digest("hunter2");
        assert_eq!(d.len(), 64);
        assert_eq!(d, password_digest("hunter2"));
        assert_ne!(d, password_digest("hunter3"));
    }

    #[test]
    fn verifies_matching_password() {
        let stored = password_digest("s3cret");
        assert!(verify_password("s3cret", &stored));
        assert!(!verify_password("other", &stored));
        assert!(!verify_password("s3cret", "not-a-digest"));
    }
}
