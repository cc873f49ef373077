//! Password hashing and bearer token issue/verification.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::store::UserId;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: UserId,
    exp: usize,
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Internal(format!("Could not process request: {e}")))
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

/// Ten years.
const MAX_TTL_HOURS: u64 = 24 * 366 * 10;

/// HS256 tokens carrying the user id and an expiry.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, ttl_hours: u64) -> Self {
        let hours = ttl_hours.min(MAX_TTL_HOURS) as i64;
        Self { secret: secret.into(), ttl: Duration::hours(hours) }
    }

    pub fn issue(&self, user_id: UserId) -> Result<String, ApiError> {
        let exp = (Utc::now() + self.ttl).timestamp().max(0) as usize;
        let claims = Claims { user_id, exp };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(self.secret.as_bytes()))
            .map_err(|e| ApiError::Internal(format!("Could not create token: {e}")))
    }

    /// Signature and expiry are both checked.
    pub fn verify(&self, token: &str) -> Result<UserId, ApiError> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims.user_id)
            .map_err(|_| ApiError::Unauthorized("Invalid token".into()))
    }
}
