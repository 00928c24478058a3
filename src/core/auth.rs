//! Credential primitives: Argon2id password hashing and bearer tokens.
//!
//! Tokens are HS256 JWTs. Customers and admins live in separate tables, so the
//! `kind` claim says which table `sub` refers to.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Which identity space a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// `sub` is a `users.id`
    User,
    /// `sub` is an `admin_users.id`
    Admin,
}

/// Claims embedded in every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject id
    pub sub: i64,
    /// Identity space of `sub`
    pub kind: TokenKind,
    /// Issued-at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Signing material plus token lifetime.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenKeys {
    /// Builds keys from a shared secret.
    #[must_use]
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issues a token for `subject` in the given identity space.
    pub fn issue(&self, subject: i64, kind: TokenKind) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject,
            kind,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verifies signature and expiry and returns the claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| Error::Unauthorized {
                message: format!("invalid token: {e}"),
            })
    }
}

/// Hashes a password into an Argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Checks a password against a stored PHC string.
///
/// Returns `Ok(false)` on mismatch and an error only when the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Rejects passwords shorter than [`MIN_PASSWORD_LEN`].
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("wrong-one", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("x", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_token_claims() {
        let keys = TokenKeys::new("test-secret", 1);
        let token = keys.issue(7, TokenKind::Admin).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.kind, TokenKind::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = TokenKeys::new("one", 1).issue(1, TokenKind::User).unwrap();
        let result = TokenKeys::new("two", 1).verify(&token);
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = TokenKeys::new("secret", -2);
        let token = keys.issue(1, TokenKind::User).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(validate_password("abc").is_err());
        assert!(validate_password("abcdef").is_ok());
    }
}
