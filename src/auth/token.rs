use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Identity;
use crate::models::Role;

/// Lifetime of an access token.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Claims
///
/// The payload signed into every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id.
    pub sub: String,
    pub email: String,
    /// Absent for users without an assigned role.
    #[serde(default)]
    pub role: Option<Role>,
    /// Issued At (iat), seconds since the epoch.
    pub iat: usize,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: usize,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity::new(claims.sub, claims.email, claims.role)
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad signature, malformed payload, or expired.
    #[error("invalid token: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// TokenCodec
///
/// Issues and verifies HS256 bearer tokens with a single process-wide secret. Rotating
/// the secret invalidates every outstanding token.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::hours(TOKEN_TTL_HOURS))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // An expired token is expired, no grace period.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Signs a token for `identity`, valid from now until now + ttl.
    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.user_id().to_string(),
            email: identity.email().to_string(),
            role: identity.role(),
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp().max(0) as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Checks signature and expiry and returns the full claim set.
    pub fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::InvalidToken)
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.decode_claims(token).map(Identity::from)
    }
}
