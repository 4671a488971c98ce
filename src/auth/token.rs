// JWT token generation and validation service

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Lifetime of an issued token in seconds (1 hour)
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32, // user_id
    pub iat: i64, // issued at timestamp
    pub exp: i64, // expiration timestamp
}

/// Why a presented token was refused
///
/// Both kinds reject the request the same way; they are kept apart so
/// logs can tell a forged token from a stale one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("expired token")]
    Expired,
}

/// Token service for JWT operations
///
/// Holds the process-wide signing secret; built once at startup.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime_secs: i64,
}

impl TokenService {
    /// Create a new TokenService with secret key
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime_secs: TOKEN_LIFETIME_SECS,
        }
    }

    /// Issue a token for `user_id`, valid for one hour from now
    pub fn issue(&self, user_id: i32) -> Result<String, ApiError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a token as if it had been issued at `issued_at`
    pub fn issue_at(&self, user_id: i32, issued_at: DateTime<Utc>) -> Result<String, ApiError> {
        let iat = issued_at.timestamp();
        let claims = Claims {
            sub: user_id,
            iat,
            exp: iat + self.lifetime_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("token generation failed: {}", e)))
    }

    /// Verify signature and expiry, returning the user id the token was issued for
    pub fn verify(&self, token: &str) -> Result<i32, TokenError> {
        self.decode_claims(token).map(|claims| claims.sub)
    }

    /// Verify and return the full claim set
    pub fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        // jsonwebtoken accepts `now == exp`; a token is only valid while now < exp
        if Utc::now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
