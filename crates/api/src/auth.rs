//! JWT access-token generation and validation for admin endpoints.
//!
//! Tokens are HS256-signed JWTs carrying a [`Claims`] payload. Issuing tokens
//! belongs to the identity provider; [`generate_access_token`] exists for
//! tooling and tests.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sitesafe_core::types::DbId;
use uuid::Uuid;

/// Role required by `/admin` routes.
pub const ROLE_ADMIN: &str = "admin";

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    pub role: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
}

/// Default access token expiry in minutes.
pub const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_token_expiry_mins: DEFAULT_ACCESS_EXPIRY_MINS,
        }
    }
}

/// Generate an HS256 access token for the given user.
pub fn generate_access_token(
    user_id: DbId,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let exp = now + config.access_token_expiry_mins * 60;

    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode an access token, returning the embedded [`Claims`].
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_claims() {
        let config = JwtConfig::new("test-secret");
        let token = generate_access_token(7, ROLE_ADMIN, &config).unwrap();
        let claims = validate_token(&token, &config).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, ROLE_ADMIN);
    }

    #[test]
    fn rejects_other_secret() {
        let token = generate_access_token(7, ROLE_ADMIN, &JwtConfig::new("a")).unwrap();
        assert!(validate_token(&token, &JwtConfig::new("b")).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let config = JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry_mins: -10,
        };
        let token = generate_access_token(7, ROLE_ADMIN, &config).unwrap();
        assert!(validate_token(&token, &config).is_err());
    }
}
