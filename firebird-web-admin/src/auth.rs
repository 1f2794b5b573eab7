//! Session tokens
//!
//! After a successful connect the client receives an HS256 JWT whose
//! `conn_params` claim holds the base64-encoded JSON connection parameters.
//! The server keeps no session table: every authenticated request decodes
//! the credentials from the token again.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::ConnectionParams;

/// How long an issued token stays valid
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Token errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid token data")]
    InvalidTokenData,

    #[error("Failed to create token")]
    TokenCreation,
}

/// JWT claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// base64(JSON(ConnectionParams))
    pub conn_params: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Issues and validates session tokens with a configured secret
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 60; // seconds of clock skew

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issue a token valid for [`TOKEN_LIFETIME_HOURS`]
    pub fn issue(&self, params: &ConnectionParams) -> Result<String, AuthError> {
        let expires_at = Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS);
        self.issue_until(params, expires_at.timestamp())
    }

    fn issue_until(&self, params: &ConnectionParams, expires_at: i64) -> Result<String, AuthError> {
        let params_json = serde_json::to_vec(params).map_err(|_| AuthError::TokenCreation)?;
        let claims = Claims {
            conn_params: BASE64.encode(params_json),
            exp: expires_at,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenCreation)
    }

    /// Validate a token and recover the connection parameters it carries
    pub fn validate(&self, token: &str) -> Result<ConnectionParams, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AuthError::InvalidToken)?;

        let params_json = BASE64
            .decode(token_data.claims.conn_params)
            .map_err(|_| AuthError::InvalidTokenData)?;

        serde_json::from_slice(&params_json).map_err(|_| AuthError::InvalidTokenData)
    }

    /// Extract and validate the token from an `Authorization` header value
    ///
    /// Accepts `Bearer <token>` as well as a bare token.
    pub fn validate_header(&self, header: Option<&str>) -> Result<ConnectionParams, AuthError> {
        let header = header
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        self.validate(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_params;

    #[test]
    fn test_issue_and_validate() {
        let issuer = TokenIssuer::new("test-secret");
        let token = issuer.issue(&sample_params()).unwrap();
        assert_eq!(issuer.validate(&token).unwrap(), sample_params());
    }

    #[test]
    fn test_bearer_prefix_is_optional() {
        let issuer = TokenIssuer::new("test-secret");
        let token = issuer.issue(&sample_params()).unwrap();

        let with_prefix = format!("Bearer {}", token);
        assert_eq!(
            issuer.validate_header(Some(&with_prefix)).unwrap(),
            sample_params()
        );
        assert_eq!(issuer.validate_header(Some(&token)).unwrap(), sample_params());
    }

    #[test]
    fn test_missing_header() {
        let issuer = TokenIssuer::new("test-secret");
        assert_eq!(issuer.validate_header(None), Err(AuthError::MissingToken));
        assert_eq!(issuer.validate_header(Some("  ")), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = TokenIssuer::new("one").issue(&sample_params()).unwrap();
        assert_eq!(
            TokenIssuer::new("two").validate(&token),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = TokenIssuer::new("test-secret");
        let two_hours_ago = (Utc::now() - Duration::hours(2)).timestamp();
        let token = issuer.issue_until(&sample_params(), two_hours_ago).unwrap();
        assert_eq!(issuer.validate(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_garbage_claim_is_invalid_data() {
        let issuer = TokenIssuer::new("test-secret");
        let claims = Claims {
            conn_params: "%%% not base64 %%%".to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert_eq!(issuer.validate(&token), Err(AuthError::InvalidTokenData));
    }

    #[test]
    fn test_claim_is_base64_json() {
        let issuer = TokenIssuer::new("test-secret");
        let token = issuer.issue(&sample_params()).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &validation,
        )
        .unwrap();
        let decoded = BASE64.decode(data.claims.conn_params).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(json["database"], "firebird5:employee");
        assert_eq!(json["user"], "SYSDBA");
    }
}
