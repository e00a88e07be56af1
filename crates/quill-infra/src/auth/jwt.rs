//! Signed session tokens carried in the `session` cookie.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quill_core::ports::{AuthError, TokenClaims, TokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Session signing settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Session lifetime; also the cookie's max-age.
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_hours: 24,
            issuer: "quill".to_string(),
        }
    }
}

impl JwtConfig {
    /// Load from `JWT_SECRET`, `JWT_EXPIRATION_HOURS` and `JWT_ISSUER`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            secret: std::env::var("JWT_SECRET").unwrap_or(defaults.secret),
            expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.expiration_hours),
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
        };

        if config.uses_default_secret() {
            let production = matches!(
                std::env::var("RUST_ENV").as_deref(),
                Ok("production") | Ok("prod")
            );
            if production {
                tracing::error!("SECURITY: default session secret in production, set JWT_SECRET");
            } else {
                tracing::warn!("Using default session secret. Set JWT_SECRET for production use.");
            }
        }

        config
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }
}

/// Wire form of a session.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: Uuid,
    username: String,
    iat: i64,
    exp: i64,
    iss: String,
}

impl From<SessionClaims> for TokenClaims {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            exp: claims.exp,
        }
    }
}

fn decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken(err.to_string()),
    }
}

/// HMAC-signed session tokens.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(&self, user_id: Uuid, username: &str) -> Result<String, AuthError> {
        let issued_at = Utc::now();
        let claims = SessionClaims {
            sub: user_id,
            username: username.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + TimeDelta::hours(self.config.expiration_hours)).timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.into())
            .map_err(decode_error)
    }

    fn expiration_seconds(&self) -> i64 {
        self.config.expiration_hours * 3600
    }
}
