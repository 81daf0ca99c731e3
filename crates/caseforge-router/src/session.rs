//! Session tokens.
//!
//! A session is an opaque random id wrapped in a signed JWT. The id keys the
//! cached document text and the saved history for that browser session.

use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// Session management error
#[derive(Debug, Error)]
pub enum SessionError {
    /// JWT encoding failed
    #[error("Failed to encode JWT: {0}")]
    JwtEncode(#[from] jsonwebtoken::errors::Error),

    /// Token expired
    #[error("Session token expired")]
    TokenExpired,

    /// Invalid token
    #[error("Invalid session token")]
    InvalidToken,

    /// No bearer token on the request
    #[error("Missing session token")]
    MissingToken,
}

/// JWT claims for session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Random session identifier
    pub sid: String,

    /// Token expiration timestamp (Unix epoch)
    pub exp: u64,

    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
}

/// Session manager handles JWT token generation and validation
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_secs: u64,
}

impl SessionManager {
    /// Create a new session manager with the given JWT secret and expiry
    pub fn new(jwt_secret: &str, token_expiry_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_expiry_secs,
        }
    }

    /// Start a new session; returns the token and its session id
    pub fn establish(&self) -> Result<(String, String), SessionError> {
        let sid = Uuid::new_v4().simple().to_string();
        let token = self.generate_token(&sid)?;
        Ok((token, sid))
    }

    /// Generate a token for an existing session id
    pub fn generate_token(&self, sid: &str) -> Result<String, SessionError> {
        let now = unix_now();
        let claims = SessionClaims {
            sid: sid.to_string(),
            exp: now + self.token_expiry_secs,
            iat: now,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a session token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let validation = Validation::default();
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::TokenExpired,
                _ => SessionError::InvalidToken,
            })?;

        Ok(token_data.claims)
    }

    /// Session id from an `Authorization: Bearer <token>` header
    pub fn session_id(&self, headers: &HeaderMap) -> Result<String, SessionError> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::MissingToken)?;

        Ok(self.validate_token(token)?.sid)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_establish_and_validate() {
        let manager = SessionManager::new("test-secret", 3600);
        let (token, sid) = manager.establish().unwrap();

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.sid, sid);
        assert_eq!(sid.len(), 32);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_sessions_are_distinct() {
        let manager = SessionManager::new("test-secret", 3600);
        let (_, first) = manager.establish().unwrap();
        let (_, second) = manager.establish().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_expired_token() {
        let manager = SessionManager::new("test-secret", 3600);

        // Expired well past the default 60s leeway
        let now = unix_now();
        let claims = SessionClaims {
            sid: "abc".to_string(),
            exp: now - 100,
            iat: now - 200,
        };

        let token = encode(&Header::default(), &claims, &manager.encoding_key).unwrap();

        let result = manager.validate_token(&token);
        assert!(matches!(result, Err(SessionError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret() {
        let manager1 = SessionManager::new("secret1", 3600);
        let manager2 = SessionManager::new("secret2", 3600);

        let token = manager1.generate_token("abc").unwrap();
        let result = manager2.validate_token(&token);
        assert!(matches!(result, Err(SessionError::InvalidToken)));
    }

    #[test]
    fn test_session_id_from_header() {
        let manager = SessionManager::new("test-secret", 3600);
        let (token, sid) = manager.establish().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        assert_eq!(manager.session_id(&headers).unwrap(), sid);
    }

    #[test]
    fn test_session_id_requires_bearer() {
        let manager = SessionManager::new("test-secret", 3600);
        let mut headers = HeaderMap::new();
        assert!(matches!(manager.session_id(&headers), Err(SessionError::MissingToken)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(manager.session_id(&headers), Err(SessionError::MissingToken)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        assert!(matches!(manager.session_id(&headers), Err(SessionError::InvalidToken)));
    }
}
