//! services/api/src/adapters/token.rs
//!
//! HS256 JSON Web Tokens implementing the `TokenService` port.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lucid_lists_core::domain::Session;
use lucid_lists_core::ports::{PortError, PortResult, TokenService};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: i64,
    user_uid: Uuid,
    email: String,
    name: String,
    sub: String,
    iat: i64,
    exp: i64,
}

#[derive(Clone)]
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    fn sign(&self, session: &Session, ttl: Duration) -> PortResult<String> {
        let now = Utc::now();
        let claims = Claims {
            user_id: session.user_id,
            user_uid: session.user_uid,
            email: session.email.clone(),
            name: session.name.clone(),
            sub: session.user_uid.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            error!("Failed to sign token: {:?}", e);
            PortError::Unexpected("failed to sign token".to_string())
        })
    }
}

impl TokenService for JwtTokenService {
    fn issue_token(&self, session: &Session) -> PortResult<String> {
        self.sign(session, self.ttl)
    }

    fn verify_token(&self, token: &str) -> PortResult<Session> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!("Rejected token: {}", e);
            PortError::Unauthorized
        })?;
        let claims = data.claims;
        Ok(Session {
            user_id: claims.user_id,
            user_uid: claims.user_uid,
            email: claims.email,
            name: claims.name,
        })
    }
}
