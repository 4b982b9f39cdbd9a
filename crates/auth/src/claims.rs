//! JWT claims model and HS256 token validation.
//!
//! Signature verification is delegated to `jsonwebtoken`; the time-window
//! checks are kept separate and deterministic (the caller supplies `now`)
//! so they can be unit-tested without a clock.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use apflow_core::{ProjectId, UserId, VendorId};

use crate::{Actor, Role};

/// Claims carried in an apflow bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Display name for audit entries.
    pub name: String,

    /// Raw role string. Normalized via `Role::parse` at this boundary;
    /// tokens minted against older records may carry mixed case.
    pub role: String,

    /// Assigned project scope (PROJECT_MANAGER).
    #[serde(default)]
    pub projects: Vec<ProjectId>,

    /// Vendor scope (VENDOR).
    #[serde(default)]
    pub vendor_id: Option<VendorId>,

    /// Issued-at, seconds since epoch.
    pub iat: i64,

    /// Expiration, seconds since epoch.
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token is malformed or its signature is invalid")]
    Invalid,

    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("token carries an unrecognized role '{0}'")]
    UnknownRole(String),
}

/// Deterministically validate the claim time window.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let issued_at = epoch(claims.iat)?;
    let expires_at = epoch(claims.exp)?;

    if expires_at <= issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

fn epoch(secs: i64) -> Result<DateTime<Utc>, TokenValidationError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or(TokenValidationError::InvalidTimeWindow)
}

/// Token validation contract consumed by the HTTP middleware.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Actor, TokenValidationError>;
}

/// HS256 validator over a shared secret.
pub struct Hs256JwtValidator {
    key: DecodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            key: DecodingKey::from_secret(&secret),
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Actor, TokenValidationError> {
        // Time-window checks run against the caller-supplied clock below.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &validation)
            .map_err(|_| TokenValidationError::Invalid)?;
        let claims = data.claims;

        validate_claims(&claims, now)?;

        let role = Role::parse(&claims.role)
            .ok_or_else(|| TokenValidationError::UnknownRole(claims.role.clone()))?;

        let mut actor = Actor::new(claims.sub, claims.name, role).with_projects(claims.projects);
        actor.vendor_id = claims.vendor_id;
        Ok(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"test-secret";

    fn claims_at(now: DateTime<Utc>, role: &str) -> JwtClaims {
        JwtClaims {
            sub: UserId::new(),
            name: "Dana".to_string(),
            role: role.to_string(),
            projects: vec![],
            vendor_id: None,
            iat: (now - Duration::minutes(5)).timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        }
    }

    fn sign(claims: &JwtClaims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_normalized_actor() {
        let now = Utc::now();
        let claims = claims_at(now, "Project_Manager");
        let validator = Hs256JwtValidator::new(SECRET.to_vec());

        let actor = validator.validate(&sign(&claims), now).unwrap();
        assert_eq!(actor.id, claims.sub);
        assert_eq!(actor.role, Role::ProjectManager);
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let mut claims = claims_at(now, "admin");
        claims.exp = (now - Duration::minutes(1)).timestamp();
        let validator = Hs256JwtValidator::new(SECRET.to_vec());

        assert_eq!(
            validator.validate(&sign(&claims), now),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = Utc::now();
        let claims = claims_at(now, "admin");
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"other-secret"),
        )
        .unwrap();
        let validator = Hs256JwtValidator::new(SECRET.to_vec());

        assert_eq!(
            validator.validate(&token, now),
            Err(TokenValidationError::Invalid)
        );
    }

    #[test]
    fn unknown_role_is_rejected_not_defaulted() {
        let now = Utc::now();
        let claims = claims_at(now, "superuser");
        let validator = Hs256JwtValidator::new(SECRET.to_vec());

        assert!(matches!(
            validator.validate(&sign(&claims), now),
            Err(TokenValidationError::UnknownRole(_))
        ));
    }

    #[test]
    fn inverted_time_window_is_rejected() {
        let now = Utc::now();
        let mut claims = claims_at(now, "admin");
        claims.exp = claims.iat;
        assert_eq!(
            validate_claims(&claims, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
