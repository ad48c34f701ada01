//! Signed, time-limited bearer tokens.
//!
//! Tokens are HMAC-signed JWTs. The expiry lives inside the signed payload, so
//! verification needs nothing but the process-wide key: there is no session
//! table and no revocation list.

use std::str::FromStr;

use anyhow::{Context, bail};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AuthError, Principal, Role};
use crate::config::AuthConfig;

/// Identity fields carried by a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i32,
    pub email: String,
    pub role: Role,
}

impl From<&Principal> for Identity {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id,
            email: principal.email.clone(),
            role: principal.role,
        }
    }
}

/// Claim set as it appears on the wire.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    id: i32,
    is_admin: bool,
    iat: i64,
    exp: i64,
}

/// Signing configuration, resolved once at startup.
#[derive(Clone)]
pub struct TokenSettings {
    secret: String,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenSettings {
    pub fn new(secret: impl Into<String>, algorithm: &str, ttl: Duration) -> anyhow::Result<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            bail!("JWT secret is not configured (set JWT_SECRET or [auth].jwt_secret)");
        }

        let algorithm = parse_algorithm(algorithm)?;

        if ttl <= Duration::zero() {
            bail!("Token TTL must be positive");
        }

        Ok(Self {
            secret,
            algorithm,
            ttl,
        })
    }

    pub fn from_config(config: &AuthConfig) -> anyhow::Result<Self> {
        let minutes = i64::try_from(config.access_token_ttl_minutes)
            .context("access_token_ttl_minutes is out of range")?;

        Self::new(
            config.jwt_secret.clone(),
            &config.algorithm,
            Duration::minutes(minutes),
        )
    }

    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Accepts the HMAC family only; the service signs and verifies with one
/// shared secret.
pub fn parse_algorithm(name: &str) -> anyhow::Result<Algorithm> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Signing algorithm is not configured (set ALGORITHM or [auth].algorithm)");
    }

    let algorithm = Algorithm::from_str(&name.to_ascii_uppercase())
        .map_err(|_| anyhow::anyhow!("Unknown signing algorithm: {name}"))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => bail!("Unsupported signing algorithm {other:?}: only HS256, HS384 and HS512 are allowed"),
    }
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    default_ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(settings: &TokenSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            algorithm: settings.algorithm,
            default_ttl: settings.ttl,
        }
    }

    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn issue_token_for(&self, principal: &Principal) -> Result<String, AuthError> {
        self.issue(&Identity::from(principal))
    }

    pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue_with_ttl(identity, self.default_ttl)
    }

    pub fn issue_with_ttl(&self, identity: &Identity, ttl: Duration) -> Result<String, AuthError> {
        self.issue_at(identity, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        identity: &Identity,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Internal("Token expiry overflows".to_string()))?;

        let claims = Claims {
            sub: identity.email.clone(),
            id: identity.id,
            is_admin: identity.role.is_admin(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        debug!(
            principal_id = identity.id,
            role = identity.role.label(),
            "Issuing access token"
        );

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Error creating token: {e}")))
    }

    pub fn parse(&self, token: &str) -> Result<Identity, AuthError> {
        self.parse_at(token, Utc::now())
    }

    /// Signature and algorithm are checked before expiry, so a forged token
    /// is always `InvalidCredential` regardless of its `exp`.
    pub fn parse_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            AuthError::InvalidCredential
        })?;

        let claims = data.claims;
        if now.timestamp() > claims.exp {
            return Err(AuthError::ExpiredCredential);
        }

        Ok(Identity {
            id: claims.id,
            email: claims.sub,
            role: Role::from_admin_flag(claims.is_admin),
        })
    }
}
