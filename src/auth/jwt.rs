use crate::types::{AppError, Claims, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Fixed `sub` claim of every issued credential.
pub const SUBJECT: &str = "User details";
/// Fixed `iss` claim of every issued credential.
pub const ISSUER: &str = "taskgate";

/// Issues and verifies HS256-signed bearer credentials.
///
/// The codec holds only the shared secret and the credential lifetime, both
/// fixed at construction, so one instance can be shared across all requests.
#[derive(Clone)]
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl JwtCodec {
    /// Creates a codec.
    ///
    /// # Arguments
    /// * `secret` - Shared HMAC secret (should be at least 32 chars)
    /// * `lifetime_minutes` - Credential validity in minutes
    ///
    /// A lifetime too large for a `Duration` saturates; issuing then fails
    /// with `Internal` instead of producing a credential.
    pub fn new(secret: &str, lifetime_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::try_minutes(lifetime_minutes).unwrap_or(Duration::MAX),
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issues a credential for `principal_name` valid from now.
    pub fn issue(&self, principal_name: &str) -> Result<String> {
        self.issue_at(principal_name, Utc::now())
    }

    /// Issues a credential as if the current time were `now`.
    pub fn issue_at(&self, principal_name: &str, now: DateTime<Utc>) -> Result<String> {
        let expires = now.checked_add_signed(self.lifetime).ok_or_else(|| {
            AppError::Internal("Credential expiry is out of range".to_string())
        })?;
        let claims = Claims {
            sub: SUBJECT.to_string(),
            iss: ISSUER.to_string(),
            username: principal_name.to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Checks that `token` has the three-segment shape with a decodable header.
    ///
    /// Callers run this before [`JwtCodec::verify`] so that a structurally
    /// broken value surfaces as `MalformedCredential`.
    pub fn check_well_formed(&self, token: &str) -> Result<()> {
        if token.split('.').count() != 3 {
            return Err(AppError::MalformedCredential);
        }
        decode_header(token)
            .map(|_| ())
            .map_err(|_| AppError::MalformedCredential)
    }

    /// Verifies `token` and returns the principal name it was issued for.
    pub fn verify(&self, token: &str) -> Result<String> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies `token` as if the current time were `now`.
    ///
    /// Fails with `InvalidCredential` on a signature mismatch, a wrong
    /// subject or issuer, missing or unknown claims, or when `now` is not
    /// strictly before the expiry instant.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.sub = Some(SUBJECT.to_string());
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        // Expiry is checked below against the supplied clock, with no leeway.
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(reason = %e, "credential rejected");
                AppError::InvalidCredential
            })?;

        if now.timestamp() >= claims.exp {
            debug!(exp = claims.exp, "credential expired");
            return Err(AppError::InvalidCredential);
        }

        Ok(claims.username)
    }
}
