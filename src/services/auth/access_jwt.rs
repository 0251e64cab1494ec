use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::Deserialize;
use thiserror::Error;

/// Errors returned by access-token verification.
///
/// `Expired` is only reported for tokens whose signature checked out;
/// everything else (bad signature, wrong algorithm, undecodable payload,
/// issuer/audience mismatch, missing `exp`) is `Invalid`.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token invalid: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("token expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Invalid(e),
        }
    }
}

/// Verified token payload.
///
/// `sub` and `role` stay untyped here: the identity resolver decides whether
/// they are usable, so a structurally valid token with a bad `role` is told
/// apart from a bad token. Older tokens carry the subject as `id`, sometimes
/// next to `sub`. Claims the gateway does not use are not decoded at all.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimSet {
    #[serde(default)]
    pub sub: Option<serde_json::Value>,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub role: Option<serde_json::Value>,
    pub exp: u64,
}

/// HMAC (HS256) access-token verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenValidator")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenValidator {
    pub fn new(
        secret: &[u8],
        leeway_seconds: u64,
        issuer: Option<&str>,
        audience: Option<&str>,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_seconds;
        validation.validate_exp = true;

        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Verify the signature, then decode and check `exp` (and `iss`/`aud` when
    /// configured). Nothing from the payload is returned unless the signature
    /// is valid.
    pub fn verify(&self, token: &str) -> Result<ClaimSet, TokenError> {
        let data = jsonwebtoken::decode::<ClaimSet>(token, &self.decoding_key, &self.validation)?;

        // jsonwebtoken still accepts `exp == now`; a token must expire strictly in the future.
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
        if data.claims.exp <= now.saturating_sub(self.validation.leeway) {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}
