//! Verified claims → caller identity.
use serde_json::Value;
use thiserror::Error;

use crate::services::auth::access_jwt::ClaimSet;

/// The resolved caller. Lives in one request's extensions and nowhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub role: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("claim '{0}' is missing")]
    Missing(&'static str),
    #[error("claim '{0}' is not a string")]
    NotAString(&'static str),
    #[error("claim '{0}' is empty")]
    Empty(&'static str),
}

pub fn resolve_identity(claims: &ClaimSet) -> Result<Identity, IdentityError> {
    Ok(Identity {
        subject: required_string(subject_claim(claims), "sub")?,
        role: required_string(claims.role.as_ref(), "role")?,
    })
}

/// `sub` wins; the legacy `id` claim is only consulted when `sub` is absent.
fn subject_claim(claims: &ClaimSet) -> Option<&Value> {
    match claims.sub.as_ref() {
        None | Some(Value::Null) => claims.id.as_ref(),
        sub => sub,
    }
}

fn required_string(value: Option<&Value>, name: &'static str) -> Result<String, IdentityError> {
    match value {
        None | Some(Value::Null) => Err(IdentityError::Missing(name)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(IdentityError::Empty(name)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(IdentityError::NotAString(name)),
    }
}
