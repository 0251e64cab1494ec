//! `Authorization: Bearer <token>` extraction. Transport format only.
use axum::http::{HeaderMap, header};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("authorization header is missing")]
    Missing,
    #[error("authorization header is malformed")]
    Malformed,
}

/// Return the raw bearer token.
///
/// Exactly one `Authorization` header, exactly `Bearer` + one space + a
/// non-empty token with no further spaces. The scheme keyword is
/// case-sensitive.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, CredentialError> {
    let mut values = headers.get_all(header::AUTHORIZATION).iter();
    let value = values.next().ok_or(CredentialError::Missing)?;
    if values.next().is_some() {
        return Err(CredentialError::Malformed);
    }

    let raw = value.to_str().map_err(|_| CredentialError::Malformed)?;
    if raw.trim().is_empty() {
        return Err(CredentialError::Missing);
    }

    let mut parts = raw.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(CredentialError::Malformed),
    }
}
