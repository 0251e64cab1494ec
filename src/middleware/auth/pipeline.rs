//! Request authentication / authorization pipeline.
//!
//! Stages run strictly in order and stop at the first failure:
//!
//! ```text
//! Start → CredentialExtracted → TokenVerified → IdentityResolved → Authorized → Dispatched
//!   └──────────────┴──────────────────┴────────────────┴──────────────┴──→ Rejected
//! ```
//!
//! Each stage is a plain function of its input, so the ordering and the
//! short-circuiting can be tested without an HTTP server. Dispatch itself
//! (and the `Authorized → Dispatched` edge) is driven by the middleware in
//! `access.rs`.
use axum::http::{HeaderMap, Method, StatusCode};
use thiserror::Error;

use crate::middleware::auth::credential::{CredentialError, extract_bearer};
use crate::services::auth::{
    ClaimSet, Identity, TokenError, TokenValidator, resolve_identity,
};
use crate::services::policy::{Decision, PolicyEnforcer, PolicyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    Start,
    CredentialExtracted,
    TokenVerified,
    IdentityResolved,
    Authorized,
    Dispatched,
    Rejected,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::CredentialExtracted => "credential_extracted",
            Self::TokenVerified => "token_verified",
            Self::IdentityResolved => "identity_resolved",
            Self::Authorized => "authorized",
            Self::Dispatched => "dispatched",
            Self::Rejected => "rejected",
        }
    }
}

/// Why a request was rejected. The `Display` text is what the client sees.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("authorization header is missing")]
    CredentialMissing,
    #[error("authorization header must be 'Bearer <token>'")]
    CredentialMalformed,
    #[error("invalid token")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("token is missing required claims")]
    ClaimsIncomplete,
    #[error("forbidden")]
    Denied,
    #[error("internal server error")]
    PolicyEvaluationError,
    #[error("policy store unavailable")]
    PolicyStoreUnavailable,
    #[error("upstream timed out")]
    DispatchTimeout,
}

impl AuthFailure {
    pub fn kind(self) -> &'static str {
        match self {
            Self::CredentialMissing => "CredentialMissing",
            Self::CredentialMalformed => "CredentialMalformed",
            Self::TokenInvalid => "TokenInvalid",
            Self::TokenExpired => "TokenExpired",
            Self::ClaimsIncomplete => "ClaimsIncomplete",
            Self::Denied => "Denied",
            Self::PolicyEvaluationError => "PolicyEvaluationError",
            Self::PolicyStoreUnavailable => "PolicyStoreUnavailable",
            Self::DispatchTimeout => "DispatchTimeout",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            Self::CredentialMissing
            | Self::CredentialMalformed
            | Self::TokenInvalid
            | Self::TokenExpired
            | Self::ClaimsIncomplete => StatusCode::UNAUTHORIZED,
            Self::Denied => StatusCode::FORBIDDEN,
            Self::PolicyEvaluationError | Self::PolicyStoreUnavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::DispatchTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Operational faults as opposed to a caller being turned away.
    pub fn is_fault(self) -> bool {
        self.status().is_server_error()
    }
}

impl From<CredentialError> for AuthFailure {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::Missing => Self::CredentialMissing,
            CredentialError::Malformed => Self::CredentialMalformed,
        }
    }
}

impl From<&TokenError> for AuthFailure {
    fn from(e: &TokenError) -> Self {
        match e {
            TokenError::Expired => Self::TokenExpired,
            TokenError::Invalid(_) => Self::TokenInvalid,
        }
    }
}

impl From<&PolicyError> for AuthFailure {
    fn from(e: &PolicyError) -> Self {
        match e {
            PolicyError::NotLoaded | PolicyError::Unavailable(_) => Self::PolicyStoreUnavailable,
            PolicyError::InvalidStoredRule { .. } | PolicyError::MalformedResource(_) => {
                Self::PolicyEvaluationError
            }
        }
    }
}

/// Terminal rejection: the last stage reached, the failure, and whatever
/// identity had been resolved. `detail` is for logs only.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub stage: PipelineStage,
    pub failure: AuthFailure,
    pub identity: Option<Identity>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Authorized {
    pub identity: Identity,
    pub resource: String,
}

/// Stage cursor for one request. Only moves forward.
#[derive(Debug)]
struct Run {
    stage: PipelineStage,
    identity: Option<Identity>,
}

impl Run {
    fn start() -> Self {
        Self {
            stage: PipelineStage::Start,
            identity: None,
        }
    }

    fn advance(&mut self, next: PipelineStage) {
        debug_assert!(next > self.stage, "pipeline stages only move forward");
        self.stage = next;
    }

    fn reject(&self, failure: AuthFailure, detail: Option<String>) -> Rejection {
        Rejection {
            stage: self.stage,
            failure,
            identity: self.identity.clone(),
            detail,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthPipeline {
    validator: TokenValidator,
    enforcer: PolicyEnforcer,
}

impl AuthPipeline {
    pub fn new(validator: TokenValidator, enforcer: PolicyEnforcer) -> Self {
        Self {
            validator,
            enforcer,
        }
    }

    /// Run every pre-dispatch stage.
    ///
    /// `resource` is the matched route template; `None` when the router could
    /// not resolve one.
    pub fn evaluate(
        &self,
        headers: &HeaderMap,
        resource: Option<&str>,
        method: &Method,
    ) -> Result<Authorized, Rejection> {
        let mut run = Run::start();

        let credential = extract_bearer(headers).map_err(|e| run.reject(e.into(), None))?;
        run.advance(PipelineStage::CredentialExtracted);

        let claims = self
            .verify_token(credential)
            .map_err(|e| run.reject((&e).into(), Some(e.to_string())))?;
        run.advance(PipelineStage::TokenVerified);

        let identity = resolve_identity(&claims)
            .map_err(|e| run.reject(AuthFailure::ClaimsIncomplete, Some(e.to_string())))?;
        run.identity = Some(identity.clone());
        run.advance(PipelineStage::IdentityResolved);

        let resource = resource.ok_or_else(|| {
            run.reject(
                AuthFailure::PolicyEvaluationError,
                Some("route template unresolved".to_string()),
            )
        })?;

        match self.enforcer.enforce(&identity.role, resource, method.as_str()) {
            Ok(Decision::Allow) => {}
            Ok(Decision::Deny) => return Err(run.reject(AuthFailure::Denied, None)),
            Err(e) => return Err(run.reject((&e).into(), Some(e.to_string()))),
        }
        run.advance(PipelineStage::Authorized);

        Ok(Authorized {
            identity,
            resource: resource.to_string(),
        })
    }

    fn verify_token(&self, credential: &str) -> Result<ClaimSet, TokenError> {
        self.validator.verify(credential)
    }
}
