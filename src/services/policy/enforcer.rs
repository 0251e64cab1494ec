//! Allow/Deny decisions over the policy store. Default deny.
use std::sync::Arc;

use crate::services::policy::store::{PolicyError, PolicyStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Every call site goes through [`PolicyEnforcer::enforce`]; there is no other
/// matching path.
#[derive(Clone, Debug)]
pub struct PolicyEnforcer {
    store: Arc<PolicyStore>,
}

impl PolicyEnforcer {
    pub fn new(store: Arc<PolicyStore>) -> Self {
        Self { store }
    }

    /// `Allow` only when at least one rule matches.
    ///
    /// Errors carry no decision; callers must treat them as deny.
    pub fn enforce(
        &self,
        role: &str,
        resource: &str,
        action: &str,
    ) -> Result<Decision, PolicyError> {
        if self.store.matches(role, resource, action)? {
            Ok(Decision::Allow)
        } else {
            Ok(Decision::Deny)
        }
    }
}
