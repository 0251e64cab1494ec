//! Durable storage interface for the policy set.
use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;

use crate::repos::error::{RepoError, RepoResult};
use crate::services::policy::rule::PolicyRule;

/// A stored rule as raw strings. Validation happens when the store loads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRecord {
    pub role: String,
    pub resource: String,
    pub action: String,
}

impl PolicyRecord {
    pub fn new(
        role: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            resource: resource.into(),
            action: action.into(),
        }
    }
}

impl From<&PolicyRule> for PolicyRecord {
    fn from(rule: &PolicyRule) -> Self {
        Self {
            role: rule.role().to_string(),
            resource: rule.resource().to_string(),
            action: rule.action().to_string(),
        }
    }
}

/// Wholesale load/save of the rule set.
///
/// `save_all` must replace the stored set atomically: after an `Err`, the
/// previously stored set is still the one a later `load_all` returns.
#[async_trait]
pub trait PolicyBackend: Send + Sync + 'static {
    // Backend name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn load_all(&self) -> RepoResult<Vec<PolicyRecord>>;

    async fn save_all(&self, rules: &[PolicyRule]) -> RepoResult<()>;
}

/// In-process backend used in development (no `DATABASE_URL`) and in tests.
///
/// Failures can be switched on to exercise the unavailable-backend paths.
#[derive(Debug, Default)]
pub struct MemoryPolicyBackend {
    records: Mutex<Vec<PolicyRecord>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
}

impl MemoryPolicyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<PolicyRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<PolicyRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace stored records directly, bypassing any store.
    pub fn replace_records(&self, records: Vec<PolicyRecord>) {
        *self.records.lock().unwrap_or_else(PoisonError::into_inner) = records;
    }
}

#[async_trait]
impl PolicyBackend for MemoryPolicyBackend {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn load_all(&self) -> RepoResult<Vec<PolicyRecord>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("memory backend load disabled".into()));
        }
        Ok(self.records())
    }

    async fn save_all(&self, rules: &[PolicyRule]) -> RepoResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("memory backend save disabled".into()));
        }
        self.replace_records(rules.iter().map(PolicyRecord::from).collect());
        Ok(())
    }
}
