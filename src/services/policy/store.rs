//! In-memory policy store backed by a durable [`PolicyBackend`].
//!
//! Readers take a lock-free snapshot (`ArcSwapOption::load_full`) and evaluate
//! against it, so a `matches` call sees one whole rule set even while a writer
//! publishes a new one. Writers are serialized by an async mutex held across
//! the durable save; the new snapshot is published only after the save
//! succeeds, which keeps memory and storage in step for every call.
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::repos::error::RepoError;
use crate::services::policy::backend::{PolicyBackend, PolicyRecord};
use crate::services::policy::rule::{PolicyRule, PolicySet, RuleError};

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy store is not loaded")]
    NotLoaded,
    #[error("policy backend unavailable: {0}")]
    Unavailable(#[from] RepoError),
    #[error("stored rule #{index} is invalid: {source}")]
    InvalidStoredRule {
        index: usize,
        #[source]
        source: RuleError,
    },
    #[error("cannot evaluate resource {0:?}")]
    MalformedResource(String),
}

/// Result of one [`PolicyStore::add_rules`] call, both counts taken under the
/// writer lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    pub added: usize,
    pub total: usize,
}

pub struct PolicyStore {
    backend: Arc<dyn PolicyBackend>,
    snapshot: ArcSwapOption<PolicySet>,
    write_lock: Mutex<()>,
}

impl fmt::Debug for PolicyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyStore")
            .field("backend", &self.backend.backend_name())
            .field("rules", &self.snapshot.load().as_ref().map(|s| s.len()))
            .finish()
    }
}

impl PolicyStore {
    /// Create an unloaded store. Every `matches` fails until [`Self::load`] succeeds.
    pub fn new(backend: Arc<dyn PolicyBackend>) -> Self {
        Self {
            backend,
            snapshot: ArcSwapOption::empty(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.load().is_some()
    }

    /// Read the whole rule set from durable storage and publish it.
    ///
    /// Also used for reloads; on failure the current snapshot stays in place.
    pub async fn load(&self) -> Result<usize, PolicyError> {
        let _guard = self.write_lock.lock().await;

        let records = self.backend.load_all().await.map_err(|err| {
            warn!(backend = self.backend_name(), error = %err, "policy load failed");
            PolicyError::from(err)
        })?;
        let set = parse_records(records)?;
        let total = set.len();

        self.snapshot.store(Some(Arc::new(set)));
        info!(backend = self.backend_name(), rules = total, "policy set loaded");

        Ok(total)
    }

    /// Append rules and persist the resulting set.
    ///
    /// All-or-nothing: if the durable save fails, the in-memory snapshot is
    /// left untouched.
    pub async fn add_rules(&self, rules: Vec<PolicyRule>) -> Result<AddOutcome, PolicyError> {
        let _guard = self.write_lock.lock().await;

        let current = self.snapshot.load_full().ok_or(PolicyError::NotLoaded)?;
        let mut next = PolicySet::clone(&current);
        let added = next.extend(rules);
        if added == 0 {
            return Ok(AddOutcome {
                added: 0,
                total: current.len(),
            });
        }

        self.backend.save_all(next.rules()).await.map_err(|err| {
            warn!(backend = self.backend_name(), error = %err, "policy save failed");
            PolicyError::from(err)
        })?;

        let total = next.len();
        self.snapshot.store(Some(Arc::new(next)));
        info!(added, total, "policy rules added");

        Ok(AddOutcome { added, total })
    }

    /// Current snapshot. Holding it pins that version of the rule set.
    pub fn snapshot(&self) -> Result<Arc<PolicySet>, PolicyError> {
        self.snapshot.load_full().ok_or(PolicyError::NotLoaded)
    }

    /// Whether any rule grants `(role, resource, action)`.
    pub fn matches(&self, role: &str, resource: &str, action: &str) -> Result<bool, PolicyError> {
        self.snapshot()?
            .matches(role, resource, action)
            .ok_or_else(|| PolicyError::MalformedResource(resource.to_string()))
    }
}

fn parse_records(records: Vec<PolicyRecord>) -> Result<PolicySet, PolicyError> {
    let rules = records
        .iter()
        .enumerate()
        .map(|(index, r)| {
            PolicyRule::new(&r.role, &r.resource, &r.action)
                .map_err(|source| PolicyError::InvalidStoredRule { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PolicySet::new(rules))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::policy::backend::MemoryPolicyBackend;

    fn rule(role: &str, resource: &str, action: &str) -> PolicyRule {
        PolicyRule::new(role, resource, action).unwrap()
    }

    async fn loaded_store(records: Vec<PolicyRecord>) -> (Arc<MemoryPolicyBackend>, PolicyStore) {
        let backend = Arc::new(MemoryPolicyBackend::with_records(records));
        let store = PolicyStore::new(backend.clone());
        store.load().await.unwrap();
        (backend, store)
    }

    #[tokio::test]
    async fn unloaded_store_fails_closed() {
        let store = PolicyStore::new(Arc::new(MemoryPolicyBackend::new()));
        assert!(!store.is_loaded());
        assert!(matches!(
            store.matches("admin", "/x", "GET"),
            Err(PolicyError::NotLoaded)
        ));
    }

    #[tokio::test]
    async fn load_failure_is_reported_as_unavailable() {
        let backend = Arc::new(MemoryPolicyBackend::new());
        backend.set_fail_loads(true);
        let store = PolicyStore::new(backend);

        assert!(matches!(
            store.load().await,
            Err(PolicyError::Unavailable(_))
        ));
        assert!(!store.is_loaded());
    }

    #[tokio::test]
    async fn invalid_stored_rule_fails_the_load() {
        let backend = Arc::new(MemoryPolicyBackend::with_records(vec![
            PolicyRecord::new("admin", "/ok", "GET"),
            PolicyRecord::new("admin", "not-a-path", "GET"),
        ]));
        let store = PolicyStore::new(backend);

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, PolicyError::InvalidStoredRule { index: 1, .. }));
    }

    #[tokio::test]
    async fn add_rules_persists_and_publishes() {
        let (backend, store) =
            loaded_store(vec![PolicyRecord::new("patient", "/wearable/data/{id}", "GET")]).await;

        let added = store
            .add_rules(vec![
                rule("admin", "/wearable/data/{id}", "DELETE"),
                rule("patient", "/wearable/data/:id", "get"),
            ])
            .await
            .unwrap();

        assert_eq!(added, AddOutcome { added: 1, total: 2 });
        assert!(store.matches("admin", "/wearable/data/{id}", "DELETE").unwrap());
        assert_eq!(
            backend.records(),
            vec![
                PolicyRecord::new("patient", "/wearable/data/{id}", "GET"),
                PolicyRecord::new("admin", "/wearable/data/{id}", "DELETE"),
            ]
        );
    }

    #[tokio::test]
    async fn failed_save_leaves_memory_and_storage_unchanged() {
        let (backend, store) = loaded_store(vec![PolicyRecord::new("a", "/x", "GET")]).await;
        backend.set_fail_saves(true);

        let err = store
            .add_rules(vec![rule("b", "/y", "POST")])
            .await
            .unwrap_err();

        assert!(matches!(err, PolicyError::Unavailable(_)));
        assert!(!store.matches("b", "/y", "POST").unwrap());
        assert_eq!(store.snapshot().unwrap().len(), 1);
        assert_eq!(backend.records(), vec![PolicyRecord::new("a", "/x", "GET")]);
    }

    #[tokio::test]
    async fn duplicate_only_add_does_not_touch_storage() {
        let (backend, store) = loaded_store(vec![PolicyRecord::new("a", "/x", "GET")]).await;
        backend.set_fail_saves(true);

        let outcome = store.add_rules(vec![rule("a", "/x", "get")]).await.unwrap();
        assert_eq!(outcome, AddOutcome { added: 0, total: 1 });
    }

    #[tokio::test]
    async fn add_rules_before_load_is_rejected() {
        let store = PolicyStore::new(Arc::new(MemoryPolicyBackend::new()));
        assert!(matches!(
            store.add_rules(vec![rule("a", "/x", "GET")]).await,
            Err(PolicyError::NotLoaded)
        ));
    }

    #[tokio::test]
    async fn reload_picks_up_external_changes_and_keeps_snapshot_on_failure() {
        let (backend, store) = loaded_store(vec![PolicyRecord::new("a", "/x", "GET")]).await;

        backend.replace_records(vec![PolicyRecord::new("b", "/y", "GET")]);
        store.load().await.unwrap();
        assert!(store.matches("b", "/y", "GET").unwrap());
        assert!(!store.matches("a", "/x", "GET").unwrap());

        backend.set_fail_loads(true);
        assert!(store.load().await.is_err());
        assert!(store.matches("b", "/y", "GET").unwrap());
    }

    #[tokio::test]
    async fn matches_is_a_pure_function_of_the_snapshot() {
        let (_backend, store) =
            loaded_store(vec![PolicyRecord::new("patient", "/lifestyle/{id}", "GET")]).await;

        let first = store.matches("patient", "/lifestyle/{id}", "GET").unwrap();
        let second = store.matches("patient", "/lifestyle/{id}", "GET").unwrap();
        assert_eq!(first, second);

        assert!(matches!(
            store.matches("patient", "lifestyle", "GET"),
            Err(PolicyError::MalformedResource(_))
        ));
    }
}
