//! Policy rules and the immutable rule set a store snapshot holds.
use std::collections::HashSet;

use thiserror::Error;

use super::pattern::{PatternError, ResourcePattern, split_path};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("role must not be empty")]
    EmptyRole,
    #[error("invalid action: {0:?}")]
    InvalidAction(String),
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// A single positive grant: `role` may perform `action` on `resource`.
///
/// Fields are private; a rule never changes after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolicyRule {
    role: String,
    resource: ResourcePattern,
    action: String,
}

impl PolicyRule {
    pub fn new(role: &str, resource: &str, action: &str) -> Result<Self, RuleError> {
        let role = role.trim();
        if role.is_empty() {
            return Err(RuleError::EmptyRole);
        }

        let action = action.trim();
        if action.is_empty() || !action.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RuleError::InvalidAction(action.to_string()));
        }

        Ok(Self {
            role: role.to_string(),
            resource: ResourcePattern::parse(resource)?,
            action: action.to_ascii_uppercase(),
        })
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn resource(&self) -> &ResourcePattern {
        &self.resource
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    fn grants(&self, role: &str, path: &[&str], action: &str) -> bool {
        self.role == role && self.action == action && self.resource.matches_segments(path)
    }
}

/// Ordered, duplicate-free collection of rules.
///
/// Every rule is a positive grant and the default is deny, so the outcome of
/// [`PolicySet::matches`] never depends on rule order.
#[derive(Debug, Clone, Default)]
pub struct PolicySet {
    rules: Vec<PolicyRule>,
}

impl PolicySet {
    pub fn new(rules: impl IntoIterator<Item = PolicyRule>) -> Self {
        let mut set = Self::default();
        set.extend(rules);
        set
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// Append rules not already present. Returns how many were new.
    pub fn extend(&mut self, rules: impl IntoIterator<Item = PolicyRule>) -> usize {
        let mut seen: HashSet<PolicyRule> = self.rules.iter().cloned().collect();
        let before = self.rules.len();
        for rule in rules {
            if seen.insert(rule.clone()) {
                self.rules.push(rule);
            }
        }
        self.rules.len() - before
    }

    /// `None` when `resource` is not an absolute path.
    pub fn matches(&self, role: &str, resource: &str, action: &str) -> Option<bool> {
        let path = split_path(resource)?;
        Some(self.rules.iter().any(|r| r.grants(role, &path, action)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(role: &str, resource: &str, action: &str) -> PolicyRule {
        PolicyRule::new(role, resource, action).unwrap()
    }

    #[test]
    fn action_is_normalized_to_upper_case() {
        let r = rule("patient", "/wearable/data/{id}", "get");
        assert_eq!(r.action(), "GET");
        assert_eq!(r, rule("patient", "/wearable/data/:id", "GET"));
    }

    #[test]
    fn invalid_rules_are_rejected() {
        assert_eq!(
            PolicyRule::new(" ", "/a", "GET"),
            Err(RuleError::EmptyRole)
        );
        assert!(matches!(
            PolicyRule::new("admin", "/a", ""),
            Err(RuleError::InvalidAction(_))
        ));
        assert!(matches!(
            PolicyRule::new("admin", "/a", "GET POST"),
            Err(RuleError::InvalidAction(_))
        ));
        assert!(matches!(
            PolicyRule::new("admin", "a", "GET"),
            Err(RuleError::Pattern(_))
        ));
    }

    #[test]
    fn spec_example_scenario() {
        let set = PolicySet::new([rule("patient", "/wearable/data/{id}", "GET")]);

        assert_eq!(
            set.matches("patient", "/wearable/data/{id}", "GET"),
            Some(true)
        );
        assert_eq!(
            set.matches("patient", "/wearable/data/{id}", "DELETE"),
            Some(false)
        );
        assert_eq!(
            set.matches("doctor", "/wearable/data/{id}", "GET"),
            Some(false)
        );
    }

    #[test]
    fn empty_set_denies_everything() {
        let set = PolicySet::default();
        assert_eq!(set.matches("admin", "/anything", "GET"), Some(false));
        assert_eq!(set.matches("admin", "/", "GET"), Some(false));
    }

    #[test]
    fn extend_skips_duplicates_and_keeps_order() {
        let mut set = PolicySet::new([rule("a", "/x", "GET"), rule("a", "/x", "get")]);
        assert_eq!(set.len(), 1);

        let added = set.extend([rule("b", "/y", "POST"), rule("a", "/x", "GET")]);
        assert_eq!(added, 1);
        assert_eq!(set.rules()[0], rule("a", "/x", "GET"));
        assert_eq!(set.rules()[1], rule("b", "/y", "POST"));
    }

    #[test]
    fn overlapping_rules_resolve_the_same_regardless_of_order() {
        let a = rule("patient", "/lifestyle/{id}", "GET");
        let b = rule("patient", "/lifestyle/42", "GET");
        let forward = PolicySet::new([a.clone(), b.clone()]);
        let backward = PolicySet::new([b, a]);

        for path in ["/lifestyle/42", "/lifestyle/7", "/lifestyle"] {
            assert_eq!(
                forward.matches("patient", path, "GET"),
                backward.matches("patient", path, "GET")
            );
        }
    }

    #[test]
    fn relative_resource_is_not_evaluated() {
        let set = PolicySet::new([rule("a", "/x", "GET")]);
        assert_eq!(set.matches("a", "x", "GET"), None);
    }
}
