//! Built-in grants added at startup when `POLICY_SEED_DEFAULTS` is on.
//!
//! Resources are route templates relative to `/api/v1`.
use crate::services::policy::rule::{PolicyRule, RuleError};

const DEFAULT_GRANTS: &[(&str, &str, &str)] = &[
    // policy administration
    ("admin", "/policies", "GET"),
    ("admin", "/policies", "POST"),
    ("admin", "/policies/reload", "POST"),
    // users
    ("admin", "/users/profile/{id}", "GET"),
    ("admin", "/users/email/{email}", "GET"),
    ("admin", "/users/{id}", "PUT"),
    ("doctor", "/users/profile/{id}", "GET"),
    ("patient", "/users/profile/{id}", "GET"),
    ("patient", "/users/{id}", "PUT"),
    // medical records
    ("doctor", "/medical-records", "POST"),
    ("admin", "/medical-records", "POST"),
    ("doctor", "/medical-records/{id}", "GET"),
    ("admin", "/medical-records/{id}", "GET"),
    ("patient", "/medical-records/{id}", "GET"),
    ("doctor", "/medical-records/{id}", "PUT"),
    ("admin", "/medical-records/{id}", "PUT"),
    ("admin", "/medical-records/{id}", "DELETE"),
    ("admin", "/medical-records/user/{user_id}", "GET"),
    ("doctor", "/medical-records/user/{user_id}", "GET"),
    // lifestyle
    ("patient", "/lifestyle", "POST"),
    ("patient", "/lifestyle/user/{user_id}", "GET"),
    ("patient", "/lifestyle/{id}", "GET"),
    ("patient", "/lifestyle/{id}", "PUT"),
    ("patient", "/lifestyle/{id}", "DELETE"),
    // wearable data
    ("patient", "/wearable/data", "POST"),
    ("patient", "/wearable/data/user/{user_id}", "GET"),
    ("patient", "/wearable/data/{id}", "GET"),
    ("patient", "/wearable/data/{id}", "PUT"),
    ("patient", "/wearable/data/{id}", "DELETE"),
    // health insights
    ("doctor", "/health/recommendations", "POST"),
    ("patient", "/health/monitoring/{user_id}/realtime", "GET"),
    ("patient", "/health/summary/{user_id}/daily/{date}", "GET"),
    ("patient", "/health/summary/{user_id}/weekly/{start_date}", "GET"),
];

pub fn default_rules() -> Result<Vec<PolicyRule>, RuleError> {
    DEFAULT_GRANTS
        .iter()
        .map(|(role, resource, action)| PolicyRule::new(role, resource, action))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::policy::rule::PolicySet;

    #[test]
    fn default_grants_parse_and_are_unique() {
        let rules = default_rules().unwrap();
        let set = PolicySet::new(rules.clone());
        assert_eq!(set.len(), rules.len());
    }

    #[test]
    fn only_admin_manages_policies() {
        let set = PolicySet::new(default_rules().unwrap());
        assert_eq!(set.matches("admin", "/policies", "POST"), Some(true));
        assert_eq!(set.matches("doctor", "/policies", "POST"), Some(false));
        assert_eq!(set.matches("patient", "/policies", "GET"), Some(false));
    }
}
