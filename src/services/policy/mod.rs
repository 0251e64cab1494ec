pub mod backend;
pub mod enforcer;
pub mod pattern;
pub mod rule;
pub mod seed;
pub mod store;

pub use backend::{MemoryPolicyBackend, PolicyBackend, PolicyRecord};
pub use enforcer::{Decision, PolicyEnforcer};
pub use rule::{PolicyRule, PolicySet, RuleError};
pub use store::{AddOutcome, PolicyError, PolicyStore};
