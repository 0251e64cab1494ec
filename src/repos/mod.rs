pub mod error;
pub mod policy_repo;

pub use policy_repo::PgPolicyRepo;
