pub mod access_jwt;
pub mod factory;
pub mod identity;

pub use access_jwt::{ClaimSet, TokenError, TokenValidator};
pub use factory::build_token_validator;
pub use identity::{Identity, IdentityError, resolve_identity};
