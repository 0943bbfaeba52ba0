//! Authentication primitives and authorization policies.

pub mod policy;
pub mod principal;
pub mod token;

pub use policy::{can_create, can_modify, NOT_OWNER_MESSAGE};
pub use principal::{Principal, Role};
pub use token::{Claims, TokenCodec, TokenError};
