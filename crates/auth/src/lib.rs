//! `apflow-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. It owns the
//! normalized role model, the actor abstraction, JWT claim validation, and
//! the access-policy resolver that every read/list path must delegate to.

pub mod actor;
pub mod claims;
pub mod roles;
pub mod scope;

pub use actor::Actor;
pub use claims::{Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError};
pub use roles::Role;
pub use scope::{may_update, scope_for, AccessScope, ResourceKind};
