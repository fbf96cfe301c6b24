//! `tradeerp-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. Form requests
//! ask it one question ("may this principal do X?") and get a yes/no answer.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod policy;
pub mod principal;
pub mod roles;

pub use authorize::{authorize, AuthzError, Principal};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use permissions::Permission;
pub use policy::RolePolicy;
pub use principal::{PrincipalId, TenantMembership};
pub use roles::Role;
