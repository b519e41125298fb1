//! Two-stage request security.
//!
//! 1. `access`: resolves the bearer token into an `AuthCtx` and never rejects.
//! 2. `guard`: enforces the route's `Requirement` (401 / 403).

pub mod access;
pub mod guard;

pub use access::apply;
