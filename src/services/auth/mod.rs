pub mod access_policy;
pub mod authentication;
pub mod error;
pub mod factory;
pub mod password;
pub mod role;
pub mod seed;
pub mod token_codec;

pub use access_policy::{AccessPolicy, Requirement};
pub use authentication::AuthenticationService;
pub use error::AuthError;
pub use factory::build_auth_service;
pub use role::Role;
