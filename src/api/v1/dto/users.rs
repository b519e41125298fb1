/*
 * Responsibility
 * - Users (principal) の request/response DTO
 * - password_hash は Principal に含まれないので、ここから漏れることはない
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::credential_store::Principal;
use crate::services::auth::Role;

#[derive(Debug, Serialize)]
pub struct PrincipalResponse {
    pub id: Uuid,
    pub identifier: String,
    pub email: String,
    pub role: Role,
    pub enabled: bool,
}

impl From<Principal> for PrincipalResponse {
    fn from(p: Principal) -> Self {
        Self {
            id: p.id,
            identifier: p.identifier,
            email: p.email,
            role: p.role,
            enabled: p.enabled,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    /// Parsed with `Role::from_str`, so `porteur` and `ROLE_PORTEUR` are accepted.
    pub role: String,
}
