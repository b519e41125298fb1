/*
 * Responsibility
 * - Handler から見える「リクエスト単位の認証コンテキスト」の型
 * - middleware (access filter) が必ず request extensions に格納する
 *
 * Notes
 * - principal が Some なら、署名・期限の検証を通過し、かつ現在 enabled な主体
 * - ownership (BOLA) は静的ルールでは表現できないため、ここで handler 向けに判定する
 */

use crate::repos::credential_store::Principal;
use crate::services::auth::{Requirement, Role};

/// Why a request was refused after authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denied {
    /// No valid credentials (401).
    Unauthenticated,
    /// Authenticated but not allowed (403).
    Forbidden,
}

#[derive(Debug, Clone)]
pub struct AuthCtx {
    principal: Option<Principal>,
    requirement: Requirement,
}

impl AuthCtx {
    pub fn anonymous(requirement: Requirement) -> Self {
        Self {
            principal: None,
            requirement,
        }
    }

    pub fn authenticated(principal: Principal, requirement: Requirement) -> Self {
        Self {
            principal: Some(principal),
            requirement,
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.principal.as_ref().map(|p| p.role)
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    /// Check the route's requirement against the resolved principal.
    pub fn authorize(&self) -> Result<(), Denied> {
        if self.requirement.is_satisfied_by(self.role()) {
            Ok(())
        } else if self.principal.is_none() {
            Err(Denied::Unauthenticated)
        } else {
            Err(Denied::Forbidden)
        }
    }

    pub fn require_principal(&self) -> Result<&Principal, Denied> {
        self.principal.as_ref().ok_or(Denied::Unauthenticated)
    }

    /// The caller must be `owner_identifier` or an administrator.
    pub fn ensure_owner_or_admin(&self, owner_identifier: &str) -> Result<&Principal, Denied> {
        let principal = self.require_principal()?;
        if principal.identifier == owner_identifier || principal.role.is_admin() {
            Ok(principal)
        } else {
            Err(Denied::Forbidden)
        }
    }
}
