/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: AuthenticationService, policy: AccessPolicy
 * - Clone 前提で持つ (内部は Arc で cheap)
 */
use std::sync::Arc;

use crate::services::auth::{AccessPolicy, AuthenticationService};

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<AuthenticationService>,
    pub policy: Arc<AccessPolicy>,
}

impl AppState {
    pub fn new(auth: Arc<AuthenticationService>, policy: AccessPolicy) -> Self {
        Self {
            auth,
            policy: Arc::new(policy),
        }
    }
}
