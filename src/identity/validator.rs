//! Session preconditions shared by every gated catalog operation. These are
//! checks over the identity store, not separate state: each operation calls
//! one of them first and short-circuits before touching the entity graph.

use crate::error::{AppError, AppResult};

use super::store::IdentityStore;

pub fn require_user(identity: &IdentityStore, user_id: &str, token: &str) -> AppResult<()> {
    if identity.is_live(user_id, token) {
        Ok(())
    } else {
        Err(AppError::auth("auth_required", "identity or token is not live"))
    }
}

pub fn require_admin(identity: &IdentityStore, admin_id: &str, token: &str) -> AppResult<()> {
    if identity.is_admin(admin_id, token) {
        Ok(())
    } else {
        Err(AppError::auth("admin_required", "live admin session required"))
    }
}
