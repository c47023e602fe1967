//! The identity store: user records plus the single active session token per
//! user. All state lives behind one lock owned by this handle; callers never
//! see the raw maps.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::security;
use crate::tprintln;

use super::user::{Role, User};

#[derive(Default)]
struct IdentityState {
    /// user_id -> User
    users: HashMap<String, User>,
    /// display_name -> user_id
    names: HashMap<String, String>,
}

#[derive(Clone, Default)]
pub struct IdentityStore {
    inner: Arc<RwLock<IdentityState>>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision an admin account on first start so artist/band/genre creation
    /// is reachable. No-op when the account name is already registered.
    pub fn ensure_default_admin(&self, display_name: &str, password: &str) -> anyhow::Result<()> {
        let hash = security::hash_password(password)?;
        let mut st = self.inner.write();
        if st.names.contains_key(display_name) {
            return Ok(());
        }
        let user = User {
            user_id: Uuid::new_v4().to_string(),
            display_name: display_name.to_string(),
            password_hash: hash,
            role: Role::Admin,
            token: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        };
        tprintln!("identity.bootstrap admin user={}", display_name);
        st.names.insert(display_name.to_string(), user.user_id.clone());
        st.users.insert(user.user_id.clone(), user);
        Ok(())
    }

    /// Register a new member. Fails with Conflict when the display name is taken.
    pub fn register(&self, display_name: &str, password: &str) -> AppResult<String> {
        let hash = security::hash_password(password)
            .map_err(|e| AppError::internal("hash_failed".to_string(), e.to_string()))?;
        let mut st = self.inner.write();
        if st.names.contains_key(display_name) {
            return Err(AppError::conflict("name_taken", "display name already registered"));
        }
        let user = User {
            user_id: Uuid::new_v4().to_string(),
            display_name: display_name.to_string(),
            password_hash: hash,
            role: Role::Member,
            token: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        };
        let uid = user.user_id.clone();
        st.names.insert(display_name.to_string(), uid.clone());
        st.users.insert(uid.clone(), user);
        Ok(uid)
    }

    /// Authenticate and issue a fresh token. Any prior token for the user is
    /// overwritten and becomes immediately invalid (single active session).
    pub fn login(&self, display_name: &str, password: &str) -> AppResult<(String, String)> {
        let mut st = self.inner.write();
        let uid = st
            .names
            .get(display_name)
            .cloned()
            .ok_or_else(|| AppError::auth("login_failed", "unknown name or wrong password"))?;
        let user = st
            .users
            .get_mut(&uid)
            .ok_or_else(|| AppError::internal("identity_index", "name index points at missing user"))?;
        if !security::verify_password(&user.password_hash, password) {
            return Err(AppError::auth("login_failed", "unknown name or wrong password"));
        }
        let token = security::gen_token();
        user.token = Some(token.clone());
        tprintln!("identity.login user={}", display_name);
        Ok((uid, token))
    }

    /// Clear the stored token. The presented token must match the current one.
    pub fn logout(&self, user_id: &str, token: &str) -> AppResult<()> {
        let mut st = self.inner.write();
        let user = st
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::auth("logout_failed", "identity or token is not live"))?;
        match user.token.as_deref() {
            Some(current) if current == token => {
                user.token = None;
                Ok(())
            }
            _ => Err(AppError::auth("logout_failed", "identity or token is not live")),
        }
    }

    /// Exact, case-sensitive token match against the user's current session.
    pub fn is_live(&self, user_id: &str, token: &str) -> bool {
        let st = self.inner.read();
        st.users
            .get(user_id)
            .and_then(|u| u.token.as_deref())
            .map(|t| t == token)
            .unwrap_or(false)
    }

    /// Live session AND admin role.
    pub fn is_admin(&self, user_id: &str, token: &str) -> bool {
        let st = self.inner.read();
        match st.users.get(user_id) {
            Some(u) => u.token.as_deref() == Some(token) && u.is_admin(),
            None => false,
        }
    }

    pub fn get(&self, user_id: &str) -> Option<User> {
        self.inner.read().users.get(user_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_duplicate_display_name() {
        let ids = IdentityStore::new();
        ids.register("alice", "pw-one").expect("first registration");
        let dup = ids.register("alice", "pw-two");
        assert!(matches!(dup, Err(AppError::Conflict { .. })));
    }

    #[test]
    fn login_overwrites_previous_token() {
        let ids = IdentityStore::new();
        let uid = ids.register("alice", "pw").unwrap();
        let (_, first) = ids.login("alice", "pw").unwrap();
        assert!(ids.is_live(&uid, &first));
        let (_, second) = ids.login("alice", "pw").unwrap();
        assert!(!ids.is_live(&uid, &first), "old token must die on re-login");
        assert!(ids.is_live(&uid, &second));
    }

    #[test]
    fn logout_requires_matching_token() {
        let ids = IdentityStore::new();
        let uid = ids.register("alice", "pw").unwrap();
        let (_, token) = ids.login("alice", "pw").unwrap();
        assert!(ids.logout(&uid, "not-the-token").is_err());
        assert!(ids.is_live(&uid, &token));
        ids.logout(&uid, &token).unwrap();
        assert!(!ids.is_live(&uid, &token));
    }

    #[test]
    fn is_admin_needs_live_session_and_role() {
        let ids = IdentityStore::new();
        ids.ensure_default_admin("root", "root-pw").unwrap();
        let uid = ids.register("bob", "pw").unwrap();
        let (_, token) = ids.login("bob", "pw").unwrap();
        // Member with live session is not admin
        assert!(ids.is_live(&uid, &token));
        assert!(!ids.is_admin(&uid, &token));
        // Admin without a session is not admin either
        let (aid, atok) = ids.login("root", "root-pw").unwrap();
        assert!(ids.is_admin(&aid, &atok));
        ids.logout(&aid, &atok).unwrap();
        assert!(!ids.is_admin(&aid, &atok));
    }

    #[test]
    fn ensure_default_admin_is_idempotent() {
        let ids = IdentityStore::new();
        ids.ensure_default_admin("root", "root-pw").unwrap();
        ids.ensure_default_admin("root", "other-pw").unwrap();
        // First password still works: bootstrap never overwrites
        assert!(ids.login("root", "root-pw").is_ok());
        assert!(ids.login("root", "other-pw").is_err());
    }
}
