//! Central identity and session management for discograph.
//! Keep the public surface thin and split implementation across sub-modules.

mod user;
mod store;
mod validator;
mod authorizer;

pub use user::{Role, User};
pub use store::IdentityStore;
pub use validator::{require_user, require_admin};
pub use authorizer::{resolve, Deny, Grant, Target, Verdict};
