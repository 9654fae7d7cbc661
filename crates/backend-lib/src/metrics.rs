// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const USER_REGISTERED: &str = "auth.user_registered";
pub const LOGIN_SUCCEEDED: &str = "auth.login_succeeded";
pub const LOGIN_FAILED: &str = "auth.login_failed";
pub const SESSION_EXPIRED: &str = "session.expired";
pub const SESSION_REJECTED: &str = "session.rejected";
pub const ADMIN_ACTION: &str = "admin.action";
pub const ADMIN_DENIED: &str = "admin.denied";
