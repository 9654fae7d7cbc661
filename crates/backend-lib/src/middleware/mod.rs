// crates/backend-lib/src/middleware/mod.rs

//! Request middleware for the board server.

pub mod session_guard;

pub use session_guard::{
    clear_cookie_header, session_cookie, session_cookie_header, session_guard, CurrentUser,
    GuardOutcome, SessionGuard,
};
