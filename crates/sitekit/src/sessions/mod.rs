//! Idle-timeout enforcement for authenticated sessions.
//!
//! [`ActivityTracker`] holds the policy and returns an [`ActivityDecision`]; the middleware in
//! [`middleware`] applies it to each request, persists the refreshed timestamp through the
//! [`SessionStore`] seam, and turns a termination into a redirect to the login page.

pub mod activity;
pub mod middleware;
pub mod router;
pub mod store;

#[cfg(test)]
mod tests;

pub use activity::{
    ActivityDecision, ActivityTracker, RedirectTarget, LAST_ACTIVITY_KEY, SESSION_EXPIRED_PARAM,
};
pub use middleware::{
    track_activity, with_session_tracking, AuthenticatedUser, SessionActivity, Touch,
};
pub use router::{account_router, LoginRequest, LOGOUT_PATH, WHOAMI_PATH};
pub use store::{SessionData, SessionKey, SessionStore, SessionStoreError, UserId};
