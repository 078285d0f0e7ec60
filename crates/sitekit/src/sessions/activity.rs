use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use tracing::{info, warn};

use super::store::SessionData;
use crate::config::SessionConfig;

/// Session field holding the ISO-8601 timestamp of the last authenticated request.
pub const LAST_ACTIVITY_KEY: &str = "last_activity";

/// Query flag appended to the login path after a forced logout.
pub const SESSION_EXPIRED_PARAM: &str = "session_expired";

/// Where an expired session is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget(pub String);

impl RedirectTarget {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Policy verdict for one request; the web layer turns it into a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityDecision {
    Continue,
    Terminate(RedirectTarget),
}

/// Idle-timeout policy over authenticated sessions.
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    idle_timeout: TimeDelta,
    login_path: String,
}

impl ActivityTracker {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            idle_timeout: config.idle_timeout,
            login_path: config.login_path.clone(),
        }
    }

    pub fn idle_timeout(&self) -> TimeDelta {
        self.idle_timeout
    }

    /// Checks the session against the idle timeout and stamps `now` when it survives.
    ///
    /// Unauthenticated sessions are left untouched. A missing or unparsable timestamp counts as
    /// no prior activity. The caller is responsible for invalidating the session on
    /// [`ActivityDecision::Terminate`].
    pub fn check(&self, now: DateTime<Utc>, session: &mut SessionData) -> ActivityDecision {
        if !session.is_authenticated() {
            return ActivityDecision::Continue;
        }

        if let Some(last_activity) = self.last_activity(session) {
            let idle = now - last_activity;
            if idle > self.idle_timeout {
                info!(
                    idle_seconds = idle.num_seconds(),
                    timeout_seconds = self.idle_timeout.num_seconds(),
                    "session idle timeout exceeded"
                );
                return ActivityDecision::Terminate(self.expired_redirect());
            }
        }

        session.set(LAST_ACTIVITY_KEY, now.to_rfc3339());
        ActivityDecision::Continue
    }

    pub fn expired_redirect(&self) -> RedirectTarget {
        let separator = if self.login_path.contains('?') { '&' } else { '?' };
        RedirectTarget(format!(
            "{}{}{}=true",
            self.login_path, separator, SESSION_EXPIRED_PARAM
        ))
    }

    fn last_activity(&self, session: &SessionData) -> Option<DateTime<Utc>> {
        let raw = session.get(LAST_ACTIVITY_KEY)?;
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            warn!(value = raw, "ignoring malformed last-activity timestamp");
        }
        parsed
    }
}

/// RFC 3339 first; offset-less ISO timestamps are read as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
