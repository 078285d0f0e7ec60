use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::activity::{ActivityDecision, ActivityTracker, RedirectTarget, LAST_ACTIVITY_KEY};
use super::store::{SessionData, SessionKey, SessionStore, SessionStoreError, UserId};
use crate::config::SessionConfig;

/// Request extension present when the request carries a live authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub session: SessionKey,
}

/// Session backend, idle policy, and cookie conventions bundled for the middleware and the
/// account routes.
pub struct SessionActivity<S> {
    store: Arc<S>,
    tracker: ActivityTracker,
    cookie_name: String,
}

impl<S> SessionActivity<S>
where
    S: SessionStore + 'static,
{
    pub fn new(store: Arc<S>, config: &SessionConfig) -> Self {
        Self {
            store,
            tracker: ActivityTracker::new(config),
            cookie_name: config.cookie_name.clone(),
        }
    }

    pub fn tracker(&self) -> &ActivityTracker {
        &self.tracker
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Session key carried by the request's cookies, if present.
    pub fn session_key(&self, jar: &CookieJar) -> Option<SessionKey> {
        jar.get(&self.cookie_name)
            .map(|cookie| cookie.value_trimmed())
            .filter(|value| !value.is_empty())
            .map(|value| SessionKey(value.to_string()))
    }

    /// Opens a fresh authenticated session for a user the authentication layer has verified.
    pub fn open(&self, user_id: UserId, now: DateTime<Utc>) -> Result<SessionKey, SessionStoreError> {
        let key = SessionKey::generate();
        let mut data = SessionData::for_user(user_id);
        data.set(LAST_ACTIVITY_KEY, now.to_rfc3339());
        self.store.set(&key, data)?;
        Ok(key)
    }

    pub fn close(&self, key: &SessionKey) -> Result<(), SessionStoreError> {
        self.store.delete(key)
    }

    /// Runs the idle policy for one request, persisting the refreshed session or
    /// invalidating the expired one.
    pub fn touch(&self, key: &SessionKey, now: DateTime<Utc>) -> Touch {
        let mut session = match self.store.get(key) {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!(session = %key, "cookie refers to an unknown session");
                return Touch::Anonymous;
            }
            Err(err) => {
                warn!(session = %key, error = %err, "session lookup failed; treating request as anonymous");
                return Touch::Anonymous;
            }
        };

        let Some(user_id) = session.user_id.clone() else {
            return Touch::Anonymous;
        };

        match self.tracker.check(now, &mut session) {
            ActivityDecision::Continue => match self.store.update(key, session) {
                Ok(true) => Touch::Active(AuthenticatedUser {
                    user_id,
                    session: key.clone(),
                }),
                Ok(false) => {
                    debug!(session = %key, "session ended while the request was in flight");
                    Touch::Anonymous
                }
                Err(err) => {
                    warn!(session = %key, error = %err, "failed to record session activity");
                    Touch::Active(AuthenticatedUser {
                        user_id,
                        session: key.clone(),
                    })
                }
            },
            ActivityDecision::Terminate(target) => {
                if let Err(err) = self.store.delete(key) {
                    warn!(session = %key, error = %err, "failed to invalidate expired session");
                }
                info!(session = %key, user = %user_id.0, "session expired; forcing logout");
                Touch::Expired(target)
            }
        }
    }

    pub fn session_cookie(&self, key: &SessionKey) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), key.0.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
    }

    /// Removal cookie telling the browser to drop the session cookie.
    pub fn cleared_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.cookie_name.clone(), ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        cookie.make_removal();
        cookie
    }

    fn expired_response(&self, jar: CookieJar, target: &RedirectTarget) -> Response {
        (
            StatusCode::FOUND,
            [(header::LOCATION, target.as_str().to_string())],
            jar.add(self.cleared_cookie()),
        )
            .into_response()
    }
}

/// Outcome of [`SessionActivity::touch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Touch {
    Anonymous,
    Active(AuthenticatedUser),
    Expired(RedirectTarget),
}

/// Middleware enforcing the idle timeout and attaching [`AuthenticatedUser`].
pub async fn track_activity<S>(
    State(activity): State<Arc<SessionActivity<S>>>,
    mut request: Request,
    next: Next,
) -> Response
where
    S: SessionStore + 'static,
{
    let jar = CookieJar::from_headers(request.headers());
    let Some(key) = activity.session_key(&jar) else {
        return next.run(request).await;
    };

    match activity.touch(&key, Utc::now()) {
        Touch::Anonymous => {}
        Touch::Active(user) => {
            request.extensions_mut().insert(user);
        }
        Touch::Expired(target) => return activity.expired_response(jar, &target),
    }

    next.run(request).await
}

/// Wraps `router` with the idle-timeout middleware.
pub fn with_session_tracking<S>(router: Router, activity: Arc<SessionActivity<S>>) -> Router
where
    S: SessionStore + 'static,
{
    router.layer(middleware::from_fn_with_state(activity, track_activity::<S>))
}
