use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};

use crate::config::SessionConfig;
use crate::sessions::store::{SessionData, SessionKey, SessionStore, SessionStoreError, UserId};
use crate::sessions::LAST_ACTIVITY_KEY;

#[derive(Default)]
pub(super) struct MemorySessionStore {
    pub(super) sessions: Mutex<HashMap<SessionKey, SessionData>>,
    pub(super) writes: Mutex<u32>,
}

impl MemorySessionStore {
    pub(super) fn insert(&self, key: &str, data: SessionData) -> SessionKey {
        let key = SessionKey(key.to_string());
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .insert(key.clone(), data);
        key
    }

    pub(super) fn snapshot(&self, key: &SessionKey) -> Option<SessionData> {
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .get(key)
            .cloned()
    }

    pub(super) fn write_count(&self) -> u32 {
        *self.writes.lock().expect("counter mutex poisoned")
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &SessionKey) -> Result<Option<SessionData>, SessionStoreError> {
        Ok(self.snapshot(key))
    }

    fn set(&self, key: &SessionKey, data: SessionData) -> Result<(), SessionStoreError> {
        *self.writes.lock().expect("counter mutex poisoned") += 1;
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .insert(key.clone(), data);
        Ok(())
    }

    fn update(&self, key: &SessionKey, data: SessionData) -> Result<bool, SessionStoreError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        match guard.get_mut(key) {
            Some(slot) => {
                *self.writes.lock().expect("counter mutex poisoned") += 1;
                *slot = data;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, key: &SessionKey) -> Result<(), SessionStoreError> {
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .remove(key);
        Ok(())
    }
}

/// Store whose reads race with a logout: the session is deleted right after it is read.
#[derive(Default)]
pub(super) struct LogoutRaceStore {
    pub(super) inner: MemorySessionStore,
}

impl SessionStore for LogoutRaceStore {
    fn get(&self, key: &SessionKey) -> Result<Option<SessionData>, SessionStoreError> {
        let session = self.inner.get(key)?;
        self.inner.delete(key)?;
        Ok(session)
    }

    fn set(&self, key: &SessionKey, data: SessionData) -> Result<(), SessionStoreError> {
        self.inner.set(key, data)
    }

    fn update(&self, key: &SessionKey, data: SessionData) -> Result<bool, SessionStoreError> {
        self.inner.update(key, data)
    }

    fn delete(&self, key: &SessionKey) -> Result<(), SessionStoreError> {
        self.inner.delete(key)
    }
}

pub(super) struct UnavailableSessionStore;

impl SessionStore for UnavailableSessionStore {
    fn get(&self, _key: &SessionKey) -> Result<Option<SessionData>, SessionStoreError> {
        Err(SessionStoreError::Unavailable("cache offline".to_string()))
    }

    fn set(&self, _key: &SessionKey, _data: SessionData) -> Result<(), SessionStoreError> {
        Err(SessionStoreError::Unavailable("cache offline".to_string()))
    }

    fn update(&self, _key: &SessionKey, _data: SessionData) -> Result<bool, SessionStoreError> {
        Err(SessionStoreError::Unavailable("cache offline".to_string()))
    }

    fn delete(&self, _key: &SessionKey) -> Result<(), SessionStoreError> {
        Err(SessionStoreError::Unavailable("cache offline".to_string()))
    }
}

pub(super) fn hour_timeout() -> SessionConfig {
    SessionConfig::new(3600, "/accounts/login/", "sessionid").expect("valid session config")
}

pub(super) fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0)
        .single()
        .expect("valid instant")
}

/// Authenticated session whose last activity was `idle_seconds` before `now`.
pub(super) fn idle_session(user: &str, now: DateTime<Utc>, idle_seconds: i64) -> SessionData {
    let mut data = SessionData::for_user(UserId(user.to_string()));
    let last = now - chrono::TimeDelta::seconds(idle_seconds);
    data.set(LAST_ACTIVITY_KEY, last.to_rfc3339());
    data
}
