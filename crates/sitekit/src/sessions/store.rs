use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque session identifier carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the user a session is authenticated as.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Everything stored under one session key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl SessionData {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            values: BTreeMap::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn set(&mut self, field: &str, value: String) {
        self.values.insert(field.to_string(), value);
    }
}

/// Key-value session backend so the tracker can be exercised without a real store.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &SessionKey) -> Result<Option<SessionData>, SessionStoreError>;
    fn set(&self, key: &SessionKey, data: SessionData) -> Result<(), SessionStoreError>;
    /// Replaces an existing session only. Returns `false`, without writing, when the key is
    /// gone, so a session deleted by a concurrent logout or expiry is never recreated.
    fn update(&self, key: &SessionKey, data: SessionData) -> Result<bool, SessionStoreError>;
    fn delete(&self, key: &SessionKey) -> Result<(), SessionStoreError>;
}

/// Error enumeration for session backend failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}
