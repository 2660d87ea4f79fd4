//! In-memory session store, for tests and ephemeral use

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{Session, SessionKey};
use crate::ports::SessionStore;

/// Session store that forgets everything when dropped
#[derive(Default)]
pub struct MemorySessionStore {
    values: RwLock<HashMap<SessionKey, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing session
    pub fn with_session(session: &Session) -> Self {
        let store = Self::new();
        store.write_session(session);
        store
    }

    fn write(&self, key: SessionKey, value: Option<&str>) {
        let mut values = match self.values.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match value {
            Some(v) => {
                values.insert(key, v.to_string());
            }
            None => {
                values.remove(&key);
            }
        }
    }

    fn write_session(&self, session: &Session) {
        let (token, user_type) = session.to_parts();
        let mut values = match self.values.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        values.clear();
        if let Some(token) = token {
            values.insert(SessionKey::AccessToken, token.to_string());
        }
        if let Some(user_type) = user_type {
            values.insert(SessionKey::UserType, user_type.as_str().to_string());
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: SessionKey) -> Option<String> {
        let values = match self.values.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        values.get(&key).cloned()
    }

    async fn set(&self, key: SessionKey, value: Option<&str>) -> Result<()> {
        self.write(key, value);
        Ok(())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.write_session(session);
        Ok(())
    }
}
