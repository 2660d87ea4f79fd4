//! Session store port - secure storage of the current session

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{Session, SessionKey, UserType};

/// Durable, secret-grade storage for the two session keys
///
/// Only the payment client and the store's own adapters read or write these
/// keys. Implementations must make each `set` and `save` atomic and durable
/// before returning.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read one key. Never fails: unreadable storage reads as absent.
    async fn get(&self, key: SessionKey) -> Option<String>;

    /// Overwrite one key, `None` clears it
    async fn set(&self, key: SessionKey, value: Option<&str>) -> Result<()>;

    /// Write the whole session as a single record
    async fn save(&self, session: &Session) -> Result<()>;

    /// Read the whole session
    async fn load(&self) -> Session {
        let token = self.get(SessionKey::AccessToken).await;
        let user_type = self
            .get(SessionKey::UserType)
            .await
            .and_then(|raw| match raw.parse::<UserType>() {
                Ok(user_type) => Some(user_type),
                Err(e) => {
                    log::warn!("[SessionStore] Ignoring stored user type: {}", e);
                    None
                }
            });
        Session::from_parts(token, user_type)
    }
}
