//! Identity provider port
//!
//! The payment service exchanges an identity token (issued by the campus
//! sign-in provider) for its own access token. When an access token goes
//! stale, the client asks this port for a fresh identity token and logs in
//! again before retrying.

use async_trait::async_trait;

use crate::domain::result::Result;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// A current identity token, or `None` if the user must sign in again
    async fn identity_token(&self) -> Result<Option<String>>;
}
