//! Identity token sources

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::ports::IdentityProvider;

/// Environment variable holding a campus sign-in identity token
pub const IDENTITY_TOKEN_ENV: &str = "CAMPUSPAY_IDENTITY_TOKEN";

/// Reads the identity token from the environment on every call
#[derive(Debug, Clone)]
pub struct EnvIdentityProvider {
    var: String,
}

impl Default for EnvIdentityProvider {
    fn default() -> Self {
        Self {
            var: IDENTITY_TOKEN_ENV.to_string(),
        }
    }
}

impl EnvIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl IdentityProvider for EnvIdentityProvider {
    async fn identity_token(&self) -> Result<Option<String>> {
        Ok(std::env::var(&self.var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }
}

/// Always returns the same identity token
#[derive(Debug, Clone)]
pub struct StaticIdentityProvider {
    token: Option<String>,
}

impl StaticIdentityProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// A provider that never has a token
    pub fn none() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn identity_token(&self) -> Result<Option<String>> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_env_provider_reads_and_trims() {
        let var = "CAMPUSPAY_TEST_IDENTITY_TOKEN_READ";
        std::env::set_var(var, "  id-token \n");
        let provider = EnvIdentityProvider::with_var(var);
        assert_eq!(
            provider.identity_token().await.unwrap().as_deref(),
            Some("id-token")
        );
        std::env::remove_var(var);
    }

    #[tokio::test]
    async fn test_env_provider_missing_or_blank_is_none() {
        let var = "CAMPUSPAY_TEST_IDENTITY_TOKEN_BLANK";
        std::env::remove_var(var);
        let provider = EnvIdentityProvider::with_var(var);
        assert!(provider.identity_token().await.unwrap().is_none());

        std::env::set_var(var, "   ");
        assert!(provider.identity_token().await.unwrap().is_none());
        std::env::remove_var(var);
    }

    #[tokio::test]
    async fn test_static_provider() {
        assert_eq!(
            StaticIdentityProvider::new("x")
                .identity_token()
                .await
                .unwrap()
                .as_deref(),
            Some("x")
        );
        assert!(StaticIdentityProvider::none()
            .identity_token()
            .await
            .unwrap()
            .is_none());
    }
}
