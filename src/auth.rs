//! Access tokens for the service.
//!
//! Key parsing, JWT signing and token refresh are left to `gcp_auth`; this
//! module only picks the token source from configuration and asks it for a
//! bearer token before each call.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};

use crate::config::AuthConfig;

/// Something that can hand out OAuth bearer tokens.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Tokens minted from a service-account key, limited to fixed scopes.
/// `gcp_auth` caches the token and refreshes it when it nears expiry.
pub struct ServiceAccountTokens {
    account: CustomServiceAccount,
    scopes: Vec<String>,
}

impl ServiceAccountTokens {
    pub fn from_key_file(path: &Path, scopes: &[String]) -> Result<Self> {
        let account = CustomServiceAccount::from_file(path).with_context(|| {
            format!("Failed to load service account key: {}", path.display())
        })?;
        Ok(Self {
            account,
            scopes: scopes.to_vec(),
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokens {
    async fn access_token(&self) -> Result<String> {
        let scopes: Vec<&str> = self.scopes.iter().map(String::as_str).collect();
        let token = self
            .account
            .token(&scopes)
            .await
            .context("Failed to obtain access token for service account")?;
        Ok(token.as_str().to_string())
    }
}

/// A pre-issued token, e.g. from `gcloud auth print-access-token`.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn from_env(var: &str) -> Result<Self> {
        let token = std::env::var(var)
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", var))?;
        if token.trim().is_empty() {
            bail!("{} environment variable is empty", var);
        }
        Ok(Self(token.trim().to_string()))
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Pick the token source described by `config`: the environment token when
/// `access_token_env` is set, the service-account key file otherwise.
pub fn token_source(config: &AuthConfig) -> Result<Arc<dyn TokenSource>> {
    match &config.access_token_env {
        Some(var) => Ok(Arc::new(StaticToken::from_env(var)?)),
        None => Ok(Arc::new(ServiceAccountTokens::from_key_file(
            &config.key_file,
            &config.scopes,
        )?)),
    }
}
