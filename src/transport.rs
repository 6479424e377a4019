//! HTTPS/JSON transport for the Generative Language REST API.
//!
//! [`RestTransport`] implements [`RetrieverService`], [`GenerativeService`]
//! and [`PermissionService`] by mapping each method to one REST call under
//! `{endpoint}/{api_version}/`:
//!
//! | Method | HTTP |
//! |--------|------|
//! | create corpus | `POST corpora` |
//! | list corpora | `GET corpora` |
//! | get / delete corpus | `GET` / `DELETE {corpus}` |
//! | create / list documents | `POST` / `GET {corpus}/documents` |
//! | get / delete document | `GET` / `DELETE {document}` |
//! | create / list chunks | `POST` / `GET {document}/chunks` |
//! | batch create chunks | `POST {document}/chunks:batchCreate` |
//! | delete chunk | `DELETE {chunk}` |
//! | generate answer | `POST {model}:generateAnswer` |
//! | create / list permissions | `POST` / `GET {corpus}/permissions` |
//! | delete permission | `DELETE {permission}` |
//!
//! Every request carries a bearer token from the configured
//! [`TokenSource`]. There is no retry: a non-2xx response becomes an
//! [`ApiError`] and is returned as-is.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::TokenSource;
use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::models::{
    BatchCreateChunksRequest, BatchCreateChunksResponse, Chunk, CorpusResource,
    CreateChunkRequest, DocumentResource, GenerateAnswerRequest, GenerateAnswerResponse,
    ListChunksResponse, ListCorporaResponse, ListDocumentsResponse, ListPermissionsResponse,
    PageRequest, Permission,
};
use crate::services::{GenerativeService, PermissionService, RetrieverService};

/// Body of a successful delete.
#[derive(Deserialize)]
struct Empty {}

/// Body sent with no payload.
#[derive(Serialize)]
struct NoBody;

pub struct RestTransport {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl RestTransport {
    pub fn new(config: &ServiceConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url(&config.endpoint, &config.api_version),
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issue one call and decode the JSON response.
    async fn call<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = self.tokens.access_token().await?;
        let url = self.url(path);
        debug!(%method, %url, "remote call");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(token)
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("{} {} failed to send", method, url))?;
        let status = response.status();

        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            debug!(%method, %url, status = status.as_u16(), "remote call rejected");
            return Err(ApiError::from_response(status.as_u16(), &body_text).into());
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("{} {} returned an unreadable body", method, url))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        self.call::<NoBody, T>(Method::GET, path, query, None).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(Method::POST, path, &[], Some(body)).await
    }

    async fn delete(&self, path: &str, query: &[(&str, String)]) -> Result<()> {
        let _: Empty = self
            .call::<NoBody, Empty>(Method::DELETE, path, query, None)
            .await?;
        Ok(())
    }
}

/// `https://host` + `v1beta` → `https://host/v1beta`.
fn base_url(endpoint: &str, api_version: &str) -> String {
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        api_version.trim_matches('/')
    )
}

fn force_query(force: bool) -> Vec<(&'static str, String)> {
    if force {
        vec![("force", "true".to_string())]
    } else {
        Vec::new()
    }
}

#[async_trait]
impl RetrieverService for RestTransport {
    async fn create_corpus(&self, corpus: &CorpusResource) -> Result<CorpusResource> {
        self.post("corpora", corpus).await
    }

    async fn list_corpora(&self, page: &PageRequest) -> Result<ListCorporaResponse> {
        self.get("corpora", &page.query_pairs()).await
    }

    async fn get_corpus(&self, name: &str) -> Result<CorpusResource> {
        self.get(name, &[]).await
    }

    async fn delete_corpus(&self, name: &str, force: bool) -> Result<()> {
        self.delete(name, &force_query(force)).await
    }

    async fn create_document(
        &self,
        parent: &str,
        document: &DocumentResource,
    ) -> Result<DocumentResource> {
        self.post(&format!("{}/documents", parent), document).await
    }

    async fn list_documents(
        &self,
        parent: &str,
        page: &PageRequest,
    ) -> Result<ListDocumentsResponse> {
        self.get(&format!("{}/documents", parent), &page.query_pairs())
            .await
    }

    async fn get_document(&self, name: &str) -> Result<DocumentResource> {
        self.get(name, &[]).await
    }

    async fn delete_document(&self, name: &str, force: bool) -> Result<()> {
        self.delete(name, &force_query(force)).await
    }

    async fn create_chunk(&self, request: &CreateChunkRequest) -> Result<Chunk> {
        self.post(&format!("{}/chunks", request.parent), &request.chunk)
            .await
    }

    async fn batch_create_chunks(
        &self,
        request: &BatchCreateChunksRequest,
    ) -> Result<BatchCreateChunksResponse> {
        self.post(&format!("{}/chunks:batchCreate", request.parent), request)
            .await
    }

    async fn list_chunks(&self, parent: &str, page: &PageRequest) -> Result<ListChunksResponse> {
        self.get(&format!("{}/chunks", parent), &page.query_pairs())
            .await
    }

    async fn delete_chunk(&self, name: &str) -> Result<()> {
        self.delete(name, &[]).await
    }
}

#[async_trait]
impl GenerativeService for RestTransport {
    async fn generate_answer(
        &self,
        model: &str,
        request: &GenerateAnswerRequest,
    ) -> Result<GenerateAnswerResponse> {
        self.post(&format!("{}:generateAnswer", model), request)
            .await
    }
}

#[async_trait]
impl PermissionService for RestTransport {
    async fn create_permission(
        &self,
        parent: &str,
        permission: &Permission,
    ) -> Result<Permission> {
        self.post(&format!("{}/permissions", parent), permission)
            .await
    }

    async fn list_permissions(
        &self,
        parent: &str,
        page: &PageRequest,
    ) -> Result<ListPermissionsResponse> {
        self.get(&format!("{}/permissions", parent), &page.query_pairs())
            .await
    }

    async fn delete_permission(&self, name: &str) -> Result<()> {
        self.delete(name, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;

    #[test]
    fn test_base_url_joins_cleanly() {
        assert_eq!(
            base_url("https://generativelanguage.googleapis.com/", "/v1beta/"),
            "https://generativelanguage.googleapis.com/v1beta"
        );
    }

    #[test]
    fn test_resource_paths() {
        let transport =
            RestTransport::new(&ServiceConfig::default(), Arc::new(StaticToken::new("t"))).unwrap();
        assert_eq!(
            transport.url("corpora/c/documents/d/chunks:batchCreate"),
            "https://generativelanguage.googleapis.com/v1beta/corpora/c/documents/d/chunks:batchCreate"
        );
        assert_eq!(
            transport.url("/models/aqa:generateAnswer"),
            "https://generativelanguage.googleapis.com/v1beta/models/aqa:generateAnswer"
        );
    }

    #[test]
    fn test_force_query() {
        assert!(force_query(false).is_empty());
        assert_eq!(force_query(true), vec![("force", "true".to_string())]);
    }
}
