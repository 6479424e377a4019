//! Remote service seams.
//!
//! The client talks to the service through three traits, one per remote
//! service: [`RetrieverService`] (corpora, documents, chunks),
//! [`GenerativeService`] (answer generation) and [`PermissionService`]
//! (corpus sharing). [`RestTransport`](crate::transport::RestTransport)
//! implements all three over HTTPS; tests substitute in-memory doubles.
//!
//! Implementations forward exactly one remote call per method and never
//! retry. Failures from the service are returned as
//! [`ApiError`](crate::error::ApiError) inside `anyhow::Error`.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    BatchCreateChunksRequest, BatchCreateChunksResponse, Chunk, CorpusResource,
    CreateChunkRequest, DocumentResource, GenerateAnswerRequest, GenerateAnswerResponse,
    ListChunksResponse, ListCorporaResponse, ListDocumentsResponse, ListPermissionsResponse,
    PageRequest, Permission,
};

/// Corpus, document and chunk management.
#[async_trait]
pub trait RetrieverService: Send + Sync {
    async fn create_corpus(&self, corpus: &CorpusResource) -> Result<CorpusResource>;

    async fn list_corpora(&self, page: &PageRequest) -> Result<ListCorporaResponse>;

    async fn get_corpus(&self, name: &str) -> Result<CorpusResource>;

    /// With `force`, documents and chunks inside the corpus are deleted too;
    /// without it the service refuses to delete a non-empty corpus.
    async fn delete_corpus(&self, name: &str, force: bool) -> Result<()>;

    async fn create_document(
        &self,
        parent: &str,
        document: &DocumentResource,
    ) -> Result<DocumentResource>;

    async fn list_documents(&self, parent: &str, page: &PageRequest)
        -> Result<ListDocumentsResponse>;

    async fn get_document(&self, name: &str) -> Result<DocumentResource>;

    async fn delete_document(&self, name: &str, force: bool) -> Result<()>;

    async fn create_chunk(&self, request: &CreateChunkRequest) -> Result<Chunk>;

    /// Create up to 100 chunks in one call. Callers enforce the cap.
    async fn batch_create_chunks(
        &self,
        request: &BatchCreateChunksRequest,
    ) -> Result<BatchCreateChunksResponse>;

    async fn list_chunks(&self, parent: &str, page: &PageRequest) -> Result<ListChunksResponse>;

    async fn delete_chunk(&self, name: &str) -> Result<()>;
}

/// Answer generation grounded on a corpus.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// `model` is a model resource name such as `models/aqa`.
    async fn generate_answer(
        &self,
        model: &str,
        request: &GenerateAnswerRequest,
    ) -> Result<GenerateAnswerResponse>;
}

/// Access grants on corpora.
#[async_trait]
pub trait PermissionService: Send + Sync {
    async fn create_permission(&self, parent: &str, permission: &Permission)
        -> Result<Permission>;

    async fn list_permissions(
        &self,
        parent: &str,
        page: &PageRequest,
    ) -> Result<ListPermissionsResponse>;

    async fn delete_permission(&self, name: &str) -> Result<()>;
}
