//! Corpus handle: documents, answers and sharing for one corpus.

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::client::ServiceClient;
use crate::document::Document;
use crate::metadata::{to_custom_metadata, Metadata};
use crate::models::{
    AnswerStyle, Content, CorpusResource, DocumentResource, GenerateAnswerRequest,
    GenerateAnswerResponse, ListDocumentsResponse, ListPermissionsResponse, MetadataFilter,
    PageRequest, Permission, SemanticRetrieverConfig,
};

/// Knobs for [`Corpus::generate_answer_with`]. Unset fields are left to
/// the service's defaults.
#[derive(Debug, Clone, Default)]
pub struct AnswerOptions {
    pub style: AnswerStyle,
    pub temperature: Option<f32>,
    /// Upper bound on chunks retrieved as grounding.
    pub max_chunks_count: Option<u32>,
    pub minimum_relevance_score: Option<f32>,
    pub metadata_filters: Vec<MetadataFilter>,
}

/// One corpus, addressed by resource name. Becomes stale once the corpus
/// is deleted remotely.
#[derive(Clone)]
pub struct Corpus<'a> {
    name: String,
    client: &'a ServiceClient,
}

impl std::fmt::Debug for Corpus<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Corpus").field("name", &self.name).finish()
    }
}

impl<'a> Corpus<'a> {
    pub(crate) fn new(name: String, client: &'a ServiceClient) -> Self {
        Self { name, client }
    }

    /// Resource name, e.g. `corpora/physics-notes-1a2b`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &'a ServiceClient {
        self.client
    }

    /// Full remote resource.
    pub async fn fetch(&self) -> Result<CorpusResource> {
        self.client.retriever().get_corpus(&self.name).await
    }

    /// Current display name, read from the service on every call.
    pub async fn display_name(&self) -> Result<String> {
        Ok(self.fetch().await?.display_name.unwrap_or_default())
    }

    pub async fn list_documents(&self) -> Result<ListDocumentsResponse> {
        self.list_documents_page(&PageRequest::default()).await
    }

    pub async fn list_documents_page(&self, page: &PageRequest) -> Result<ListDocumentsResponse> {
        self.client.retriever().list_documents(&self.name, page).await
    }

    /// Create a document in this corpus. Each metadata pair becomes one
    /// string-valued custom-metadata entry.
    pub async fn create_document(
        &self,
        display_name: &str,
        resource_name: Option<&str>,
        metadata: Option<&Metadata>,
    ) -> Result<Document<'_>> {
        let request = DocumentResource {
            name: resource_name.map(str::to_string),
            display_name: Some(display_name.to_string()),
            custom_metadata: metadata.map(to_custom_metadata).unwrap_or_default(),
            ..Default::default()
        };
        let created = self
            .client
            .retriever()
            .create_document(&self.name, &request)
            .await?;
        let name = created
            .name
            .ok_or_else(|| anyhow!("service returned a document without a name"))?;
        debug!(document = %name, "created document");
        Ok(Document::new(name, self))
    }

    /// Handle for an existing document; no remote call is made.
    pub fn get_document(&self, resource_name: &str) -> Document<'_> {
        Document::new(resource_name.to_string(), self)
    }

    pub async fn delete_document(&self, resource_name: &str) -> Result<()> {
        self.client
            .retriever()
            .delete_document(resource_name, false)
            .await
    }

    /// Delete a document together with its chunks.
    pub async fn delete_document_forced(&self, resource_name: &str) -> Result<()> {
        self.client
            .retriever()
            .delete_document(resource_name, true)
            .await
    }

    /// Answer `query` from this corpus's chunks.
    pub async fn generate_answer(
        &self,
        query: &str,
        style: AnswerStyle,
    ) -> Result<GenerateAnswerResponse> {
        self.generate_answer_with(
            query,
            &AnswerOptions {
                style,
                ..Default::default()
            },
        )
        .await
    }

    pub async fn generate_answer_with(
        &self,
        query: &str,
        options: &AnswerOptions,
    ) -> Result<GenerateAnswerResponse> {
        let request = self.answer_request(query, options);
        debug!(corpus = %self.name, style = %options.style, "generating answer");
        self.client
            .generative()
            .generate_answer(self.client.answer_model(), &request)
            .await
    }

    fn answer_request(&self, query: &str, options: &AnswerOptions) -> GenerateAnswerRequest {
        let content = Content::text(query);
        GenerateAnswerRequest {
            contents: vec![content.clone()],
            semantic_retriever: SemanticRetrieverConfig {
                source: self.name.clone(),
                query: content,
                metadata_filters: options.metadata_filters.clone(),
                max_chunks_count: options.max_chunks_count,
                minimum_relevance_score: options.minimum_relevance_score,
            },
            answer_style: options.style.clone(),
            temperature: options.temperature,
        }
    }

    pub async fn create_permission(&self, permission: &Permission) -> Result<Permission> {
        self.client
            .permissions()
            .create_permission(&self.name, permission)
            .await
    }

    pub async fn list_permissions(&self) -> Result<ListPermissionsResponse> {
        self.client
            .permissions()
            .list_permissions(&self.name, &PageRequest::default())
            .await
    }

    pub async fn delete_permission(&self, resource_name: &str) -> Result<()> {
        self.client
            .permissions()
            .delete_permission(resource_name)
            .await
    }
}
