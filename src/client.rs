//! Entry point: the authenticated service client.
//!
//! [`ServiceClient`] owns the remote service handles and hands out
//! [`Corpus`] handles that borrow it. Nothing is cached locally; every
//! read goes to the service.
//!
//! ```rust,no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use aqa_corpus::config::Config;
//! use aqa_corpus::{AnswerStyle, ServiceClient};
//!
//! let client = ServiceClient::from_config(&Config::default())?;
//! let corpus = client.create_corpus("Physics notes", None).await?;
//! let document = corpus.create_document("Lecture 1", None, None).await?;
//! document.ingest_chunk("Gravity is the curvature of spacetime.").await?;
//! let answer = corpus.generate_answer("What is gravity?", AnswerStyle::ABSTRACTIVE).await?;
//! println!("{}", answer.answer_text());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::auth::token_source;
use crate::config::{validate_config, Config};
use crate::corpus::Corpus;
use crate::html_chunker::HtmlChunker;
use crate::models::{CorpusResource, ListCorporaResponse, PageRequest};
use crate::services::{GenerativeService, PermissionService, RetrieverService};
use crate::transport::RestTransport;
use crate::web::{HttpWebSource, WebSource};

pub struct ServiceClient {
    generative: Arc<dyn GenerativeService>,
    retriever: Arc<dyn RetrieverService>,
    permissions: Arc<dyn PermissionService>,
    web: Arc<dyn WebSource>,
    answer_model: String,
    html_chunker: HtmlChunker,
}

impl ServiceClient {
    /// Build a client talking to the real service, authenticated as
    /// described by `config.auth`.
    pub fn from_config(config: &Config) -> Result<Self> {
        validate_config(config)?;

        let tokens = token_source(&config.auth)?;
        let transport = Arc::new(RestTransport::new(&config.service, tokens)?);
        let web = Arc::new(HttpWebSource::new(config)?);

        Ok(Self::with_services(transport.clone(), transport.clone(), transport, web)
            .with_answer_model(config.service.answer_model.clone())
            .with_html_chunker(HtmlChunker::from_config(&config.html)))
    }

    /// Build a client from explicit service implementations.
    pub fn with_services(
        generative: Arc<dyn GenerativeService>,
        retriever: Arc<dyn RetrieverService>,
        permissions: Arc<dyn PermissionService>,
        web: Arc<dyn WebSource>,
    ) -> Self {
        Self {
            generative,
            retriever,
            permissions,
            web,
            answer_model: "models/aqa".to_string(),
            html_chunker: HtmlChunker::default(),
        }
    }

    pub fn with_answer_model(mut self, model: impl Into<String>) -> Self {
        self.answer_model = model.into();
        self
    }

    pub fn with_html_chunker(mut self, chunker: HtmlChunker) -> Self {
        self.html_chunker = chunker;
        self
    }

    pub(crate) fn generative(&self) -> &dyn GenerativeService {
        self.generative.as_ref()
    }

    pub(crate) fn retriever(&self) -> &dyn RetrieverService {
        self.retriever.as_ref()
    }

    pub(crate) fn permissions(&self) -> &dyn PermissionService {
        self.permissions.as_ref()
    }

    pub(crate) fn web(&self) -> &dyn WebSource {
        self.web.as_ref()
    }

    pub(crate) fn answer_model(&self) -> &str {
        &self.answer_model
    }

    pub(crate) fn html_chunker(&self) -> &HtmlChunker {
        &self.html_chunker
    }

    /// Create a corpus. With `resource_name` unset the service picks the name.
    pub async fn create_corpus(
        &self,
        display_name: &str,
        resource_name: Option<&str>,
    ) -> Result<Corpus<'_>> {
        let request = CorpusResource {
            name: resource_name.map(str::to_string),
            display_name: Some(display_name.to_string()),
            ..Default::default()
        };
        let created = self.retriever.create_corpus(&request).await?;
        let name = created
            .name
            .ok_or_else(|| anyhow::anyhow!("service returned a corpus without a name"))?;
        debug!(corpus = %name, "created corpus");
        Ok(Corpus::new(name, self))
    }

    /// First page of corpora, as returned by the service.
    pub async fn list_corpora(&self) -> Result<ListCorporaResponse> {
        self.list_corpora_page(&PageRequest::default()).await
    }

    /// A specific page of corpora; pass the previous `next_page_token`.
    pub async fn list_corpora_page(&self, page: &PageRequest) -> Result<ListCorporaResponse> {
        self.retriever.list_corpora(page).await
    }

    /// Handle for an existing corpus. No remote call is made, so a wrong
    /// name only shows up on first use.
    pub fn get_corpus(&self, resource_name: &str) -> Corpus<'_> {
        Corpus::new(resource_name.to_string(), self)
    }

    /// Delete an empty corpus. Deleting a corpus that does not exist fails.
    pub async fn delete_corpus(&self, resource_name: &str) -> Result<()> {
        self.retriever.delete_corpus(resource_name, false).await
    }

    /// Delete a corpus together with all of its documents and chunks.
    pub async fn delete_corpus_forced(&self, resource_name: &str) -> Result<()> {
        self.retriever.delete_corpus(resource_name, true).await
    }
}
