//! Document handle and the chunk-ingestion pipeline.
//!
//! Every ingestion call runs one pipeline: segment the input, build one
//! create request per passage, group the requests into batches of at most
//! [`MAX_BATCH_REQUESTS`], and submit the batches one after another.
//!
//! Batches are never retried. If batch *n* fails, batches before it stay
//! committed on the service and the error says how many there were; calling
//! again starts from the beginning and may create duplicate chunks.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::chunk::{batch_count, plan_text, TextPlan, MAX_BATCH_REQUESTS};
use crate::client::ServiceClient;
use crate::corpus::Corpus;
use crate::metadata::{to_custom_metadata, Metadata};
use crate::models::{
    BatchCreateChunksRequest, Chunk, CreateChunkRequest, DocumentResource, ListChunksResponse,
    PageRequest,
};

/// What one ingestion call created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Chunk-creation requests built from the input.
    pub requests: usize,
    /// Remote calls made (one for a single chunk, one per batch otherwise).
    pub calls: usize,
    /// Every chunk the service reported as created, across all calls, in
    /// submission order.
    pub chunks: Vec<Chunk>,
}

/// One document, addressed by resource name.
#[derive(Clone)]
pub struct Document<'a> {
    name: String,
    corpus: &'a Corpus<'a>,
}

impl std::fmt::Debug for Document<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document").field("name", &self.name).finish()
    }
}

impl<'a> Document<'a> {
    pub(crate) fn new(name: String, corpus: &'a Corpus<'a>) -> Self {
        Self { name, corpus }
    }

    /// Resource name, e.g. `corpora/c/documents/d`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn corpus(&self) -> &'a Corpus<'a> {
        self.corpus
    }

    fn client(&self) -> &'a ServiceClient {
        self.corpus.client()
    }

    pub async fn fetch(&self) -> Result<DocumentResource> {
        self.client().retriever().get_document(&self.name).await
    }

    /// Current display name, read from the service on every call.
    pub async fn display_name(&self) -> Result<String> {
        Ok(self.fetch().await?.display_name.unwrap_or_default())
    }

    pub async fn list_chunks(&self) -> Result<ListChunksResponse> {
        self.list_chunks_page(&PageRequest::default()).await
    }

    pub async fn list_chunks_page(&self, page: &PageRequest) -> Result<ListChunksResponse> {
        self.client().retriever().list_chunks(&self.name, page).await
    }

    pub async fn delete_chunk(&self, resource_name: &str) -> Result<()> {
        self.client().retriever().delete_chunk(resource_name).await
    }

    /// Ingest arbitrary text.
    ///
    /// Under 200 chars it is one `create_chunk` call; otherwise it is cut
    /// into 400-char windows and submitted in batches of up to 100.
    pub async fn ingest_chunk(&self, text: &str) -> Result<IngestReport> {
        self.ingest_text(text, None).await
    }

    /// Like [`ingest_chunk`](Self::ingest_chunk), attaching `metadata` to
    /// every chunk created.
    pub async fn ingest_chunk_with_metadata(
        &self,
        text: &str,
        metadata: &Metadata,
    ) -> Result<IngestReport> {
        self.ingest_text(text, Some(metadata)).await
    }

    /// Fetch a web page and ingest the passages extracted from its HTML.
    pub async fn ingest_url(&self, url: &str) -> Result<IngestReport> {
        let html = self.client().web().fetch_page(url).await?;
        self.ingest_html(&html)
            .await
            .with_context(|| format!("Failed to ingest {}", url))
    }

    /// Ingest already-fetched HTML. Each extracted passage becomes one chunk
    /// as-is; passages are not split further.
    pub async fn ingest_html(&self, html: &str) -> Result<IngestReport> {
        let passages = self.client().html_chunker().chunk(html);
        if passages.is_empty() {
            warn!(document = %self.name, "no passages extracted from HTML");
        }
        self.submit_batches(passages.iter().map(String::as_str), None)
            .await
    }

    /// Ingest the plain-text body of a Wikipedia article, looked up by title
    /// or article URL, through the same path as [`ingest_chunk`](Self::ingest_chunk).
    pub async fn ingest_wikipedia(&self, title_or_url: &str) -> Result<IngestReport> {
        let article = self.client().web().fetch_article(title_or_url).await?;
        debug!(title = %article.title, chars = article.content.chars().count(), "fetched article");
        self.ingest_chunk(&article.content).await
    }

    async fn ingest_text(&self, text: &str, metadata: Option<&Metadata>) -> Result<IngestReport> {
        match plan_text(text) {
            TextPlan::Single(passage) => {
                let request = self.chunk_request(passage, metadata);
                let chunk = self.client().retriever().create_chunk(&request).await?;
                info!(document = %self.name, "ingested 1 chunk");
                Ok(IngestReport {
                    requests: 1,
                    calls: 1,
                    chunks: vec![chunk],
                })
            }
            TextPlan::Windows(windows) => self.submit_batches(windows, metadata).await,
        }
    }

    fn chunk_request(&self, passage: &str, metadata: Option<&Metadata>) -> CreateChunkRequest {
        let mut chunk = Chunk::from_text(passage);
        if let Some(metadata) = metadata {
            chunk.custom_metadata = to_custom_metadata(metadata);
        }
        CreateChunkRequest {
            parent: self.name.clone(),
            chunk,
        }
    }

    /// One request per passage, submitted in order in batches of at most
    /// [`MAX_BATCH_REQUESTS`].
    async fn submit_batches<'p>(
        &self,
        passages: impl IntoIterator<Item = &'p str>,
        metadata: Option<&Metadata>,
    ) -> Result<IngestReport> {
        let requests: Vec<CreateChunkRequest> = passages
            .into_iter()
            .map(|p| self.chunk_request(p, metadata))
            .collect();
        let total_batches = batch_count(requests.len());

        let mut report = IngestReport {
            requests: requests.len(),
            ..Default::default()
        };

        let mut pending = requests.into_iter();
        loop {
            let batch: Vec<CreateChunkRequest> = pending.by_ref().take(MAX_BATCH_REQUESTS).collect();
            if batch.is_empty() {
                break;
            }

            let batch_number = report.calls + 1;
            debug!(
                document = %self.name,
                batch = batch_number,
                of = total_batches,
                size = batch.len(),
                "submitting chunk batch"
            );

            let request = BatchCreateChunksRequest {
                parent: self.name.clone(),
                requests: batch,
            };
            let response = self
                .client()
                .retriever()
                .batch_create_chunks(&request)
                .await
                .with_context(|| {
                    format!(
                        "chunk batch {} of {} for {} failed; {} earlier batch(es) remain committed",
                        batch_number,
                        total_batches,
                        self.name,
                        batch_number - 1
                    )
                })?;

            report.calls += 1;
            report.chunks.extend(response.chunks);
        }

        info!(
            document = %self.name,
            requests = report.requests,
            batches = report.calls,
            "ingested chunks"
        );
        Ok(report)
    }
}
