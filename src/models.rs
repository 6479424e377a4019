//! Wire types for the semantic retriever and answer-generation REST API.
//!
//! These mirror the JSON resources exchanged with the service (camelCase on
//! the wire). Output-only fields (`createTime`, `updateTime`, `state`) are
//! optional and skipped when serializing requests.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════
// Resources
// ═══════════════════════════════════════════════════════════════════════

/// A corpus resource (`corpora/{corpus}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusResource {
    /// Resource name. Assigned by the service when left empty on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

/// A document resource (`corpora/{corpus}/documents/{document}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_metadata: Vec<CustomMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

/// A chunk: the unit of text the service indexes and cites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub data: ChunkData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_metadata: Vec<CustomMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl Chunk {
    /// A new chunk carrying `text`, with no name and no metadata.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            data: ChunkData {
                string_value: text.into(),
            },
            ..Default::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.data.string_value
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkData {
    #[serde(default)]
    pub string_value: String,
}

/// User-supplied key/value attached to a document or chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomMetadata {
    pub key: String,
    #[serde(flatten)]
    pub value: MetadataValue,
}

impl CustomMetadata {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: MetadataValue::StringValue(value.into()),
        }
    }
}

/// The value half of a [`CustomMetadata`] entry. Exactly one is set on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetadataValue {
    StringValue(String),
    StringListValue(StringList),
    NumericValue(f64),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringList {
    #[serde(default)]
    pub values: Vec<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// Chunk requests
// ═══════════════════════════════════════════════════════════════════════

/// One chunk-creation request. Used both standalone and inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChunkRequest {
    /// The document that will own the chunk.
    pub parent: String,
    pub chunk: Chunk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCreateChunksRequest {
    /// Document the whole batch is written to. Every inner request names
    /// the same parent.
    #[serde(skip)]
    pub parent: String,
    pub requests: Vec<CreateChunkRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchCreateChunksResponse {
    #[serde(default)]
    pub chunks: Vec<Chunk>,
}

// ═══════════════════════════════════════════════════════════════════════
// Listing
// ═══════════════════════════════════════════════════════════════════════

/// Page selection for list calls. The default asks for the first page with
/// the service's default page size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest {
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
}

impl PageRequest {
    pub fn first(page_size: u32) -> Self {
        Self {
            page_size: Some(page_size),
            page_token: None,
        }
    }

    /// Query-string pairs understood by every `list` endpoint.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(size) = self.page_size {
            pairs.push(("pageSize", size.to_string()));
        }
        if let Some(token) = self.page_token.as_deref().filter(|t| !t.is_empty()) {
            pairs.push(("pageToken", token.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCorporaResponse {
    #[serde(default)]
    pub corpora: Vec<CorpusResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<DocumentResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListChunksResponse {
    #[serde(default)]
    pub chunks: Vec<Chunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// Answer generation
// ═══════════════════════════════════════════════════════════════════════

/// Answer style sent to the answer model.
///
/// The value is forwarded verbatim. Anything other than the three known
/// styles is rejected by the service, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerStyle(Cow<'static, str>);

impl AnswerStyle {
    pub const ABSTRACTIVE: AnswerStyle = AnswerStyle(Cow::Borrowed("ABSTRACTIVE"));
    pub const EXTRACTIVE: AnswerStyle = AnswerStyle(Cow::Borrowed("EXTRACTIVE"));
    pub const VERBOSE: AnswerStyle = AnswerStyle(Cow::Borrowed("VERBOSE"));

    pub fn new(style: impl Into<String>) -> Self {
        Self(Cow::Owned(style.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AnswerStyle {
    fn default() -> Self {
        Self::ABSTRACTIVE
    }
}

impl fmt::Display for AnswerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnswerStyle {
    fn from(style: &str) -> Self {
        Self::new(style)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Content {
    /// Single text part, no role.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part {
                text: Some(text.into()),
            }],
            role: None,
        }
    }

    /// All text parts joined in order.
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Restricts retrieval to chunks whose metadata matches all conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilter {
    pub key: String,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<f64>,
}

impl Condition {
    pub fn equals(value: impl Into<String>) -> Self {
        Self {
            operation: "EQUAL".to_string(),
            string_value: Some(value.into()),
            numeric_value: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticRetrieverConfig {
    /// Corpus or document resource name to retrieve from.
    pub source: String,
    pub query: Content,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata_filters: Vec<MetadataFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chunks_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_relevance_score: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAnswerRequest {
    pub contents: Vec<Content>,
    pub semantic_retriever: SemanticRetrieverConfig,
    pub answer_style: AnswerStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAnswerResponse {
    #[serde(default)]
    pub answer: Option<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answerable_probability: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_feedback: Option<serde_json::Value>,
}

impl GenerateAnswerResponse {
    /// The answer text, or an empty string when the model gave none.
    pub fn answer_text(&self) -> String {
        self.answer
            .as_ref()
            .and_then(|c| c.content.as_ref())
            .map(Content::joined_text)
            .unwrap_or_default()
    }

    /// Resource names of the chunks the answer is grounded on, in citation order.
    pub fn cited_chunks(&self) -> Vec<&str> {
        self.answer
            .iter()
            .flat_map(|c| c.grounding_attributions.iter())
            .filter_map(|a| a.source_id.as_ref())
            .filter_map(|s| s.semantic_retriever_chunk.as_ref())
            .map(|c| c.chunk.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grounding_attributions: Vec<GroundingAttribution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingAttribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<AttributionSourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionSourceId {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_retriever_chunk: Option<SemanticRetrieverChunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_passage: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticRetrieverChunk {
    pub source: String,
    pub chunk: String,
}

// ═══════════════════════════════════════════════════════════════════════
// Permissions
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GranteeType {
    User,
    Group,
    Everyone,
    #[serde(other)]
    GranteeTypeUnspecified,
}

impl FromStr for GranteeType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "GROUP" => Ok(Self::Group),
            "EVERYONE" => Ok(Self::Everyone),
            other => bail!("unknown grantee type '{}'; expected USER, GROUP or EVERYONE", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Owner,
    Writer,
    Reader,
    #[serde(other)]
    RoleUnspecified,
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "OWNER" => Ok(Self::Owner),
            "WRITER" => Ok(Self::Writer),
            "READER" => Ok(Self::Reader),
            other => bail!("unknown role '{}'; expected OWNER, WRITER or READER", other),
        }
    }
}

/// Grants a user, group or everyone access to a corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub grantee_type: GranteeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPermissionsResponse {
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Name of the resource that owns `name`, e.g. the corpus of a document.
///
/// `corpora/c/documents/d` yields `corpora/c`; a top-level name yields `None`.
pub fn parent_name(name: &str) -> Option<&str> {
    let mut parts = name.rsplitn(3, '/');
    let _id = parts.next()?;
    let _collection = parts.next()?;
    parts.next().filter(|p| !p.is_empty())
}
