//! # AQA Corpus CLI (`aqa`)
//!
//! Manage retrieval corpora, ingest text into them and ask grounded
//! questions from the command line.
//!
//! ## Usage
//!
//! ```bash
//! aqa --config ./config/aqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `aqa corpus create\|list\|get\|delete` | Corpus management |
//! | `aqa document create\|list\|delete` | Document management |
//! | `aqa chunk list\|delete` | Chunk management |
//! | `aqa ingest text\|file\|url\|wikipedia` | Ingest content into a document |
//! | `aqa answer <corpus> "<question>"` | Grounded answer from a corpus |
//! | `aqa permission create\|list\|delete` | Corpus sharing |
//! | `aqa completions <shell>` | Shell completion script |
//!
//! ## Examples
//!
//! ```bash
//! aqa corpus create "Physics notes"
//! aqa document create corpora/physics-notes-1a2b "Lecture 1" --meta course=PHY101
//! aqa ingest wikipedia corpora/physics-notes-1a2b/documents/lecture-1-9z8y "General relativity"
//! aqa answer corpora/physics-notes-1a2b "What bends light near the sun?" --style VERBOSE
//! ```

use std::io;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde::Serialize;

use aqa_corpus::config::{self, Config};
use aqa_corpus::logging::init_logging;
use aqa_corpus::metadata::{metadata_from_json, parse_pair, Metadata};
use aqa_corpus::models::{parent_name, Condition, MetadataFilter, PageRequest, Permission};
use aqa_corpus::{AnswerOptions, AnswerStyle, IngestReport, ServiceClient};

/// AQA Corpus CLI: manage semantic-retrieval corpora and ask grounded
/// questions.
///
/// Without `--config`, built-in defaults are used: the service-account key
/// is read from `programs/gemini/service_account_key.json`.
#[derive(Parser)]
#[command(name = "aqa", version, about = "Semantic-retrieval corpora and attributed question answering")]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, list, inspect and delete corpora.
    Corpus {
        #[command(subcommand)]
        action: CorpusAction,
    },

    /// Create, list and delete documents inside a corpus.
    Document {
        #[command(subcommand)]
        action: DocumentAction,
    },

    /// List and delete the chunks of a document.
    Chunk {
        #[command(subcommand)]
        action: ChunkAction,
    },

    /// Ingest content into a document.
    Ingest {
        #[command(subcommand)]
        source: IngestSource,
    },

    /// Answer a question from a corpus's contents.
    Answer {
        /// Corpus resource name (`corpora/...`).
        corpus: String,

        /// The question.
        query: String,

        /// Answer style: ABSTRACTIVE, EXTRACTIVE or VERBOSE. Sent as given.
        #[arg(long, default_value = "ABSTRACTIVE")]
        style: String,

        #[arg(long)]
        temperature: Option<f32>,

        /// Maximum number of chunks retrieved as grounding.
        #[arg(long)]
        max_chunks: Option<u32>,

        /// Only use chunks whose metadata matches, as `key=value`. Repeatable.
        #[arg(long = "filter", value_parser = parse_key_val)]
        filters: Vec<(String, String)>,

        /// Print the full response as JSON instead of the answer text.
        #[arg(long)]
        json: bool,
    },

    /// Share a corpus with users or groups.
    Permission {
        #[command(subcommand)]
        action: PermissionAction,
    },

    /// Print a shell completion script.
    Completions {
        shell: Shell,
    },
}

/// Page selection shared by list commands.
#[derive(clap::Args)]
struct PageArgs {
    #[arg(long)]
    page_size: Option<u32>,
    /// `nextPageToken` from a previous listing.
    #[arg(long)]
    page_token: Option<String>,
}

impl From<PageArgs> for PageRequest {
    fn from(args: PageArgs) -> Self {
        PageRequest {
            page_size: args.page_size,
            page_token: args.page_token,
        }
    }
}

#[derive(Subcommand)]
enum CorpusAction {
    /// Create a corpus and print its resource name.
    Create {
        display_name: String,
        /// Resource name to request (`corpora/my-corpus`); assigned by the service if omitted.
        #[arg(long)]
        name: Option<String>,
    },
    /// List corpora (one page).
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Print a corpus's display name.
    Get { name: String },
    /// Delete a corpus.
    Delete {
        name: String,
        /// Also delete every document and chunk in it.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum DocumentAction {
    /// Create a document and print its resource name.
    Create {
        /// Corpus resource name.
        corpus: String,
        display_name: String,
        #[arg(long)]
        name: Option<String>,
        /// Custom metadata as `key=value`. Repeatable.
        #[arg(long = "meta", value_parser = parse_key_val)]
        metadata: Vec<(String, String)>,
        /// Custom metadata as a JSON object of string values, merged
        /// under any `--meta` pairs.
        #[arg(long)]
        metadata_json: Option<String>,
    },
    /// List the documents of a corpus (one page).
    List {
        corpus: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Delete a document.
    Delete {
        /// Document resource name (`corpora/.../documents/...`).
        name: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ChunkAction {
    /// List the chunks of a document (one page).
    List {
        document: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Delete a chunk.
    Delete {
        /// Chunk resource name (`corpora/.../documents/.../chunks/...`).
        name: String,
    },
}

#[derive(Subcommand)]
enum IngestSource {
    /// Ingest text given on the command line.
    Text { document: String, text: String },
    /// Ingest the contents of a UTF-8 text file.
    File { document: String, path: PathBuf },
    /// Fetch a web page and ingest the passages of its HTML.
    Url { document: String, url: String },
    /// Ingest a Wikipedia article by title or URL.
    Wikipedia { document: String, title: String },
}

impl IngestSource {
    fn document(&self) -> &str {
        match self {
            IngestSource::Text { document, .. }
            | IngestSource::File { document, .. }
            | IngestSource::Url { document, .. }
            | IngestSource::Wikipedia { document, .. } => document,
        }
    }
}

#[derive(Subcommand)]
enum PermissionAction {
    /// Grant access to a corpus.
    Create {
        corpus: String,
        /// USER, GROUP or EVERYONE.
        #[arg(long)]
        grantee_type: String,
        /// Required unless the grantee type is EVERYONE.
        #[arg(long)]
        email: Option<String>,
        /// READER, WRITER or OWNER.
        #[arg(long, default_value = "READER")]
        role: String,
    },
    /// List the permissions of a corpus.
    List { corpus: String },
    /// Revoke a permission.
    Delete {
        /// Permission resource name (`corpora/.../permissions/...`).
        name: String,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    parse_pair(s).map_err(|e| e.to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report(report: &IngestReport) {
    println!("ingested");
    println!("  requests: {}", report.requests);
    println!("  calls: {}", report.calls);
    println!("  chunks created: {}", report.chunks.len());
    println!("ok");
}

/// The corpus a document or chunk belongs to.
fn corpus_of(name: &str) -> Result<&str> {
    let mut current = name;
    while let Some(parent) = parent_name(current) {
        current = parent;
    }
    if current == name || !current.starts_with("corpora/") {
        return Err(anyhow!("'{}' is not inside a corpus", name));
    }
    Ok(current)
}

fn load(cli_config: Option<&PathBuf>) -> Result<Config> {
    match cli_config {
        Some(path) => config::load_config(path),
        None => {
            let cfg = Config::default();
            config::validate_config(&cfg)?;
            Ok(cfg)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "aqa", &mut io::stdout());
        return Ok(());
    }

    let cfg = load(cli.config.as_ref())?;
    init_logging(&cfg.logging)?;
    let client = ServiceClient::from_config(&cfg)?;

    match cli.command {
        Commands::Corpus { action } => match action {
            CorpusAction::Create { display_name, name } => {
                let corpus = client.create_corpus(&display_name, name.as_deref()).await?;
                println!("{}", corpus.name());
            }
            CorpusAction::List { page } => {
                print_json(&client.list_corpora_page(&page.into()).await?)?;
            }
            CorpusAction::Get { name } => {
                println!("{}", client.get_corpus(&name).display_name().await?);
            }
            CorpusAction::Delete { name, force } => {
                if force {
                    client.delete_corpus_forced(&name).await?;
                } else {
                    client.delete_corpus(&name).await?;
                }
                println!("deleted {}", name);
            }
        },
        Commands::Document { action } => match action {
            DocumentAction::Create {
                corpus,
                display_name,
                name,
                metadata,
                metadata_json,
            } => {
                let mut merged = match metadata_json {
                    Some(raw) => {
                        let value: serde_json::Value = serde_json::from_str(&raw)
                            .context("--metadata-json is not valid JSON")?;
                        metadata_from_json(&value)?
                    }
                    None => Metadata::new(),
                };
                merged.extend(metadata);
                let metadata = merged;
                let corpus = client.get_corpus(&corpus);
                let document = corpus
                    .create_document(
                        &display_name,
                        name.as_deref(),
                        (!metadata.is_empty()).then_some(&metadata),
                    )
                    .await?;
                println!("{}", document.name());
            }
            DocumentAction::List { corpus, page } => {
                let corpus = client.get_corpus(&corpus);
                print_json(&corpus.list_documents_page(&page.into()).await?)?;
            }
            DocumentAction::Delete { name, force } => {
                let corpus = client.get_corpus(corpus_of(&name)?);
                if force {
                    corpus.delete_document_forced(&name).await?;
                } else {
                    corpus.delete_document(&name).await?;
                }
                println!("deleted {}", name);
            }
        },
        Commands::Chunk { action } => match action {
            ChunkAction::List { document, page } => {
                let corpus = client.get_corpus(corpus_of(&document)?);
                let document = corpus.get_document(&document);
                print_json(&document.list_chunks_page(&page.into()).await?)?;
            }
            ChunkAction::Delete { name } => {
                let document_name =
                    parent_name(&name).ok_or_else(|| anyhow!("'{}' is not a chunk name", name))?;
                let corpus = client.get_corpus(corpus_of(document_name)?);
                corpus.get_document(document_name).delete_chunk(&name).await?;
                println!("deleted {}", name);
            }
        },
        Commands::Ingest { source } => {
            let document_name = source.document();
            let corpus = client.get_corpus(corpus_of(document_name)?);
            let document = corpus.get_document(document_name);
            let report = match &source {
                IngestSource::Text { text, .. } => document.ingest_chunk(text).await?,
                IngestSource::File { path, .. } => {
                    let text = std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    document.ingest_chunk(&text).await?
                }
                IngestSource::Url { url, .. } => document.ingest_url(url).await?,
                IngestSource::Wikipedia { title, .. } => document.ingest_wikipedia(title).await?,
            };
            print_report(&report);
        }
        Commands::Answer {
            corpus,
            query,
            style,
            temperature,
            max_chunks,
            filters,
            json,
        } => {
            let corpus = client.get_corpus(&corpus);
            let options = AnswerOptions {
                style: AnswerStyle::new(style),
                temperature,
                max_chunks_count: max_chunks,
                minimum_relevance_score: None,
                metadata_filters: filters
                    .into_iter()
                    .map(|(key, value)| MetadataFilter {
                        key,
                        conditions: vec![Condition::equals(value)],
                    })
                    .collect(),
            };
            let response = corpus.generate_answer_with(&query, &options).await?;
            if json {
                print_json(&response)?;
            } else {
                println!("{}", response.answer_text());
                if let Some(p) = response.answerable_probability {
                    println!("\nanswerable probability: {:.2}", p);
                }
                for chunk in response.cited_chunks() {
                    println!("  cited: {}", chunk);
                }
            }
        }
        Commands::Permission { action } => match action {
            PermissionAction::Create {
                corpus,
                grantee_type,
                email,
                role,
            } => {
                let corpus = client.get_corpus(&corpus);
                let permission = Permission {
                    name: None,
                    grantee_type: grantee_type.parse()?,
                    email_address: email,
                    role: role.parse()?,
                };
                print_json(&corpus.create_permission(&permission).await?)?;
            }
            PermissionAction::List { corpus } => {
                print_json(&client.get_corpus(&corpus).list_permissions().await?)?;
            }
            PermissionAction::Delete { name } => {
                let corpus = client.get_corpus(corpus_of(&name)?);
                corpus.delete_permission(&name).await?;
                println!("deleted {}", name);
            }
        },
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_of() {
        assert_eq!(corpus_of("corpora/c/documents/d").unwrap(), "corpora/c");
        assert_eq!(corpus_of("corpora/c/documents/d/chunks/k").unwrap(), "corpora/c");
        assert_eq!(corpus_of("corpora/c/permissions/p").unwrap(), "corpora/c");
        assert!(corpus_of("corpora/c").is_err());
        assert!(corpus_of("models/aqa/x/y").is_err());
    }

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }
}
