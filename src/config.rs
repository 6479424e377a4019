use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub html: HtmlConfig,
    #[serde(default)]
    pub wikipedia: WikipediaConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Service-account JSON key.
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// When set, read a pre-issued OAuth access token from this environment
    /// variable instead of using the key file.
    #[serde(default)]
    pub access_token_env: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            key_file: default_key_file(),
            scopes: default_scopes(),
            access_token_env: None,
        }
    }
}

fn default_key_file() -> PathBuf {
    PathBuf::from("programs/gemini/service_account_key.json")
}
fn default_scopes() -> Vec<String> {
    vec![
        "https://www.googleapis.com/auth/cloud-platform".to_string(),
        "https://www.googleapis.com/auth/generative-language.retriever".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_answer_model")]
    pub answer_model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_version: default_api_version(),
            answer_model: default_answer_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_api_version() -> String {
    "v1beta".to_string()
}
fn default_answer_model() -> String {
    "models/aqa".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct HtmlConfig {
    #[serde(default = "default_max_words")]
    pub max_words_per_aggregate_passage: usize,
    #[serde(default = "default_greedy")]
    pub greedily_aggregate_sibling_nodes: bool,
    #[serde(default = "default_excluded_tags")]
    pub html_tags_to_exclude: Vec<String>,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            max_words_per_aggregate_passage: default_max_words(),
            greedily_aggregate_sibling_nodes: default_greedy(),
            html_tags_to_exclude: default_excluded_tags(),
        }
    }
}

fn default_max_words() -> usize {
    200
}
fn default_greedy() -> bool {
    true
}
fn default_excluded_tags() -> Vec<String> {
    vec![
        "noscript".to_string(),
        "script".to_string(),
        "style".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct WikipediaConfig {
    /// MediaWiki `api.php` used for bare titles. Article URLs use their own host.
    #[serde(default = "default_wikipedia_endpoint")]
    pub endpoint: String,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            endpoint: default_wikipedia_endpoint(),
        }
    }
}

fn default_wikipedia_endpoint() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Level for this crate and anything not listed below.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Level for the HTTP/TLS stack (reqwest, hyper, h2, rustls).
    #[serde(default = "default_http_log_level")]
    pub http_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            http_level: default_http_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
fn default_http_log_level() -> String {
    "error".to_string()
}

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<()> {
    // Validate auth
    if config.auth.scopes.is_empty() {
        bail!("auth.scopes must not be empty");
    }
    if let Some(var) = &config.auth.access_token_env {
        if var.trim().is_empty() {
            bail!("auth.access_token_env must name an environment variable");
        }
    }

    // Validate service
    url::Url::parse(&config.service.endpoint)
        .with_context(|| format!("service.endpoint is not a URL: '{}'", config.service.endpoint))?;
    if config.service.api_version.trim().is_empty() {
        bail!("service.api_version must not be empty");
    }
    if !config.service.answer_model.starts_with("models/") {
        bail!(
            "service.answer_model must be a model resource name (models/...), got '{}'",
            config.service.answer_model
        );
    }
    if config.service.timeout_secs == 0 {
        bail!("service.timeout_secs must be > 0");
    }

    // Validate html
    if config.html.max_words_per_aggregate_passage == 0 {
        bail!("html.max_words_per_aggregate_passage must be > 0");
    }

    url::Url::parse(&config.wikipedia.endpoint).with_context(|| {
        format!(
            "wikipedia.endpoint is not a URL: '{}'",
            config.wikipedia.endpoint
        )
    })?;

    // Validate logging
    for (field, level) in [
        ("logging.level", &config.logging.level),
        ("logging.http_level", &config.logging.http_level),
    ] {
        if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            bail!(
                "{} must be one of {}, got '{}'",
                field,
                LOG_LEVELS.join(", "),
                level
            );
        }
    }

    Ok(())
}
