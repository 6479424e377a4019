//! Wikipedia article lookup helpers.
//!
//! Article bodies come from the MediaWiki `action=query` API with the
//! TextExtracts plain-text extract (`prop=extracts&explaintext=1`), following
//! redirects. This module resolves user input to a title and decodes the API
//! response; the HTTP call itself lives in [`crate::web`].

use anyhow::{anyhow, bail, Result};
use serde::Deserialize;

/// An article's plain-text body.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub content: String,
    pub page_id: Option<u64>,
}

/// Where to look an article up.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRef {
    pub title: String,
    /// `api.php` of the wiki named in an article URL; `None` for bare titles.
    pub api_endpoint: Option<String>,
}

/// Accept a bare title (`"Rust (programming language)"`) or an article URL
/// (`https://en.wikipedia.org/wiki/Rust_(programming_language)`).
pub fn resolve_title(title_or_url: &str) -> Result<ArticleRef> {
    let input = title_or_url.trim();
    if input.is_empty() {
        bail!("Wikipedia title must not be empty");
    }

    if !(input.starts_with("http://") || input.starts_with("https://")) {
        return Ok(ArticleRef {
            title: input.replace('_', " "),
            api_endpoint: None,
        });
    }

    let url = url::Url::parse(input).map_err(|e| anyhow!("invalid Wikipedia URL '{}': {}", input, e))?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("Wikipedia URL has no host: {}", input))?;
    if !(host == "wikipedia.org" || host.ends_with(".wikipedia.org")) {
        bail!("not a Wikipedia article URL: {}", input);
    }

    // Path segments arrive percent-encoded; `query_pairs` already decodes.
    let title = match url.path().strip_prefix("/wiki/") {
        Some(raw) if !raw.is_empty() => percent_decode(raw),
        _ => url
            .query_pairs()
            .find(|(k, _)| k == "title")
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| anyhow!("cannot find an article title in {}", input))?,
    };

    Ok(ArticleRef {
        title: title.replace('_', " "),
        api_endpoint: Some(format!("{}://{}/w/api.php", url.scheme(), host)),
    })
}

/// Query-string for fetching the full plain-text extract of `title`.
pub fn extract_query(title: &str) -> Vec<(&'static str, String)> {
    vec![
        ("action", "query".to_string()),
        ("format", "json".to_string()),
        ("formatversion", "2".to_string()),
        ("prop", "extracts".to_string()),
        ("explaintext", "1".to_string()),
        ("redirects", "1".to_string()),
        ("titles", title.to_string()),
    ]
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryBody>,
}

#[derive(Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Deserialize)]
struct Page {
    #[serde(default)]
    pageid: Option<u64>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    extract: Option<String>,
}

/// Decode an `extract_query` response (formatversion 2).
pub fn parse_extract_response(requested: &str, json: &serde_json::Value) -> Result<Article> {
    let response = QueryResponse::deserialize(json)
        .map_err(|e| anyhow!("Invalid Wikipedia response: {}", e))?;

    let page = response
        .query
        .and_then(|q| q.pages.into_iter().next())
        .ok_or_else(|| anyhow!("Invalid Wikipedia response: no pages for '{}'", requested))?;

    if page.missing || page.invalid {
        bail!("Wikipedia page not found: '{}'", requested);
    }

    let content = page.extract.unwrap_or_default();
    if content.trim().is_empty() {
        bail!("Wikipedia page '{}' has no text", page.title);
    }

    Ok(Article {
        title: page.title,
        content,
        page_id: page.pageid,
    })
}

fn percent_decode(s: &str) -> String {
    url::form_urlencoded::parse(format!("t={}", s.replace('+', "%2B").replace('&', "%26")).as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_title() {
        let r = resolve_title("  Ada_Lovelace ").unwrap();
        assert_eq!(r.title, "Ada Lovelace");
        assert_eq!(r.api_endpoint, None);
    }

    #[test]
    fn test_article_url() {
        let r = resolve_title("https://de.wikipedia.org/wiki/Rust_(Programmiersprache)").unwrap();
        assert_eq!(r.title, "Rust (Programmiersprache)");
        assert_eq!(r.api_endpoint.as_deref(), Some("https://de.wikipedia.org/w/api.php"));
    }

    #[test]
    fn test_percent_encoded_url() {
        let r = resolve_title("https://en.wikipedia.org/wiki/C%2B%2B").unwrap();
        assert_eq!(r.title, "C++");
        let r = resolve_title("https://fr.wikipedia.org/wiki/%C3%89cole_normale").unwrap();
        assert_eq!(r.title, "École normale");
    }

    #[test]
    fn test_index_php_url() {
        let r = resolve_title("https://en.wikipedia.org/w/index.php?title=Alan_Turing").unwrap();
        assert_eq!(r.title, "Alan Turing");
    }

    #[test]
    fn test_index_php_title_decoded_once() {
        // `%2525` is a literal `%25` in the title, i.e. the article "100%25".
        let r = resolve_title("https://en.wikipedia.org/w/index.php?title=100%2525").unwrap();
        assert_eq!(r.title, "100%25");
        let r = resolve_title("https://en.wikipedia.org/w/index.php?title=C%2B%2B").unwrap();
        assert_eq!(r.title, "C++");
    }

    #[test]
    fn test_rejects_non_wikipedia_host() {
        let err = resolve_title("https://example.com/wiki/Ada_Lovelace").unwrap_err();
        assert!(err.to_string().contains("not a Wikipedia article URL"));
        assert!(resolve_title("https://notwikipedia.org/wiki/Ada").is_err());
        assert!(resolve_title("https://wikipedia.org/wiki/Ada").is_ok());
    }

    #[test]
    fn test_rejects_empty_and_titleless() {
        assert!(resolve_title("   ").is_err());
        assert!(resolve_title("https://en.wikipedia.org/").is_err());
    }

    #[test]
    fn test_extract_query_has_title() {
        let q = extract_query("Ada Lovelace");
        assert!(q.contains(&("titles", "Ada Lovelace".to_string())));
        assert!(q.contains(&("explaintext", "1".to_string())));
    }

    #[test]
    fn test_parse_found() {
        let json = json!({
            "batchcomplete": true,
            "query": {
                "redirects": [{ "from": "Ada", "to": "Ada Lovelace" }],
                "pages": [{ "pageid": 974, "ns": 0, "title": "Ada Lovelace",
                            "extract": "Augusta Ada King, Countess of Lovelace..." }]
            }
        });
        let article = parse_extract_response("Ada", &json).unwrap();
        assert_eq!(article.title, "Ada Lovelace");
        assert_eq!(article.page_id, Some(974));
        assert!(article.content.starts_with("Augusta"));
    }

    #[test]
    fn test_parse_missing() {
        let json = json!({ "query": { "pages": [{ "ns": 0, "title": "Nope", "missing": true }] } });
        let err = parse_extract_response("Nope", &json).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_extract_response("x", &json!({ "error": {} })).is_err());
    }
}
