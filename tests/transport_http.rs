//! REST transport and web fetching against a real local HTTP listener.
//!
//! Each test starts a one-shot server on a free port that captures the raw
//! request and answers with a canned response.

use std::sync::Arc;

use aqa_corpus::auth::StaticToken;
use aqa_corpus::config::{Config, ServiceConfig};
use aqa_corpus::models::{BatchCreateChunksRequest, Chunk, CreateChunkRequest, PageRequest};
use aqa_corpus::services::RetrieverService;
use aqa_corpus::transport::RestTransport;
use aqa_corpus::web::{HttpWebSource, WebSource};
use aqa_corpus::ApiError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

// ─── One-shot server ────────────────────────────────────────────────

/// What the client sent.
struct Captured {
    head: String,
    body: String,
}

impl Captured {
    fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    fn header(&self, name: &str) -> Option<String> {
        header_value(&self.head, name)
    }
}

fn header_value(head: &str, name: &str) -> Option<String> {
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}

/// Serve exactly one request with `status` and `reply`, then stop.
/// Returns the base URL and a handle resolving to the captured request.
async fn serve_once(
    status: &'static str,
    content_type: &'static str,
    reply: Vec<u8>,
) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut received = Vec::new();
        let mut buf = [0u8; 4096];
        let head_end = loop {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            received.extend_from_slice(&buf[..n]);
            if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&received[..head_end]).to_string();
        let content_length = header_value(&head, "content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        while received.len() < head_end + content_length {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }
        let body = String::from_utf8_lossy(&received[head_end..]).to_string();

        let mut response = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            content_type,
            reply.len()
        )
        .into_bytes();
        response.extend_from_slice(&reply);
        socket.write_all(&response).await.unwrap();
        socket.shutdown().await.unwrap();

        Captured { head, body }
    });

    (base_url, handle)
}

fn transport_for(base_url: &str) -> RestTransport {
    let config = ServiceConfig {
        endpoint: base_url.to_string(),
        timeout_secs: 5,
        ..Default::default()
    };
    RestTransport::new(&config, Arc::new(StaticToken::new("tok"))).unwrap()
}

const JSON: &str = "application/json";

// ─── RestTransport ──────────────────────────────────────────────────

#[tokio::test]
async fn test_forced_delete_request_and_empty_body() {
    let (base_url, server) = serve_once("200 OK", JSON, b"{}".to_vec()).await;
    let transport = transport_for(&base_url);

    transport.delete_corpus("corpora/x", true).await.unwrap();

    let sent = server.await.unwrap();
    assert_eq!(sent.request_line(), "DELETE /v1beta/corpora/x?force=true HTTP/1.1");
    assert_eq!(sent.header("authorization").as_deref(), Some("Bearer tok"));
}

#[tokio::test]
async fn test_error_envelope_becomes_api_error() {
    let envelope = br#"{"error":{"code":404,"message":"nope","status":"NOT_FOUND"}}"#;
    let (base_url, server) = serve_once("404 Not Found", JSON, envelope.to_vec()).await;
    let transport = transport_for(&base_url);

    let err = transport.get_corpus("corpora/x").await.unwrap_err();

    let api = err.downcast_ref::<ApiError>().expect("ApiError");
    assert_eq!(
        api,
        &ApiError {
            http_status: 404,
            status: Some("NOT_FOUND".to_string()),
            message: "nope".to_string(),
        }
    );
    assert!(api.is_not_found());
    let sent = server.await.unwrap();
    assert_eq!(sent.request_line(), "GET /v1beta/corpora/x HTTP/1.1");
}

#[tokio::test]
async fn test_non_json_error_body_kept_verbatim() {
    let (base_url, server) =
        serve_once("503 Service Unavailable", "text/plain", b"  upstream down \n".to_vec()).await;
    let transport = transport_for(&base_url);

    let err = transport
        .delete_chunk("corpora/c/documents/d/chunks/k")
        .await
        .unwrap_err();

    let api = err.downcast_ref::<ApiError>().expect("ApiError");
    assert_eq!(api.http_status, 503);
    assert_eq!(api.status, None);
    assert_eq!(api.message, "upstream down");
    server.await.unwrap();
}

#[tokio::test]
async fn test_list_page_query_string() {
    let reply = br#"{"documents":[{"name":"corpora/c/documents/d"}],"nextPageToken":"n2"}"#;
    let (base_url, server) = serve_once("200 OK", JSON, reply.to_vec()).await;
    let transport = transport_for(&base_url);

    let page = PageRequest {
        page_size: Some(5),
        page_token: Some("abc".to_string()),
    };
    let listing = transport.list_documents("corpora/c", &page).await.unwrap();

    assert_eq!(listing.documents.len(), 1);
    assert_eq!(listing.next_page_token.as_deref(), Some("n2"));
    let sent = server.await.unwrap();
    assert_eq!(
        sent.request_line(),
        "GET /v1beta/corpora/c/documents?pageSize=5&pageToken=abc HTTP/1.1"
    );
}

#[tokio::test]
async fn test_first_page_sends_only_page_size() {
    let (base_url, server) = serve_once("200 OK", JSON, b"{}".to_vec()).await;
    let transport = transport_for(&base_url);

    let listing = transport.list_corpora(&PageRequest::first(10)).await.unwrap();

    assert!(listing.corpora.is_empty());
    assert_eq!(listing.next_page_token, None);
    let sent = server.await.unwrap();
    assert_eq!(sent.request_line(), "GET /v1beta/corpora?pageSize=10 HTTP/1.1");
}

#[tokio::test]
async fn test_batch_create_posts_inner_requests() {
    let reply = br#"{"chunks":[{"name":"corpora/c/documents/d/chunks/k1","data":{"stringValue":"one"}}]}"#;
    let (base_url, server) = serve_once("200 OK", JSON, reply.to_vec()).await;
    let transport = transport_for(&base_url);

    let request = BatchCreateChunksRequest {
        parent: "corpora/c/documents/d".to_string(),
        requests: vec![CreateChunkRequest {
            parent: "corpora/c/documents/d".to_string(),
            chunk: Chunk::from_text("one"),
        }],
    };
    let response = transport.batch_create_chunks(&request).await.unwrap();

    assert_eq!(response.chunks.len(), 1);
    assert_eq!(response.chunks[0].text(), "one");
    let sent = server.await.unwrap();
    assert_eq!(
        sent.request_line(),
        "POST /v1beta/corpora/c/documents/d/chunks:batchCreate HTTP/1.1"
    );
    let body: serde_json::Value = serde_json::from_str(&sent.body).unwrap();
    assert!(body.get("parent").is_none());
    assert_eq!(body["requests"][0]["parent"], "corpora/c/documents/d");
    assert_eq!(body["requests"][0]["chunk"]["data"]["stringValue"], "one");
}

// ─── HttpWebSource ──────────────────────────────────────────────────

fn web_config(wikipedia_endpoint: &str) -> Config {
    let mut config = Config::default();
    config.service.timeout_secs = 5;
    config.wikipedia.endpoint = wikipedia_endpoint.to_string();
    config
}

#[tokio::test]
async fn test_fetch_page_returns_body() {
    let (base_url, server) =
        serve_once("200 OK", "text/html", b"<p>hello</p>".to_vec()).await;
    let web = HttpWebSource::new(&web_config("https://en.wikipedia.org/w/api.php")).unwrap();

    let html = web.fetch_page(&format!("{}/page", base_url)).await.unwrap();

    assert_eq!(html, "<p>hello</p>");
    let sent = server.await.unwrap();
    assert_eq!(sent.request_line(), "GET /page HTTP/1.1");
    assert!(sent.header("user-agent").unwrap().starts_with("aqa-corpus/"));
}

#[tokio::test]
async fn test_fetch_page_rejects_non_utf8() {
    let (base_url, server) = serve_once("200 OK", "text/html", vec![0x66, 0xff, 0xfe]).await;
    let web = HttpWebSource::new(&web_config("https://en.wikipedia.org/w/api.php")).unwrap();

    let err = web.fetch_page(&format!("{}/bin", base_url)).await.unwrap_err();

    assert!(format!("{:#}", err).contains("not valid UTF-8"), "{:#}", err);
    server.await.unwrap();
}

#[tokio::test]
async fn test_fetch_page_http_status_error() {
    let (base_url, server) =
        serve_once("500 Internal Server Error", "text/plain", b"boom".to_vec()).await;
    let web = HttpWebSource::new(&web_config("https://en.wikipedia.org/w/api.php")).unwrap();

    let url = format!("{}/broken", base_url);
    let err = web.fetch_page(&url).await.unwrap_err();

    let message = format!("{:#}", err);
    assert!(message.contains(&format!("Failed to fetch {}", url)), "{}", message);
    assert!(message.contains("500"), "{}", message);
    server.await.unwrap();
}

#[tokio::test]
async fn test_fetch_article_queries_configured_endpoint() {
    let reply = br#"{"query":{"pages":[{"pageid":974,"title":"Ada Lovelace","extract":"Augusta Ada King."}]}}"#;
    let (base_url, server) = serve_once("200 OK", JSON, reply.to_vec()).await;
    let web = HttpWebSource::new(&web_config(&format!("{}/w/api.php", base_url))).unwrap();

    let article = web.fetch_article("Ada_Lovelace").await.unwrap();

    assert_eq!(article.title, "Ada Lovelace");
    assert_eq!(article.page_id, Some(974));
    assert_eq!(article.content, "Augusta Ada King.");
    let sent = server.await.unwrap();
    let line = sent.request_line();
    assert!(line.starts_with("GET /w/api.php?action=query&"), "{}", line);
    assert!(line.contains("prop=extracts"), "{}", line);
    assert!(line.contains("titles=Ada+Lovelace"), "{}", line);
}
