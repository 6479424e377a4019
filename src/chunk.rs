//! Fixed-window text splitting and batch planning for chunk ingestion.
//!
//! Lengths are counted in Unicode scalar values (`char`s), never bytes, so
//! windows always end on a character boundary and concatenating them gives
//! back the input exactly.
//!
//! Text shorter than [`SINGLE_CHUNK_LIMIT`] is sent as one chunk. Anything
//! longer is cut into [`WINDOW_CHARS`]-sized windows, and the resulting
//! requests are grouped into batches of at most [`MAX_BATCH_REQUESTS`].
//! The two size constants are independent: text of exactly 200 chars goes
//! through the windowed path and yields a single window.

/// Texts with fewer chars than this become a single create call.
pub const SINGLE_CHUNK_LIMIT: usize = 200;

/// Window size, in chars, for texts at or above [`SINGLE_CHUNK_LIMIT`].
pub const WINDOW_CHARS: usize = 400;

/// Most create requests the service accepts in one batch call.
pub const MAX_BATCH_REQUESTS: usize = 100;

/// How a piece of text will be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextPlan<'t> {
    /// One `create_chunk` call.
    Single(&'t str),
    /// One request per window, submitted through `batch_create_chunks`.
    Windows(Vec<&'t str>),
}

impl TextPlan<'_> {
    /// Number of chunk-creation requests this plan produces.
    pub fn request_count(&self) -> usize {
        match self {
            TextPlan::Single(_) => 1,
            TextPlan::Windows(windows) => windows.len(),
        }
    }

    /// Number of remote calls this plan produces.
    pub fn call_count(&self) -> usize {
        match self {
            TextPlan::Single(_) => 1,
            TextPlan::Windows(windows) => batch_count(windows.len()),
        }
    }
}

/// Decide how `text` is submitted.
pub fn plan_text(text: &str) -> TextPlan<'_> {
    if text.chars().count() < SINGLE_CHUNK_LIMIT {
        TextPlan::Single(text)
    } else {
        TextPlan::Windows(split_windows(text, WINDOW_CHARS))
    }
}

/// Split `text` into consecutive windows of `window_chars` chars each; the
/// last window may be shorter. Empty input yields no windows.
pub fn split_windows(text: &str, window_chars: usize) -> Vec<&str> {
    assert!(window_chars > 0, "window size must be positive");

    let mut windows = Vec::with_capacity(text.len() / window_chars + 1);
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == window_chars {
            windows.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        windows.push(&text[start..]);
    }

    windows
}

/// Number of batch calls needed for `requests` create requests.
pub fn batch_count(requests: usize) -> usize {
    requests.div_ceil(MAX_BATCH_REQUESTS)
}
