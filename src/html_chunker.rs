//! Structure-aware HTML passage extraction.
//!
//! Turns an HTML page into a list of plain-text passages, each at most
//! `max_words_per_aggregate_passage` words, following the document tree:
//!
//! 1. If a whole subtree fits within the word limit, its text is one passage.
//! 2. Otherwise each block-level child is processed on its own. Text and
//!    inline elements between block children form one text run, so markup
//!    such as `Hel<b>lo</b>` yields `Hello`.
//! 3. With greedy aggregation enabled, adjacent sibling passages are merged
//!    as long as the merged passage still fits.
//!
//! A single text run longer than the limit is cut into limit-sized word
//! windows. Elements named in `html_tags_to_exclude` and comments contribute
//! nothing. Whitespace inside passages is collapsed to single spaces.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Node, Selector};

use crate::config::HtmlConfig;

#[derive(Debug, Clone)]
pub struct HtmlChunker {
    max_words_per_aggregate_passage: usize,
    greedily_aggregate_sibling_nodes: bool,
    html_tags_to_exclude: HashSet<String>,
}

/// Elements that start a new line of text. Inline elements (`b`, `a`,
/// `span`, ...) are not listed: their text joins the surrounding run.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "caption", "dd", "details",
    "dialog", "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1",
    "h2", "h3", "h4", "h5", "h6", "header", "hr", "html", "li", "main", "nav", "ol", "p",
    "pre", "section", "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr",
    "ul",
];

fn is_block(element: ElementRef<'_>) -> bool {
    let name = element.value().name();
    BLOCK_TAGS.iter().any(|tag| name.eq_ignore_ascii_case(tag))
}

/// A passage under construction: its words, kept separate until emitted.
#[derive(Debug, Default)]
struct Passage {
    words: Vec<String>,
}

impl Passage {
    fn from_run(run: &str) -> Self {
        Self {
            words: run.split_whitespace().map(str::to_string).collect(),
        }
    }

    fn len(&self) -> usize {
        self.words.len()
    }

    fn into_text(self) -> String {
        self.words.join(" ")
    }
}

impl Default for HtmlChunker {
    fn default() -> Self {
        Self::from_config(&HtmlConfig::default())
    }
}

impl HtmlChunker {
    pub fn new(
        max_words_per_aggregate_passage: usize,
        greedily_aggregate_sibling_nodes: bool,
        html_tags_to_exclude: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            max_words_per_aggregate_passage: max_words_per_aggregate_passage.max(1),
            greedily_aggregate_sibling_nodes,
            html_tags_to_exclude: html_tags_to_exclude
                .into_iter()
                .map(|t| t.into().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &HtmlConfig) -> Self {
        Self::new(
            config.max_words_per_aggregate_passage,
            config.greedily_aggregate_sibling_nodes,
            config.html_tags_to_exclude.iter().cloned(),
        )
    }

    pub fn max_words(&self) -> usize {
        self.max_words_per_aggregate_passage
    }

    /// Extract passages from a full HTML document, in document order.
    pub fn chunk(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let root = match Selector::parse("body") {
            Ok(body) => document
                .select(&body)
                .next()
                .unwrap_or_else(|| document.root_element()),
            Err(_) => document.root_element(),
        };

        self.element_passages(root)
            .into_iter()
            .map(Passage::into_text)
            .collect()
    }

    fn is_excluded(&self, element: ElementRef<'_>) -> bool {
        self.html_tags_to_exclude
            .contains(&element.value().name().to_ascii_lowercase())
    }

    fn element_passages(&self, element: ElementRef<'_>) -> Vec<Passage> {
        if self.is_excluded(element) {
            return Vec::new();
        }

        let mut text = String::new();
        self.collect_text(element, &mut text);
        let whole = Passage::from_run(&text);
        if whole.words.is_empty() {
            return Vec::new();
        }
        if whole.len() <= self.max_words_per_aggregate_passage {
            return vec![whole];
        }

        // Text nodes and inline elements accumulate into one run; block
        // children end the run and are processed on their own.
        let mut children = Vec::new();
        let mut run = String::new();
        for child in element.children() {
            match child.value() {
                Node::Text(t) => run.push_str(t),
                Node::Element(_) => {
                    let Some(child_element) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if self.is_excluded(child_element) {
                        continue;
                    }
                    if is_block(child_element) {
                        self.flush_run(&mut run, &mut children);
                        children.extend(self.element_passages(child_element));
                    } else {
                        self.collect_text(child_element, &mut run);
                    }
                }
                _ => {}
            }
        }
        self.flush_run(&mut run, &mut children);

        if self.greedily_aggregate_sibling_nodes {
            self.aggregate(children)
        } else {
            children
        }
    }

    /// Cut the pending run into limit-sized word windows.
    fn flush_run(&self, run: &mut String, passages: &mut Vec<Passage>) {
        let words = Passage::from_run(run).words;
        run.clear();
        for window in words.chunks(self.max_words_per_aggregate_passage) {
            passages.push(Passage {
                words: window.to_vec(),
            });
        }
    }

    /// Merge neighbours left to right while the result stays within the limit.
    fn aggregate(&self, passages: Vec<Passage>) -> Vec<Passage> {
        let mut merged: Vec<Passage> = Vec::with_capacity(passages.len());
        for passage in passages {
            match merged.last_mut() {
                Some(last)
                    if last.len() + passage.len() <= self.max_words_per_aggregate_passage =>
                {
                    last.words.extend(passage.words);
                }
                _ => merged.push(passage),
            }
        }
        merged
    }

    /// Append the text of `element`'s subtree. Text nodes are concatenated
    /// as-is; block elements are padded with spaces so they never glue
    /// words together.
    fn collect_text(&self, element: ElementRef<'_>, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(t) => out.push_str(t),
                Node::Element(_) => {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        if self.is_excluded(child_element) {
                            continue;
                        }
                        let block = is_block(child_element);
                        if block {
                            out.push(' ');
                        }
                        self.collect_text(child_element, out);
                        if block {
                            out.push(' ');
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize, prefix: &str) -> String {
        (0..n)
            .map(|i| format!("{}{}", prefix, i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_small_page_single_passage() {
        let chunker = HtmlChunker::default();
        let html = "<html><head><title>T</title></head><body><h1>Title</h1><p>Hello   world.</p></body></html>";
        assert_eq!(chunker.chunk(html), vec!["Title Hello world."]);
    }

    #[test]
    fn test_excluded_tags_dropped() {
        let chunker = HtmlChunker::default();
        let html = r#"<body><script>var x = 1;</script><style>p { color: red }</style>
            <noscript>enable js</noscript><p>Visible text</p><!-- comment --></body>"#;
        assert_eq!(chunker.chunk(html), vec!["Visible text"]);
    }

    #[test]
    fn test_empty_page_no_passages() {
        let chunker = HtmlChunker::default();
        assert!(chunker.chunk("<html><body><script>x()</script></body></html>").is_empty());
        assert!(chunker.chunk("").is_empty());
    }

    #[test]
    fn test_splits_on_structure_when_too_long() {
        let chunker = HtmlChunker::new(10, false, ["script"]);
        let html = format!(
            "<body><p>{}</p><p>{}</p><p>{}</p></body>",
            words(6, "a"),
            words(6, "b"),
            words(3, "c")
        );
        let passages = chunker.chunk(&html);
        assert_eq!(passages, vec![words(6, "a"), words(6, "b"), words(3, "c")]);
    }

    #[test]
    fn test_greedy_merges_siblings() {
        let chunker = HtmlChunker::new(10, true, ["script"]);
        let html = format!(
            "<body><p>{}</p><p>{}</p><p>{}</p></body>",
            words(6, "a"),
            words(6, "b"),
            words(3, "c")
        );
        let passages = chunker.chunk(&html);
        assert_eq!(
            passages,
            vec![words(6, "a"), format!("{} {}", words(6, "b"), words(3, "c"))]
        );
    }

    #[test]
    fn test_passages_respect_word_limit() {
        let chunker = HtmlChunker::new(20, true, Vec::<String>::new());
        let mut html = String::from("<body><div>");
        for i in 0..15 {
            html.push_str(&format!(
                "<section><h2>Part {}</h2><p>{}</p></section>",
                i,
                words(7, "w")
            ));
        }
        html.push_str(&format!("<p>{}</p></div></body>", words(55, "long")));

        let passages = chunker.chunk(&html);
        assert!(passages.len() > 1);
        for passage in &passages {
            assert!(passage.split_whitespace().count() <= 20, "too long: {}", passage);
        }
        let total: usize = passages.iter().map(|p| p.split_whitespace().count()).sum();
        assert_eq!(total, 15 * 9 + 55);
    }

    #[test]
    fn test_inline_markup_does_not_split_words() {
        let chunker = HtmlChunker::default();
        assert_eq!(
            chunker.chunk("<p>Hel<b>lo</b> <a href=\"#\">world</a>.</p>"),
            vec!["Hello world."]
        );
        assert_eq!(
            chunker.chunk("<body><p>Hel<b>lo</b> wor<i>ld</i>, e.g.<br>x</p></body>"),
            vec!["Hello world, e.g. x"]
        );
    }

    #[test]
    fn test_block_elements_separate_words() {
        let chunker = HtmlChunker::default();
        assert_eq!(
            chunker.chunk("<div><h2>Intro</h2><p>First</p><ul><li>one</li><li>two</li></ul></div>"),
            vec!["Intro First one two"]
        );
    }

    #[test]
    fn test_inline_markup_kept_in_long_runs() {
        let chunker = HtmlChunker::new(10, false, ["script"]);
        let html = format!(
            "<body><div>{} see <a>he</a>re.<p>{}</p></div></body>",
            words(9, "a"),
            words(4, "b")
        );
        let passages = chunker.chunk(&html);
        assert_eq!(
            passages,
            vec![
                format!("{} see", words(9, "a")),
                "here.".to_string(),
                words(4, "b")
            ]
        );
    }

    #[test]
    fn test_config_defaults() {
        let chunker = HtmlChunker::from_config(&HtmlConfig::default());
        assert_eq!(chunker.max_words(), 200);
        assert!(chunker.html_tags_to_exclude.contains("noscript"));
    }
}
