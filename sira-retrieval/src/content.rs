//! Main-content text extraction from downloaded pages.
//!
//! Picks the most specific content root (`article`, `main`,
//! `[role="main"]`, then `body`) and collects its text while skipping
//! anything inside boilerplate elements such as scripts, navigation and
//! footers.

use scraper::{ElementRef, Html, Node, Selector};

use crate::error::{Result, RetrievalError};
use crate::types::PageContent;

/// Default maximum characters kept from a page body.
pub const DEFAULT_MAX_CHARS: usize = 100_000;

/// Elements whose text never belongs to the main content.
const BOILERPLATE: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript", "svg", "iframe", "form",
    "template",
];

/// Content roots, most specific first.
const CONTENT_ROOTS: &[&str] = &["article", "main", "[role=\"main\"]", "body"];

/// Extract readable text from raw HTML.
///
/// # Errors
///
/// Returns [`RetrievalError::Parse`] if the page has no text outside
/// boilerplate elements.
pub fn extract_content(html: &str, url: &str) -> Result<PageContent> {
    extract_content_with_limit(html, url, DEFAULT_MAX_CHARS)
}

/// Same as [`extract_content`] with a custom character limit on the body.
///
/// # Errors
///
/// Returns [`RetrievalError::Parse`] if the page has no text outside
/// boilerplate elements.
pub fn extract_content_with_limit(html: &str, url: &str, max_chars: usize) -> Result<PageContent> {
    let document = Html::parse_document(html);

    let text = CONTENT_ROOTS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .filter_map(|selector| document.select(&selector).next())
        .map(visible_text)
        .find(|text| !text.is_empty())
        .ok_or_else(|| RetrievalError::Parse("no extractable content found".into()))?;

    let text = truncate_to_limit(&text, max_chars);
    let word_count = text.split_whitespace().count();

    Ok(PageContent {
        url: url.to_owned(),
        title: extract_title(&document),
        text,
        word_count,
    })
}

/// Whether an extracted page is long enough to be worth keeping.
///
/// A page qualifies only with strictly more than `min_words` words.
pub fn is_substantial(page: &PageContent, min_words: usize) -> bool {
    page.word_count > min_words
}

fn extract_title(document: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };
    document
        .select(&selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
        .unwrap_or_default()
}

/// Text of `root` outside boilerplate elements, whitespace collapsed.
fn visible_text(root: ElementRef<'_>) -> String {
    let mut pieces: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let in_boilerplate = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| BOILERPLATE.contains(&el.name()))
        });
        if !in_boilerplate {
            pieces.push(text);
        }
    }
    collapse_whitespace(&pieces.join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate at a char boundary no later than `max_chars` bytes.
fn truncate_to_limit(text: &str, max_chars: usize) -> String {
    if text.len() <= max_chars {
        return text.to_owned();
    }
    let mut end = max_chars;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].trim_end().to_owned()
}
