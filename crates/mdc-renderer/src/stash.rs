//! Placeholder store for rendered markup fragments.
//!
//! Rendered code blocks are kept out of the markdown source while the rest
//! of the document is rendered. Each fragment is replaced by an opaque token
//! that the markdown renderer passes through as plain text; after rendering,
//! [`HtmlStash::expand_all`] swaps every token back for its fragment.
//!
//! Tokens are delimited by the STX (`U+0002`) and ETX (`U+0003`) control
//! characters. The preprocessor strips them from document text outside code
//! blocks, and fragments are never scanned for tokens, so a token can never
//! collide with document content.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Start-of-text marker opening a placeholder token.
pub(crate) const TOKEN_START: char = '\u{2}';
/// End-of-text marker closing a placeholder token.
pub(crate) const TOKEN_END: char = '\u{3}';

/// Matches a token alone in a paragraph, or a bare token.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<p>\x{2}mdcstash:(\d+)\x{3}</p>|\x{2}mdcstash:(\d+)\x{3}").unwrap()
});

/// Store of rendered fragments addressed by placeholder tokens.
///
/// Tokens are numbered in insertion order and are unique within one stash.
/// Use one stash per document.
///
/// # Example
///
/// ```
/// use mdc_renderer::HtmlStash;
///
/// let mut stash = HtmlStash::new();
/// let token = stash.store("<b>code</b>".to_owned());
///
/// assert_eq!(stash.expand(&token), Some("<b>code</b>"));
/// assert_eq!(stash.expand_all(&format!("<p>{token}</p>")), "<b>code</b>");
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HtmlStash {
    fragments: Vec<String>,
}

impl HtmlStash {
    /// Create an empty stash.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the token for a fragment index.
    #[must_use]
    pub fn placeholder(index: usize) -> String {
        format!("{TOKEN_START}mdcstash:{index}{TOKEN_END}")
    }

    /// Register a fragment and return its token.
    pub fn store(&mut self, fragment: String) -> String {
        let index = self.fragments.len();
        self.fragments.push(fragment);
        Self::placeholder(index)
    }

    /// Fragment stored at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fragments.get(index).map(String::as_str)
    }

    /// Fragment for a token produced by [`store`](Self::store).
    #[must_use]
    pub fn expand(&self, token: &str) -> Option<&str> {
        let index = token
            .strip_prefix(TOKEN_START)?
            .strip_suffix(TOKEN_END)?
            .strip_prefix("mdcstash:")?
            .parse()
            .ok()?;
        self.get(index)
    }

    /// Number of stored fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether the stash holds no fragments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// All fragments in insertion order.
    #[must_use]
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Replace every token in rendered output with its fragment.
    ///
    /// A token that makes up a whole paragraph (`<p>TOKEN</p>`) replaces the
    /// paragraph, since fragments are block-level markup. Fragments are
    /// inserted verbatim and never scanned for tokens. Tokens with no
    /// stored fragment are left as they are.
    #[must_use]
    pub fn expand_all(&self, html: &str) -> String {
        if self.is_empty() {
            return html.to_owned();
        }

        TOKEN_RE
            .replace_all(html, |caps: &Captures<'_>| {
                let index = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .and_then(|m| m.as_str().parse::<usize>().ok());
                match index.and_then(|i| self.get(i)) {
                    Some(fragment) => fragment.to_owned(),
                    None => caps[0].to_owned(),
                }
            })
            .into_owned()
    }
}
