//! Markdown document renderer.
//!
//! Renders the preprocessed markdown (code blocks already replaced by stash
//! tokens) to XHTML with pulldown-cmark, then expands the tokens. Expansion
//! happens only after all markdown rendering is finished, so code is never
//! reinterpreted as markdown.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::stash::HtmlStash;

/// Text emitted in place of filtered raw HTML.
pub const HTML_REMOVED_TEXT: &str = "[HTML_REMOVED]";

/// How raw HTML in markdown source is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RawHtml {
    /// Replace each raw HTML element with [`HTML_REMOVED_TEXT`].
    #[default]
    Replace,
    /// Render raw HTML as escaped text.
    Escape,
    /// Pass raw HTML through unchanged.
    Keep,
}

/// Markdown syntax extensions enabled on top of `CommonMark`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Extensions {
    /// Tables, footnotes, definition lists and heading attributes.
    #[default]
    Extra,
    /// Plain `CommonMark`.
    CommonMark,
}

/// Options for rendering a whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Raw HTML handling.
    pub raw_html: RawHtml,
    /// Enabled markdown extensions.
    pub extensions: Extensions,
    /// Wrap the rendered body in an XHTML document shell.
    pub wrap: bool,
    /// Document title used by the shell.
    pub title: String,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            raw_html: RawHtml::default(),
            extensions: Extensions::default(),
            wrap: true,
            title: String::new(),
        }
    }
}

/// Renders preprocessed markdown to XHTML and expands stashed fragments.
///
/// # Example
///
/// ```
/// use mdc_renderer::{DocumentOptions, DocumentRenderer, HtmlStash};
///
/// let mut stash = HtmlStash::new();
/// let token = stash.store("<pre>kept</pre>".to_owned());
/// let lines = vec!["# Title".to_owned(), String::new(), token];
///
/// let html = DocumentRenderer::new(&DocumentOptions::default()).render(&lines, &stash);
/// assert_eq!(html, "<h1>Title</h1>\n<pre>kept</pre>\n");
/// ```
pub struct DocumentRenderer<'a> {
    options: &'a DocumentOptions,
}

impl<'a> DocumentRenderer<'a> {
    /// Create a renderer.
    #[must_use]
    pub fn new(options: &'a DocumentOptions) -> Self {
        Self { options }
    }

    /// Parser options for the configured extensions.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        match self.options.extensions {
            Extensions::Extra => {
                Options::ENABLE_TABLES
                    | Options::ENABLE_FOOTNOTES
                    | Options::ENABLE_DEFINITION_LIST
                    | Options::ENABLE_HEADING_ATTRIBUTES
            }
            Extensions::CommonMark => Options::empty(),
        }
    }

    /// Render preprocessed lines and expand stash tokens.
    #[must_use]
    pub fn render(&self, lines: &[String], stash: &HtmlStash) -> String {
        self.render_markdown(&lines.join("\n"), stash)
    }

    /// Render preprocessed markdown text and expand stash tokens.
    #[must_use]
    pub fn render_markdown(&self, markdown: &str, stash: &HtmlStash) -> String {
        let parser = Parser::new_ext(markdown, self.parser_options());
        let mut html = String::with_capacity(markdown.len() + markdown.len() / 2);

        match self.options.raw_html {
            RawHtml::Keep => pulldown_cmark::html::push_html(&mut html, parser),
            policy => {
                let mut filter = RawHtmlFilter::new(policy);
                let events = parser.filter_map(|event| filter.apply(event));
                pulldown_cmark::html::push_html(&mut html, events);
                if filter.filtered > 0 {
                    tracing::debug!(count = filter.filtered, ?policy, "Filtered raw HTML");
                }
            }
        }

        stash.expand_all(&html)
    }
}

/// Rewrites raw HTML events according to a [`RawHtml`] policy.
struct RawHtmlFilter {
    policy: RawHtml,
    in_block: bool,
    filtered: usize,
}

impl RawHtmlFilter {
    fn new(policy: RawHtml) -> Self {
        Self {
            policy,
            in_block: false,
            filtered: 0,
        }
    }

    fn apply<'e>(&mut self, event: Event<'e>) -> Option<Event<'e>> {
        match (self.policy, event) {
            (RawHtml::Keep, event) => Some(event),
            (policy, Event::Start(Tag::HtmlBlock)) => {
                self.in_block = true;
                self.filtered += 1;
                match policy {
                    RawHtml::Replace => Some(Event::Html(CowStr::Borrowed(
                        "<p>[HTML_REMOVED]</p>\n",
                    ))),
                    _ => Some(Event::Html(CowStr::Borrowed("<p>"))),
                }
            }
            (policy, Event::End(TagEnd::HtmlBlock)) => {
                self.in_block = false;
                match policy {
                    RawHtml::Replace => None,
                    _ => Some(Event::Html(CowStr::Borrowed("</p>\n"))),
                }
            }
            (RawHtml::Replace, Event::Html(_)) if self.in_block => None,
            (RawHtml::Escape, Event::Html(html)) if self.in_block => Some(Event::Text(html)),
            (RawHtml::Replace, Event::InlineHtml(_) | Event::Html(_)) => {
                self.filtered += 1;
                Some(Event::Text(CowStr::Borrowed(HTML_REMOVED_TEXT)))
            }
            (RawHtml::Escape, Event::InlineHtml(html) | Event::Html(html)) => {
                self.filtered += 1;
                Some(Event::Text(html))
            }
            (_, event) => Some(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(markdown: &str, raw_html: RawHtml) -> String {
        let options = DocumentOptions {
            raw_html,
            ..DocumentOptions::default()
        };
        DocumentRenderer::new(&options).render_markdown(markdown, &HtmlStash::new())
    }

    #[test]
    fn test_basic_markdown() {
        assert_eq!(
            render("# Hello\n\n**Bold** text", RawHtml::Keep),
            "<h1>Hello</h1>\n<p><strong>Bold</strong> text</p>\n"
        );
    }

    #[test]
    fn test_xhtml_void_elements() {
        let html = render("a  \nb\n\n---\n", RawHtml::Keep);
        assert!(html.contains("<br />"));
        assert!(html.contains("<hr />"));
    }

    #[test]
    fn test_tables_enabled_by_extra() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n", RawHtml::Keep);
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn test_commonmark_has_no_tables() {
        let options = DocumentOptions {
            extensions: Extensions::CommonMark,
            ..DocumentOptions::default()
        };
        let html = DocumentRenderer::new(&options)
            .render_markdown("| a | b |\n|---|---|\n", &HtmlStash::new());
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn test_footnotes_enabled_by_extra() {
        let html = render("Text[^1]\n\n[^1]: Note\n", RawHtml::Keep);
        assert!(html.contains("footnote"));
    }

    #[test]
    fn test_raw_html_replace_block() {
        let html = render("<div>\nhi\n</div>\n\ntext\n", RawHtml::Replace);
        assert_eq!(html, "<p>[HTML_REMOVED]</p>\n<p>text</p>\n");
    }

    #[test]
    fn test_raw_html_replace_inline() {
        let html = render("a <span>b</span> c\n", RawHtml::Replace);
        assert_eq!(html, "<p>a [HTML_REMOVED]b[HTML_REMOVED] c</p>\n");
    }

    #[test]
    fn test_raw_html_escape() {
        let html = render("a <b>c</b>\n", RawHtml::Escape);
        assert_eq!(html, "<p>a &lt;b&gt;c&lt;/b&gt;</p>\n");
    }

    #[test]
    fn test_raw_html_escape_block() {
        let html = render("<div>x</div>\n", RawHtml::Escape);
        assert_eq!(html, "<p>&lt;div&gt;x&lt;/div&gt;\n</p>\n");
    }

    #[test]
    fn test_raw_html_keep() {
        let html = render("<div>x</div>\n", RawHtml::Keep);
        assert_eq!(html, "<div>x</div>\n");
    }

    #[test]
    fn test_stash_token_paragraph_expanded() {
        let mut stash = HtmlStash::new();
        let token = stash.store("<ac:structured-macro ac:name=\"code\"/>".to_owned());
        let lines = vec![
            "Before".to_owned(),
            String::new(),
            token,
            String::new(),
            "After".to_owned(),
        ];

        let html = DocumentRenderer::new(&DocumentOptions::default()).render(&lines, &stash);
        assert_eq!(
            html,
            "<p>Before</p>\n<ac:structured-macro ac:name=\"code\"/>\n<p>After</p>\n"
        );
    }

    #[test]
    fn test_stashed_markup_not_filtered_as_raw_html() {
        let mut stash = HtmlStash::new();
        let token = stash.store("<pre>*not emphasis*</pre>".to_owned());

        let html = DocumentRenderer::new(&DocumentOptions::default()).render(&[token], &stash);
        assert_eq!(html, "<pre>*not emphasis*</pre>\n");
    }

    #[test]
    fn test_token_in_list_item() {
        let mut stash = HtmlStash::new();
        let token = stash.store("<pre>x</pre>".to_owned());
        let lines = vec![format!("- {token}")];

        let html = DocumentRenderer::new(&DocumentOptions::default()).render(&lines, &stash);
        assert_eq!(html, "<ul>\n<li><pre>x</pre></li>\n</ul>\n");
    }
}
