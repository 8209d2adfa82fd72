//! Rendering of fenced code blocks into final markup.
//!
//! A block is either handed to a [`Highlighter`] (when highlighting is
//! configured) or escaped and wrapped with the configured templates. The
//! default templates produce the Confluence `code` macro:
//!
//! ```text
//! <ac:structured-macro ac:name="code">
//!   <ac:parameter ac:name="language">python</ac:parameter>
//!   <ac:plain-text-body><![CDATA[print("hi")]]></ac:plain-text-body>
//! </ac:structured-macro>
//! ```

use crate::error::{HighlightError, RenderError};
use crate::fence::FenceMatch;
use crate::template::Template;
use crate::util::escape_html;

/// Confluence code macro wrapper.
pub const CONFLUENCE_CODE_WRAP: &str = r#"<ac:structured-macro ac:name="code">{lang}<ac:plain-text-body><![CDATA[{code}]]></ac:plain-text-body></ac:structured-macro>"#;

/// Confluence code macro language parameter.
pub const CONFLUENCE_LANG_TAG: &str = r#"<ac:parameter ac:name="language">{lang}</ac:parameter>"#;

/// Plain HTML code wrapper.
pub const HTML_CODE_WRAP: &str = "<pre><code{lang}>{code}</code></pre>";

/// Plain HTML language attribute.
pub const HTML_LANG_TAG: &str = r#" class="{lang}""#;

/// Syntax highlighting options passed through to the [`Highlighter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSettings {
    /// Emit line numbers.
    pub line_numbers: bool,
    /// Let the highlighter guess the language when none is declared.
    pub guess_language: bool,
    /// CSS class of the wrapping element.
    pub css_class: String,
    /// Highlighter style (color scheme) name.
    pub style: String,
    /// Tokenize with the highlighting engine. When off, the highlighter
    /// emits classed markup for client-side highlighting.
    pub use_external: bool,
    /// Emit inline `style` attributes instead of CSS classes.
    pub inline_styles: bool,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            line_numbers: false,
            guess_language: true,
            css_class: "codehilite".to_owned(),
            style: "InspiredGitHub".to_owned(),
            use_external: true,
            inline_styles: false,
        }
    }
}

/// Settings for fenced code block rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedCodeConfig {
    /// HTML-escape code bodies when not highlighting.
    pub escape: bool,
    /// Wrapper around the (escaped) body. Holes: `{lang}`, `{code}`.
    pub code_wrap: Template,
    /// Language fragment inserted into `{lang}` of the wrapper. Hole: `{lang}`.
    pub lang_tag: Template,
    /// Syntax highlighting; `None` disables it.
    pub highlight: Option<HighlightSettings>,
}

impl FencedCodeConfig {
    /// Confluence code macro output. Bodies go into CDATA and are not escaped.
    #[must_use]
    pub fn confluence() -> Self {
        Self {
            escape: false,
            code_wrap: Template::parse(CONFLUENCE_CODE_WRAP.to_owned()),
            lang_tag: Template::parse(CONFLUENCE_LANG_TAG.to_owned()),
            highlight: None,
        }
    }

    /// Plain `<pre><code>` output with escaped bodies.
    #[must_use]
    pub fn html() -> Self {
        Self {
            escape: true,
            code_wrap: Template::parse(HTML_CODE_WRAP.to_owned()),
            lang_tag: Template::parse(HTML_LANG_TAG.to_owned()),
            highlight: None,
        }
    }

    /// Enable syntax highlighting with the given settings.
    #[must_use]
    pub fn with_highlight(mut self, settings: HighlightSettings) -> Self {
        self.highlight = Some(settings);
        self
    }
}

impl Default for FencedCodeConfig {
    fn default() -> Self {
        Self::confluence()
    }
}

/// Everything a [`Highlighter`] gets to know about one code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightRequest<'a> {
    /// Declared language, if any.
    pub language: Option<&'a str>,
    /// Whether to guess the language when `language` is `None`.
    pub guess_language: bool,
    /// Emit line numbers.
    pub line_numbers: bool,
    /// CSS class of the wrapping element.
    pub css_class: &'a str,
    /// Style (color scheme) name.
    pub style: &'a str,
    /// Tokenize with the highlighting engine.
    pub use_external: bool,
    /// Emit inline styles instead of classes.
    pub inline_styles: bool,
    /// Line numbers to emphasize (1-indexed).
    pub hl_lines: &'a [usize],
}

/// Syntax highlighting capability.
///
/// Implementations must return markup that is already safe to embed in the
/// output document: it is inserted without further escaping.
pub trait Highlighter: Send + Sync {
    /// Highlight `code` and return the rendered markup.
    fn highlight(&self, code: &str, request: &HighlightRequest<'_>)
    -> Result<String, HighlightError>;
}

/// Renders fenced code blocks according to a [`FencedCodeConfig`].
#[derive(Clone, Copy)]
pub struct CodeBlockRenderer<'a> {
    config: &'a FencedCodeConfig,
    highlighter: Option<&'a dyn Highlighter>,
}

impl<'a> CodeBlockRenderer<'a> {
    /// Create a renderer without a highlighter.
    #[must_use]
    pub fn new(config: &'a FencedCodeConfig) -> Self {
        Self {
            config,
            highlighter: None,
        }
    }

    /// Use `highlighter` when highlighting is configured.
    #[must_use]
    pub fn with_highlighter(mut self, highlighter: &'a dyn Highlighter) -> Self {
        self.highlighter = Some(highlighter);
        self
    }

    /// Render one block. `index` identifies the block in error reports.
    pub fn render(&self, block: &FenceMatch, index: usize) -> Result<String, RenderError> {
        if let Some(settings) = &self.config.highlight {
            let highlighter = self
                .highlighter
                .ok_or(RenderError::HighlighterUnavailable)?;
            let request = HighlightRequest {
                language: block.language.as_deref(),
                guess_language: settings.guess_language,
                line_numbers: settings.line_numbers,
                css_class: &settings.css_class,
                style: &settings.style,
                use_external: settings.use_external,
                inline_styles: settings.inline_styles,
                hl_lines: &block.hl_lines,
            };
            return highlighter
                .highlight(&block.code, &request)
                .map_err(|source| RenderError::Highlight { index, source });
        }

        let lang = block
            .language
            .as_deref()
            .map(|lang| self.config.lang_tag.render(lang, ""))
            .unwrap_or_default();

        let html = if self.config.escape {
            self.config.code_wrap.render(&lang, &escape_html(&block.code))
        } else {
            self.config.code_wrap.render(&lang, &block.code)
        };
        Ok(html)
    }
}
