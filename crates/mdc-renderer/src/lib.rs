//! Markdown to Confluence XHTML conversion with fenced code block extraction.
//!
//! Fenced code blocks are pulled out of the markdown before it is rendered,
//! so code is never interpreted as markdown. Each block is rendered on its
//! own (escaped and wrapped in a template, or handed to a [`Highlighter`])
//! and stored in an [`HtmlStash`]; the document keeps a placeholder token in
//! its place. After the markdown is rendered the tokens are expanded back.
//!
//! # Architecture
//!
//! - [`find_fenced_block`]: locates the leftmost complete fenced block
//! - [`CodeBlockRenderer`]: renders one block from a [`FencedCodeConfig`]
//! - [`FencedBlockPreprocessor`]: the substitution pass over a document
//! - [`DocumentRenderer`]: markdown rendering with pulldown-cmark and stash
//!   expansion
//! - [`Converter`]: the whole pipeline, optionally wrapped with
//!   [`wrap_xhtml`]
//!
//! # Example
//!
//! ```
//! use mdc_renderer::{Converter, DocumentOptions, FencedCodeConfig};
//!
//! let options = DocumentOptions { wrap: false, ..DocumentOptions::default() };
//! let converter = Converter::new(FencedCodeConfig::html(), options);
//!
//! let html = converter.convert("Some *text*\n\n```rust\nlet a = 1 < 2;\n```\n").unwrap();
//! assert_eq!(
//!     html,
//!     "<p>Some <em>text</em></p>\n<pre><code class=\"rust\">let a = 1 &lt; 2;\n</code></pre>\n"
//! );
//! ```

mod code_block;
mod convert;
mod document;
mod error;
mod fence;
mod preprocessor;
mod renderer;
mod stash;
mod template;
mod util;

pub use code_block::{
    CONFLUENCE_CODE_WRAP, CONFLUENCE_LANG_TAG, CodeBlockRenderer, FencedCodeConfig,
    HTML_CODE_WRAP, HTML_LANG_TAG, HighlightRequest, HighlightSettings, Highlighter,
};
pub use convert::Converter;
pub use document::wrap_xhtml;
pub use error::{HighlightError, RenderError};
pub use fence::{FenceMarker, FenceMatch, find_fenced_block, parse_hl_lines};
pub use preprocessor::FencedBlockPreprocessor;
pub use renderer::{DocumentOptions, DocumentRenderer, Extensions, HTML_REMOVED_TEXT, RawHtml};
pub use stash::HtmlStash;
pub use template::{Template, TemplateError};
pub use util::escape_html;
