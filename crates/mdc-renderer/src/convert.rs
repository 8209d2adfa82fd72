//! Markdown to XHTML conversion.
//!
//! [`Converter`] ties the pipeline together: fenced code preprocessing,
//! markdown rendering with stash expansion, and the optional document shell.

use std::sync::Arc;

use crate::code_block::{FencedCodeConfig, Highlighter};
use crate::document::wrap_xhtml;
use crate::error::RenderError;
use crate::preprocessor::FencedBlockPreprocessor;
use crate::renderer::{DocumentOptions, DocumentRenderer};

/// Converts markdown documents to XHTML.
///
/// A converter is immutable and can be shared between threads; each call
/// uses its own preprocessor and stash.
///
/// # Example
///
/// ```
/// use mdc_renderer::{Converter, DocumentOptions, FencedCodeConfig};
///
/// let options = DocumentOptions { wrap: false, ..DocumentOptions::default() };
/// let converter = Converter::new(FencedCodeConfig::confluence(), options);
/// let html = converter.convert("```sh\nls\n```").unwrap();
///
/// assert_eq!(
///     html,
///     "<ac:structured-macro ac:name=\"code\">\
///      <ac:parameter ac:name=\"language\">sh</ac:parameter>\
///      <ac:plain-text-body><![CDATA[ls\n]]></ac:plain-text-body>\
///      </ac:structured-macro>\n"
/// );
/// ```
#[derive(Clone)]
pub struct Converter {
    fenced_code: FencedCodeConfig,
    document: DocumentOptions,
    highlighter: Option<Arc<dyn Highlighter>>,
}

impl Converter {
    #[must_use]
    pub fn new(fenced_code: FencedCodeConfig, document: DocumentOptions) -> Self {
        Self {
            fenced_code,
            document,
            highlighter: None,
        }
    }

    /// Use `highlighter` for code blocks when highlighting is configured.
    #[must_use]
    pub fn with_highlighter(mut self, highlighter: Arc<dyn Highlighter>) -> Self {
        self.highlighter = Some(highlighter);
        self
    }

    #[must_use]
    pub fn fenced_code(&self) -> &FencedCodeConfig {
        &self.fenced_code
    }

    #[must_use]
    pub fn document(&self) -> &DocumentOptions {
        &self.document
    }

    /// Convert a markdown document using the configured title.
    pub fn convert(&self, markdown: &str) -> Result<String, RenderError> {
        self.convert_with_title(markdown, &self.document.title)
    }

    /// Convert a markdown document, using `title` for the document shell.
    pub fn convert_with_title(&self, markdown: &str, title: &str) -> Result<String, RenderError> {
        let mut preprocessor = FencedBlockPreprocessor::new(&self.fenced_code);
        if let Some(highlighter) = &self.highlighter {
            preprocessor = preprocessor.with_highlighter(highlighter.as_ref());
        }

        let lines = preprocessor.run(markdown)?;
        let stash = preprocessor.into_stash();
        let body = DocumentRenderer::new(&self.document).render(&lines, &stash);

        tracing::debug!(
            blocks = stash.len(),
            input_bytes = markdown.len(),
            output_bytes = body.len(),
            "Converted document"
        );

        if self.document.wrap {
            Ok(wrap_xhtml(title, &body))
        } else {
            Ok(body)
        }
    }

    /// Decode `bytes` as UTF-8 and convert them.
    ///
    /// Invalid UTF-8 is rejected before any scanning happens.
    pub fn convert_bytes(&self, bytes: &[u8]) -> Result<String, RenderError> {
        self.convert_bytes_with_title(bytes, &self.document.title)
    }

    /// Decode `bytes` as UTF-8 and convert them with the given title.
    pub fn convert_bytes_with_title(
        &self,
        bytes: &[u8],
        title: &str,
    ) -> Result<String, RenderError> {
        let markdown = std::str::from_utf8(bytes)?;
        self.convert_with_title(markdown, title)
    }
}
