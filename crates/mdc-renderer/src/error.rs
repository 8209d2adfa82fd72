//! Error types for document rendering.

use std::str::Utf8Error;

/// Error returned by a [`Highlighter`](crate::Highlighter).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HighlightError {
    /// The configured style is not known to the highlighter.
    #[error("unknown highlight style: {0}")]
    UnknownStyle(String),

    /// The highlighter failed while processing the code.
    #[error("highlighter failed: {0}")]
    Failed(String),
}

/// Error while converting a document.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Highlighting is configured but no highlighter was supplied.
    #[error("syntax highlighting is enabled but no highlighter is available")]
    HighlighterUnavailable,

    /// The highlighter failed on a code block.
    #[error("failed to highlight code block {index}: {source}")]
    Highlight {
        /// Zero-based index of the code block in the document.
        index: usize,
        /// Underlying highlighter error.
        #[source]
        source: HighlightError,
    },

    /// Source document is not valid UTF-8.
    #[error("document is not valid UTF-8")]
    Encoding(#[from] Utf8Error),
}
