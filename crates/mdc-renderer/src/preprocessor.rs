//! Fenced code block preprocessor.
//!
//! Replaces every fenced code block in a markdown document with a
//! placeholder token before the document is handed to the markdown renderer,
//! so code is never interpreted as markdown. The rendered blocks are kept in
//! an [`HtmlStash`] and put back after rendering.

use crate::code_block::{CodeBlockRenderer, FencedCodeConfig, Highlighter};
use crate::error::RenderError;
use crate::fence::{FenceMatch, find_fenced_block};
use crate::stash::{HtmlStash, TOKEN_END, TOKEN_START};

/// Pass state.
#[derive(Debug)]
enum State {
    /// Looking for the next fenced block at or after the cursor.
    Scanning,
    /// A block was found and is being rendered.
    Rendering(FenceMatch),
    /// The rendered block is being swapped for its token.
    Substituting(FenceMatch, String),
    /// No blocks left.
    Done,
}

/// Preprocessor that swaps fenced code blocks for placeholder tokens.
///
/// Each found block is rendered immediately (escaped and wrapped, or
/// highlighted) and stored in the stash. The block's lines are replaced by
/// the token surrounded by blank lines, so the token becomes a paragraph of
/// its own.
///
/// Scanning runs over the original input and resumes right after each
/// matched block, so the leftmost block is always processed first and
/// inserted tokens are never scanned. Block bodies reach the renderer
/// verbatim; token delimiter characters are only removed from the text
/// between blocks.
///
/// # Example
///
/// ```
/// use mdc_renderer::{FencedBlockPreprocessor, FencedCodeConfig};
///
/// let config = FencedCodeConfig::html();
/// let mut preprocessor = FencedBlockPreprocessor::new(&config);
/// let lines = preprocessor.run("Intro\n\n```rust\nlet x = 1;\n```\n").unwrap();
///
/// let stash = preprocessor.into_stash();
/// assert_eq!(stash.len(), 1);
/// assert_eq!(stash.get(0), Some("<pre><code class=\"rust\">let x = 1;\n</code></pre>"));
/// assert_eq!(lines.len(), 6);
/// ```
pub struct FencedBlockPreprocessor<'a> {
    renderer: CodeBlockRenderer<'a>,
    stash: HtmlStash,
}

impl<'a> FencedBlockPreprocessor<'a> {
    /// Create a preprocessor with an empty stash.
    #[must_use]
    pub fn new(config: &'a FencedCodeConfig) -> Self {
        Self {
            renderer: CodeBlockRenderer::new(config),
            stash: HtmlStash::new(),
        }
    }

    /// Highlight code blocks with `highlighter` when the config enables it.
    #[must_use]
    pub fn with_highlighter(mut self, highlighter: &'a dyn Highlighter) -> Self {
        self.renderer = self.renderer.with_highlighter(highlighter);
        self
    }

    /// Process a document and return its lines with blocks replaced by tokens.
    pub fn run(&mut self, input: &str) -> Result<Vec<String>, RenderError> {
        let text = self.run_text(input)?;
        Ok(text.split('\n').map(str::to_owned).collect())
    }

    /// Process a document and return the text with blocks replaced by tokens.
    pub fn run_text(&mut self, input: &str) -> Result<String, RenderError> {
        let mut text = String::with_capacity(input.len());
        let mut cursor = 0;
        let first_index = self.stash.len();
        let mut state = State::Scanning;

        loop {
            state = match state {
                State::Scanning => match find_fenced_block(input, cursor) {
                    Some(block) => State::Rendering(block),
                    None => {
                        push_outside_code(&mut text, &input[cursor..]);
                        State::Done
                    }
                },
                State::Rendering(block) => {
                    let html = self.renderer.render(&block, self.stash.len())?;
                    State::Substituting(block, html)
                }
                State::Substituting(block, html) => {
                    tracing::debug!(
                        index = self.stash.len(),
                        language = ?block.language,
                        code_bytes = block.code.len(),
                        "Stashed fenced code block"
                    );
                    push_outside_code(&mut text, &input[cursor..block.span.start]);
                    let token = self.stash.store(html);
                    text.push('\n');
                    text.push_str(&token);
                    text.push('\n');
                    cursor = block.span.end;
                    State::Scanning
                }
                State::Done => break,
            };
        }

        tracing::debug!(
            blocks = self.stash.len() - first_index,
            "Fenced code preprocessing completed"
        );
        Ok(text)
    }

    /// Rendered blocks stored so far.
    #[must_use]
    pub fn stash(&self) -> &HtmlStash {
        &self.stash
    }

    /// Consume the preprocessor and return the stash for the renderer.
    #[must_use]
    pub fn into_stash(self) -> HtmlStash {
        self.stash
    }
}

/// Append markdown text that lies outside any code block.
///
/// Token delimiter characters are dropped here so document text cannot
/// forge a placeholder. Code block bodies never pass through this function.
fn push_outside_code(out: &mut String, segment: &str) {
    if segment.contains([TOKEN_START, TOKEN_END]) {
        tracing::debug!("Removed token delimiter characters from document text");
        out.extend(segment.chars().filter(|&c| c != TOKEN_START && c != TOKEN_END));
    } else {
        out.push_str(segment);
    }
}
