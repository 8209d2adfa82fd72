//! Syntax highlighting for fenced code blocks.
//!
//! [`SyntectHighlighter`] implements the [`Highlighter`] capability from
//! `mdc-renderer` on top of syntect's bundled syntaxes and themes.
//!
//! Output shapes:
//!
//! - tokenized (`use_external`): `<div class="{css}"><pre>…</pre></div>` with
//!   either nested spans classed by scope, matching the selectors of
//!   [`SyntectHighlighter::stylesheet`], or one inline-styled span per token
//! - client-side (`!use_external`): `<pre class="{css}"><code
//!   class="language-{lang}">…</code></pre>` with the escaped code only
//!
//! # Example
//!
//! ```
//! use mdc_highlight::SyntectHighlighter;
//! use mdc_renderer::{HighlightRequest, Highlighter};
//!
//! let highlighter = SyntectHighlighter::new();
//! let request = HighlightRequest {
//!     language: Some("rust"),
//!     guess_language: false,
//!     line_numbers: false,
//!     css_class: "codehilite",
//!     style: "InspiredGitHub",
//!     use_external: true,
//!     inline_styles: false,
//!     hl_lines: &[],
//! };
//!
//! let html = highlighter.highlight("fn main() {}\n", &request).unwrap();
//! assert!(html.starts_with("<div class=\"codehilite\"><pre>"));
//! ```

use std::fmt::Write as _;

use mdc_renderer::{HighlightError, HighlightRequest, Highlighter, escape_html};
use syntect::easy::{HighlightLines, ScopeRegionIterator};
use syntect::highlighting::{Color, Theme, ThemeSet};
use syntect::html::{
    ClassStyle, IncludeBackground, css_for_theme_with_class_style,
    styled_line_to_highlighted_html,
};
use syntect::parsing::{
    BasicScopeStackOp, ParseState, Scope, ScopeStack, SyntaxReference, SyntaxSet,
};
use syntect::util::LinesWithEndings;

/// Highlighter backed by syntect's default syntaxes and themes.
pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
    themes: ThemeSet,
}

impl SyntectHighlighter {
    /// Load the bundled syntax definitions and themes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            themes: ThemeSet::load_defaults(),
        }
    }

    /// Names of the available styles, sorted.
    pub fn style_names(&self) -> impl Iterator<Item = &str> {
        self.themes.themes.keys().map(String::as_str)
    }

    /// CSS rules for classed output in the given style.
    pub fn stylesheet(&self, style: &str) -> Result<String, HighlightError> {
        let theme = self.theme(style)?;
        css_for_theme_with_class_style(theme, ClassStyle::Spaced).map_err(failed)
    }

    fn theme(&self, style: &str) -> Result<&Theme, HighlightError> {
        self.themes
            .themes
            .get(style)
            .ok_or_else(|| HighlightError::UnknownStyle(style.to_owned()))
    }

    /// Pick a syntax by declared language, then by the first line, then plain text.
    fn resolve_syntax(&self, language: Option<&str>, guess: bool, code: &str) -> &SyntaxReference {
        if let Some(language) = language {
            if let Some(syntax) = self.syntaxes.find_syntax_by_token(language) {
                return syntax;
            }
            tracing::debug!(language, "Unknown language for highlighting");
        }

        if guess {
            let first_line = code.lines().next().unwrap_or_default();
            if let Some(syntax) = self.syntaxes.find_syntax_by_first_line(first_line) {
                tracing::debug!(syntax = %syntax.name, "Guessed language from first line");
                return syntax;
            }
        }

        self.syntaxes.find_syntax_plain_text()
    }

    fn classed_lines(
        &self,
        code: &str,
        syntax: &SyntaxReference,
    ) -> Result<Vec<String>, HighlightError> {
        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();
        let mut lines = Vec::new();

        // Every line closes its own spans and reopens the carried-over
        // scopes, so each line is well-formed on its own.
        for line in LinesWithEndings::from(code) {
            let ops = state.parse_line(line, &self.syntaxes).map_err(failed)?;
            let mut html = String::with_capacity(line.len() * 3);
            for scope in stack.as_slice() {
                open_scope_span(&mut html, *scope);
            }
            for (text, op) in ScopeRegionIterator::new(&ops, line) {
                stack
                    .apply_with_hook(op, |basic, _| match basic {
                        BasicScopeStackOp::Push(scope) => open_scope_span(&mut html, scope),
                        BasicScopeStackOp::Pop => html.push_str("</span>"),
                    })
                    .map_err(failed)?;
                html.push_str(&escape_html(text));
            }
            for _ in 0..stack.len() {
                html.push_str("</span>");
            }
            lines.push(html);
        }

        Ok(lines)
    }

    fn styled_lines(
        &self,
        code: &str,
        syntax: &SyntaxReference,
        theme: &Theme,
    ) -> Result<Vec<String>, HighlightError> {
        let mut highlighter = HighlightLines::new(syntax, theme);
        LinesWithEndings::from(code)
            .map(|line| {
                let regions = highlighter
                    .highlight_line(line, &self.syntaxes)
                    .map_err(failed)?;
                styled_line_to_highlighted_html(&regions, IncludeBackground::No).map_err(failed)
            })
            .collect()
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(
        &self,
        code: &str,
        request: &HighlightRequest<'_>,
    ) -> Result<String, HighlightError> {
        if !request.use_external {
            return Ok(client_side_markup(code, request));
        }

        let theme = self.theme(request.style)?;
        let syntax = self.resolve_syntax(request.language, request.guess_language, code);

        let html = if request.inline_styles {
            let lines = self.styled_lines(code, syntax, theme)?;
            let frame = Frame {
                div_style: theme.settings.background.map(background_style),
                hll_style: theme.settings.line_highlight.map(background_style),
            };
            frame.assemble(&lines, request)
        } else {
            let lines = self.classed_lines(code, syntax)?;
            Frame::default().assemble(&lines, request)
        };

        tracing::debug!(
            syntax = %syntax.name,
            style = request.style,
            inline = request.inline_styles,
            "Highlighted code block"
        );
        Ok(html)
    }
}

/// Outer markup for tokenized output.
#[derive(Default)]
struct Frame {
    div_style: Option<String>,
    hll_style: Option<String>,
}

impl Frame {
    fn assemble(&self, lines: &[String], request: &HighlightRequest<'_>) -> String {
        let width = lines.len().to_string().len();
        let mut out = String::with_capacity(lines.iter().map(String::len).sum::<usize>() + 64);

        let _ = write!(out, "<div class=\"{}\"", request.css_class);
        if let Some(style) = &self.div_style {
            let _ = write!(out, " style=\"{style}\"");
        }
        out.push_str("><pre>");

        for (index, line) in lines.iter().enumerate() {
            let number = index + 1;
            if request.line_numbers {
                let _ = write!(out, "<span class=\"linenos\">{number:>width$}</span>");
            }
            if request.hl_lines.binary_search(&number).is_ok() {
                out.push_str("<span class=\"hll\"");
                if let Some(style) = &self.hll_style {
                    let _ = write!(out, " style=\"{style}\"");
                }
                out.push('>');
                out.push_str(line);
                out.push_str("</span>");
            } else {
                out.push_str(line);
            }
        }

        out.push_str("</pre></div>");
        out
    }
}

/// Escaped code for a client-side highlighter.
///
/// The `<code>` element carries `language-{lang}` and, when line numbers are
/// requested, `linenums`.
fn client_side_markup(code: &str, request: &HighlightRequest<'_>) -> String {
    let mut classes = Vec::new();
    if let Some(lang) = request.language {
        classes.push(format!("language-{lang}"));
    }
    if request.line_numbers {
        classes.push("linenums".to_owned());
    }

    let code = escape_html(code);
    if classes.is_empty() {
        format!("<pre class=\"{}\"><code>{code}</code></pre>", request.css_class)
    } else {
        format!(
            "<pre class=\"{}\"><code class=\"{}\">{code}</code></pre>",
            request.css_class,
            classes.join(" ")
        )
    }
}

/// Open a span classed by the atoms of `scope`.
fn open_scope_span(out: &mut String, scope: Scope) {
    let class = scope.build_string().replace('.', " ");
    let _ = write!(out, "<span class=\"{class}\">");
}

fn background_style(color: Color) -> String {
    format!("background-color:#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

fn failed(err: impl std::fmt::Display) -> HighlightError {
    HighlightError::Failed(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request<'a>(language: Option<&'a str>) -> HighlightRequest<'a> {
        HighlightRequest {
            language,
            guess_language: false,
            line_numbers: false,
            css_class: "codehilite",
            style: "InspiredGitHub",
            use_external: true,
            inline_styles: false,
            hl_lines: &[],
        }
    }

    #[test]
    fn test_client_side_markup() {
        let highlighter = SyntectHighlighter::new();
        let request = HighlightRequest {
            use_external: false,
            ..request(Some("rust"))
        };

        let html = highlighter.highlight("a < b\n", &request).unwrap();
        assert_eq!(
            html,
            "<pre class=\"codehilite\"><code class=\"language-rust\">a &lt; b\n</code></pre>"
        );
    }

    #[test]
    fn test_client_side_markup_without_language() {
        let highlighter = SyntectHighlighter::new();
        let request = HighlightRequest {
            use_external: false,
            css_class: "hl",
            ..request(None)
        };

        let html = highlighter.highlight("x\n", &request).unwrap();
        assert_eq!(html, "<pre class=\"hl\"><code>x\n</code></pre>");
    }

    #[test]
    fn test_client_side_markup_line_numbers() {
        let highlighter = SyntectHighlighter::new();
        let request = HighlightRequest {
            use_external: false,
            line_numbers: true,
            ..request(Some("rust"))
        };

        let html = highlighter.highlight("x\n", &request).unwrap();
        assert_eq!(
            html,
            "<pre class=\"codehilite\"><code class=\"language-rust linenums\">x\n</code></pre>"
        );

        let request = HighlightRequest {
            language: None,
            ..request
        };
        let html = highlighter.highlight("x\n", &request).unwrap();
        assert_eq!(
            html,
            "<pre class=\"codehilite\"><code class=\"linenums\">x\n</code></pre>"
        );
    }

    #[test]
    fn test_unknown_style() {
        let highlighter = SyntectHighlighter::new();
        let request = HighlightRequest {
            style: "no-such-style",
            ..request(Some("rust"))
        };

        let err = highlighter.highlight("fn x() {}\n", &request).unwrap_err();
        assert!(matches!(err, HighlightError::UnknownStyle(name) if name == "no-such-style"));
    }

    #[test]
    fn test_classed_output() {
        let highlighter = SyntectHighlighter::new();
        let html = highlighter
            .highlight("fn main() {}\n", &request(Some("rust")))
            .unwrap();

        assert!(html.starts_with("<div class=\"codehilite\"><pre>"));
        assert!(html.ends_with("</pre></div>"));
        assert!(html.contains(" rust\">"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_classed_spans_nest_scope_stack() {
        let highlighter = SyntectHighlighter::new();
        let html = highlighter
            .highlight("fn a() {}\nfn b() {}\n", &request(Some("rust")))
            .unwrap();

        // Outer scope is reopened on every line, inner scopes nest inside it
        let body = html.strip_prefix("<div class=\"codehilite\"><pre>").unwrap();
        assert!(body.starts_with("<span class=\"source rust\"><span class=\""));
        assert_eq!(html.matches("<span class=\"source rust\">").count(), 2);
        assert_eq!(html.matches("<span").count(), html.matches("</span>").count());
    }

    #[test]
    fn test_classed_lines_balanced_with_hll() {
        let highlighter = SyntectHighlighter::new();
        let hl_lines = [2];
        let request = HighlightRequest {
            hl_lines: &hl_lines,
            ..request(Some("python"))
        };
        let code = "s = \"\"\"\nopen\n\"\"\"\n";

        let html = highlighter.highlight(code, &request).unwrap();
        let hll_start = html.find("<span class=\"hll\">").unwrap();
        let hll = &html[hll_start..];
        let hll_end = hll.find("\n").unwrap();
        let line = &hll[..hll_end];

        assert!(line.contains("string"));
        assert_eq!(html.matches("<span").count(), html.matches("</span>").count());
    }

    #[test]
    fn test_plain_text_escaped() {
        let highlighter = SyntectHighlighter::new();
        let html = highlighter
            .highlight("hello & <bye>\n", &request(None))
            .unwrap();

        assert!(html.contains("hello &amp; &lt;bye&gt;"));
        assert!(html.contains("class=\"text plain\""));
    }

    #[test]
    fn test_unknown_language_falls_back_to_plain_text() {
        let highlighter = SyntectHighlighter::new();
        let html = highlighter
            .highlight("x\n", &request(Some("no-such-language")))
            .unwrap();

        assert!(html.contains("class=\"text plain\""));
    }

    #[test]
    fn test_guess_language_from_shebang() {
        let highlighter = SyntectHighlighter::new();
        let request = HighlightRequest {
            guess_language: true,
            ..request(None)
        };

        let html = highlighter
            .highlight("#!/bin/bash\necho hi\n", &request)
            .unwrap();
        assert!(html.contains("shell"));
    }

    #[test]
    fn test_line_numbers_and_highlighted_lines() {
        let highlighter = SyntectHighlighter::new();
        let hl_lines = [2];
        let request = HighlightRequest {
            line_numbers: true,
            hl_lines: &hl_lines,
            ..request(None)
        };

        let html = highlighter.highlight("a\nb\n", &request).unwrap();
        assert!(html.contains("<span class=\"linenos\">1</span><span class=\"text plain\">a\n"));
        assert!(html.contains("<span class=\"linenos\">2</span><span class=\"hll\">"));
        assert_eq!(html.matches("class=\"hll\"").count(), 1);
    }

    #[test]
    fn test_line_numbers_padded() {
        let highlighter = SyntectHighlighter::new();
        let request = HighlightRequest {
            line_numbers: true,
            ..request(None)
        };
        let code: String = (1..=10).map(|n| format!("{n}\n")).collect();

        let html = highlighter.highlight(&code, &request).unwrap();
        assert!(html.contains("<span class=\"linenos\"> 1</span>"));
        assert!(html.contains("<span class=\"linenos\">10</span>"));
    }

    #[test]
    fn test_inline_styles() {
        let highlighter = SyntectHighlighter::new();
        let request = HighlightRequest {
            inline_styles: true,
            ..request(Some("rust"))
        };

        let html = highlighter.highlight("let x = 1;\n", &request).unwrap();
        assert!(html.contains("style=\"color:#"));
        assert!(!html.contains("class=\"source"));
    }

    #[test]
    fn test_empty_code() {
        let highlighter = SyntectHighlighter::new();
        let html = highlighter.highlight("", &request(Some("rust"))).unwrap();
        assert_eq!(html, "<div class=\"codehilite\"><pre></pre></div>");
    }

    #[test]
    fn test_style_names() {
        let highlighter = SyntectHighlighter::new();
        let names: Vec<&str> = highlighter.style_names().collect();
        assert!(names.contains(&"InspiredGitHub"));
        assert!(names.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_stylesheet() {
        let highlighter = SyntectHighlighter::new();
        assert!(highlighter.stylesheet("InspiredGitHub").unwrap().contains('{'));
        assert!(matches!(
            highlighter.stylesheet("missing"),
            Err(HighlightError::UnknownStyle(_))
        ));
    }
}
