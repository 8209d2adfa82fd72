//! Shared utility functions for rendering.

/// Escape HTML special characters in code text.
///
/// Replaces `&`, `<`, `>` and `"` with their entities. The ampersand is
/// handled first so entities introduced for the other characters are never
/// escaped again. Single quotes are left untouched.
///
/// # Examples
///
/// ```
/// use mdc_renderer::escape_html;
///
/// assert_eq!(escape_html(r#"<a href="x">&</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
/// ```
#[must_use]
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
