//! XHTML document shell.

use crate::util::escape_html;

const XHTML_DOCTYPE: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">"#;

/// Wrap a rendered body in an XHTML 1.1 document.
///
/// The title is escaped; the body is inserted as-is.
///
/// # Example
///
/// ```
/// let page = mdc_renderer::wrap_xhtml("A & B", "<p>x</p>");
/// assert!(page.contains("<title>A &amp; B</title>"));
/// assert!(page.ends_with("<body>\n<p>x</p>\n</body>\n</html>"));
/// ```
#[must_use]
pub fn wrap_xhtml(title: &str, body: &str) -> String {
    let title = escape_html(title);
    let body = body.strip_suffix('\n').unwrap_or(body);
    format!(
        "{XHTML_DOCTYPE}\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\">\n\
         <head>\n\
         <title>{title}</title>\n\
         </head>\n\
         <body>\n\
         {body}\n\
         </body>\n\
         </html>"
    )
}
