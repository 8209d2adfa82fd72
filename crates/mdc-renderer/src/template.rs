//! Markup templates with named holes.
//!
//! Code blocks are wrapped using two templates: the code wrapper (holes
//! `{lang}` and `{code}`) and the language tag (hole `{lang}`). Templates are
//! parsed once so substituted values are never re-scanned for holes.

use std::fmt;

/// Error parsing a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// A hole the template kind doesn't accept.
    #[error("template hole {{{hole}}} is not allowed here")]
    UnexpectedHole {
        /// Hole name without braces.
        hole: &'static str,
    },
    /// A required hole is missing.
    #[error("template is missing the {{{hole}}} hole")]
    MissingHole {
        /// Hole name without braces.
        hole: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Lang,
    Code,
}

/// A parsed markup template.
///
/// Recognized holes are `{lang}` and `{code}`; any other brace text is
/// kept literally.
#[derive(Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a code wrapper template. Requires `{code}`; `{lang}` is optional.
    pub fn code_wrap(source: impl Into<String>) -> Result<Self, TemplateError> {
        let template = Self::parse(source.into());
        if !template.segments.contains(&Segment::Code) {
            return Err(TemplateError::MissingHole { hole: "code" });
        }
        Ok(template)
    }

    /// Parse a language tag template. Accepts `{lang}` only.
    pub fn lang_tag(source: impl Into<String>) -> Result<Self, TemplateError> {
        let template = Self::parse(source.into());
        if template.segments.contains(&Segment::Code) {
            return Err(TemplateError::UnexpectedHole { hole: "code" });
        }
        Ok(template)
    }

    pub(crate) fn parse(source: String) -> Self {
        let mut segments = Vec::new();
        let mut rest = source.as_str();

        while let Some(pos) = rest.find('{') {
            let after = &rest[pos..];
            let (segment, len) = if after.starts_with("{lang}") {
                (Segment::Lang, "{lang}".len())
            } else if after.starts_with("{code}") {
                (Segment::Code, "{code}".len())
            } else {
                push_literal(&mut segments, &rest[..=pos]);
                rest = &rest[pos + 1..];
                continue;
            };

            push_literal(&mut segments, &rest[..pos]);
            segments.push(segment);
            rest = &rest[pos + len..];
        }
        push_literal(&mut segments, rest);

        Self { source, segments }
    }

    /// Fill the holes and return the rendered markup.
    #[must_use]
    pub fn render(&self, lang: &str, code: &str) -> String {
        let mut out = String::with_capacity(self.source.len() + lang.len() + code.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Lang => out.push_str(lang),
                Segment::Code => out.push_str(code),
            }
        }
        out
    }

    /// Original template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Append literal text, merging with a preceding literal.
fn push_literal(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Literal(last)) = segments.last_mut() {
        last.push_str(text);
    } else {
        segments.push(Segment::Literal(text.to_owned()));
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Template").field(&self.source).finish()
    }
}
