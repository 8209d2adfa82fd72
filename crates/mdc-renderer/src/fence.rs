//! Fenced code block scanner.
//!
//! Finds the leftmost well-formed fenced block in a text buffer. A fence
//! opens at the start of a line with three or more backticks or tildes and
//! closes at the first line consisting of the same character repeated at
//! least as many times (optionally followed by whitespace).
//!
//! The opening line may carry metadata:
//!
//! ````text
//! ```python
//! ~~~ {.rust hl_lines="1 3-4"}
//! ``` hl_lines='2'
//! ````
//!
//! Metadata is parsed leniently: an unrecognized language or a malformed
//! `hl_lines` value is dropped, the block itself still matches.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// `hl_lines="..."` or `hl_lines='...'` on the opening line.
static HL_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"hl_lines=(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"#).unwrap());

/// Fence delimiter: the marker character and its run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceMarker {
    /// Backtick or tilde.
    pub ch: char,
    /// Number of marker characters (at least 3).
    pub len: usize,
}

impl FenceMarker {
    /// Check whether `line` closes a block opened with this marker.
    ///
    /// The closing fence must use the same character, be at least as long
    /// as the opening fence and contain nothing but whitespace afterwards.
    #[must_use]
    pub fn is_closed_by(&self, line: &str) -> bool {
        let count = line.chars().take_while(|&c| c == self.ch).count();
        if count < self.len {
            return false;
        }

        // Marker chars are ASCII, so `count` is also a byte offset
        line[count..].chars().all(char::is_whitespace)
    }
}

/// A fenced code block found by [`find_fenced_block`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceMatch {
    /// Delimiter of the opening fence.
    pub marker: FenceMarker,
    /// Language identifier, if declared and well-formed.
    pub language: Option<String>,
    /// Line numbers to emphasize (1-indexed, sorted, deduplicated).
    pub hl_lines: Vec<usize>,
    /// Raw body between the fence lines. Ends with a newline unless empty.
    pub code: String,
    /// Byte range from the start of the opening line to the end of the
    /// closing line (the closing line's newline is not included).
    pub span: Range<usize>,
}

/// Find the leftmost fenced code block starting at or after byte offset `from`.
///
/// Returns `None` when `from` is past the end of `text` or not at a char
/// boundary. Candidate opening lines that have no matching closing line are
/// skipped and left as literal text.
#[must_use]
pub fn find_fenced_block(text: &str, from: usize) -> Option<FenceMatch> {
    if !text.is_char_boundary(from) {
        return None;
    }
    let mut line_start = from;

    // Only whole lines can open a fence
    if line_start > 0 && text.as_bytes().get(line_start - 1) != Some(&b'\n') {
        line_start = next_line_start(text, line_start)?;
    }

    while line_start < text.len() {
        let line_end = line_end(text, line_start);
        let line = &text[line_start..line_end];

        if let Some((marker, info)) = detect_fence(line)
            && line_end < text.len()
            && let Some((body_end, close_end)) = find_closing(text, line_end + 1, marker)
        {
            let info = parse_info(info);
            return Some(FenceMatch {
                marker,
                language: info.language,
                hl_lines: info.hl_lines,
                code: text[line_end + 1..body_end].to_owned(),
                span: line_start..close_end,
            });
        }

        line_start = next_line_start(text, line_start)?;
    }

    None
}

/// Byte offset of the `\n` ending the line that starts at `start`, or the text length.
fn line_end(text: &str, start: usize) -> usize {
    text[start..].find('\n').map_or(text.len(), |i| start + i)
}

/// Byte offset of the line following the one containing `pos`.
fn next_line_start(text: &str, pos: usize) -> Option<usize> {
    text[pos..].find('\n').map(|i| pos + i + 1)
}

/// Search for the closing fence line starting at `body_start`.
///
/// Returns `(body_end, close_end)`: where the body stops (start of the
/// closing line) and where the closing line's content ends.
fn find_closing(text: &str, body_start: usize, marker: FenceMarker) -> Option<(usize, usize)> {
    let mut pos = body_start;
    while pos < text.len() {
        let end = line_end(text, pos);
        if marker.is_closed_by(&text[pos..end]) {
            return Some((pos, end));
        }
        pos = end + 1;
    }
    None
}

/// Detect if a line opens a code fence.
///
/// Returns the marker and the rest of the line after the marker run.
fn detect_fence(line: &str) -> Option<(FenceMarker, &str)> {
    let first = line.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }

    let len = line.chars().take_while(|&c| c == first).count();
    if len < 3 {
        return None;
    }

    let info = &line[len..];
    // Backtick info strings cannot contain backticks (that's an inline code span)
    if first == '`' && info.contains('`') {
        return None;
    }

    Some((FenceMarker { ch: first, len }, info))
}

/// Metadata parsed from the opening fence line.
#[derive(Debug, Default, PartialEq, Eq)]
struct FenceInfo {
    language: Option<String>,
    hl_lines: Vec<usize>,
}

/// Parse the text following the opening marker run.
fn parse_info(info: &str) -> FenceInfo {
    let hl_lines = HL_LINES_RE
        .captures(info)
        .and_then(|caps| caps.name("dq").or_else(|| caps.name("sq")))
        .map(|m| parse_hl_lines(m.as_str()))
        .unwrap_or_default();

    FenceInfo {
        language: parse_language(info),
        hl_lines,
    }
}

/// Extract the language identifier: optional `{`, optional `.`, then
/// `[A-Za-z0-9_+-]+` terminated by whitespace, `}` or end of line.
fn parse_language(info: &str) -> Option<String> {
    let rest = info.trim_start_matches([' ', '\t']);
    let rest = rest.strip_prefix('{').unwrap_or(rest);
    let rest = rest.strip_prefix('.').unwrap_or(rest);

    let len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'+' | b'-'))
        .count();
    if len == 0 {
        return None;
    }

    match rest[len..].chars().next() {
        None | Some('}') => Some(rest[..len].to_owned()),
        Some(c) if c.is_whitespace() => Some(rest[..len].to_owned()),
        // e.g. `c#` or `hl_lines=...` directly after the marker
        Some(_) => None,
    }
}

/// Largest line number accepted in a highlighted-lines value.
const MAX_HL_LINE: usize = 100_000;

/// Parse a highlighted-lines value.
///
/// Accepts line numbers and inclusive ranges separated by whitespace or
/// commas: `"1 3-5,8"`. Any malformed entry invalidates the whole list.
/// Overlapping ranges are merged before expansion, so the result never holds
/// more than `MAX_HL_LINE` entries however long the value is.
#[must_use]
pub fn parse_hl_lines(ranges: &str) -> Vec<usize> {
    let mut bounds = Vec::new();

    for part in ranges
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
    {
        let parsed = match part.split_once('-') {
            Some((start, end)) => match (start.parse::<usize>(), end.parse::<usize>()) {
                (Ok(start), Ok(end)) if start <= end && end <= MAX_HL_LINE => Some(start..=end),
                _ => None,
            },
            None => part
                .parse::<usize>()
                .ok()
                .filter(|&n| n <= MAX_HL_LINE)
                .map(|n| n..=n),
        };

        match parsed {
            Some(range) => bounds.push((*range.start(), *range.end())),
            None => return Vec::new(),
        }
    }

    bounds.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(bounds.len());
    for (start, end) in bounds {
        match merged.last_mut() {
            Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }

    merged
        .into_iter()
        .flat_map(|(start, end)| start.max(1)..=end)
        .collect()
}
