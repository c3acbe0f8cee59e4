//! Classification of the constrained Markdown-like dialect produced for lesson notes.
//!
//! Only line-level prefixes (`#`, `##`, `###`, `*`/`+`/`-` bullets) and inline `**bold**`
//! spans are recognised. Anything else is body text, so malformed input never fails.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LineKind {
    Heading1,
    Heading2,
    Heading3,
    Bullet,
    Blank,
    Body,
}

/// A physical line with its prefix stripped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Line<'a> {
    pub kind: LineKind,
    pub text: &'a str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span<'a> {
    pub text: &'a str,
    pub bold: bool,
}

const BULLET_PREFIXES: [&str; 3] = ["* ", "+ ", "- "];

/// Classify a line by its leading characters. Prefixes are exact and case-sensitive:
/// `#Title` without the space is body text.
pub fn classify(line: &str) -> Line<'_> {
    let (kind, text) = if let Some(rest) = line.strip_prefix("### ") {
        (LineKind::Heading3, rest)
    } else if let Some(rest) = line.strip_prefix("## ") {
        (LineKind::Heading2, rest)
    } else if let Some(rest) = line.strip_prefix("# ") {
        (LineKind::Heading1, rest)
    } else if let Some(rest) = BULLET_PREFIXES.iter().find_map(|p| line.strip_prefix(p)) {
        (LineKind::Bullet, rest.trim())
    } else if line.trim().is_empty() {
        (LineKind::Blank, "")
    } else {
        (LineKind::Body, line)
    };
    Line { kind, text }
}

/// Split a body or bullet line into alternating plain and bold spans on paired `**`.
///
/// An opening `**` with no closing partner stays literal. An empty pair (`****`) is not a
/// span; its second `**` may still open one, so `****bold**` keeps `**` and bolds `bold`.
/// Nothing carries over to the next line.
pub fn split_spans(text: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut plain_start = 0;
    let mut search_from = 0;

    while let Some(rel_open) = text[search_from..].find("**") {
        let open = search_from + rel_open;
        let inner_start = open + 2;
        let Some(rel_close) = text[inner_start..].find("**") else {
            break;
        };
        let close = inner_start + rel_close;
        let inner = &text[inner_start..close];
        if inner.trim().is_empty() {
            search_from = inner_start;
            continue;
        }
        if open > plain_start {
            spans.push(Span {
                text: &text[plain_start..open],
                bold: false,
            });
        }
        spans.push(Span {
            text: inner,
            bold: true,
        });
        plain_start = close + 2;
        search_from = plain_start;
    }

    if plain_start < text.len() {
        spans.push(Span {
            text: &text[plain_start..],
            bold: false,
        });
    }
    spans
}
