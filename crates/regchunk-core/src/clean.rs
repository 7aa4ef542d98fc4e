//! Whitespace normalization and OCR artifact stripping.
//!
//! Regulatory texts usually arrive via PDF or OCR extraction and carry
//! noise: stray control characters, soft hyphens, `123| ` line-number
//! gutters, and isolated page-number lines. [`clean_text`] removes that
//! noise while keeping paragraph structure (at most one blank line between
//! paragraphs).
//!
//! [`clean_text`] is idempotent: `clean_text(&clean_text(s)) == clean_text(s)`.

use std::sync::LazyLock;

use regex::Regex;

/// `123| ` gutters left by line-numbered source renderings.
static LINE_NUMBER_GUTTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\|[ \t]*").expect("line-number gutter pattern is valid"));

/// A line holding nothing but a page number (`12`, `- 12 -`, `Page 12 of 88`).
static PAGE_NUMBER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?i:page)\s+)?[-–—]?\s*\d{1,4}(?:\s+(?i:of)\s+\d{1,4})?\s*[-–—]?$")
        .expect("page-number line pattern is valid")
});

/// Strip a leading `123| ` gutter from a single line.
pub(crate) fn strip_line_gutter(line: &str) -> &str {
    let trimmed = line.trim_start();
    match LINE_NUMBER_GUTTER.find(trimmed) {
        Some(m) if m.start() == 0 => &trimmed[m.end()..],
        _ => line,
    }
}

/// Clean and normalize raw document text.
///
/// 1. Normalize line endings; form feeds become line breaks.
/// 2. Drop control characters (except `\n`/`\t`) and invisible OCR junk
///    (soft hyphens, zero-width characters, BOMs, replacement characters).
/// 3. Remove `123| ` line-number gutters.
/// 4. Collapse runs of spaces/tabs to one space and trim every line.
/// 5. Drop lines that hold only a page number.
/// 6. Collapse runs of blank lines to a single blank line and trim the ends.
pub fn clean_text(text: &str) -> String {
    let normalized: String = text
        .replace("\r\n", "\n")
        .chars()
        .filter_map(|c| match c {
            '\r' | '\u{000C}' => Some('\n'),
            '\n' | '\t' => Some(c),
            '\u{00A0}' => Some(' '),
            '\u{00AD}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' | '\u{FFFD}' => None,
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();

    let without_gutters = LINE_NUMBER_GUTTER.replace_all(&normalized, "");

    let mut out = String::with_capacity(without_gutters.len());
    let mut pending_blank = false;

    for raw_line in without_gutters.lines() {
        let line = collapse_inline_whitespace(raw_line);

        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if PAGE_NUMBER_LINE.is_match(&line) {
            continue;
        }

        if !out.is_empty() {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        pending_blank = false;
        out.push_str(&line);
    }

    out
}

fn collapse_inline_whitespace(line: &str) -> String {
    line.split([' ', '\t'])
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
