//! Shared line-layout helpers for manual-page text.
//!
//! Heading, banner, and indentation detection live here because both the
//! normalizer (rendered-text path) and the segmenter must agree on them.

use std::sync::LazyLock;

use regex::Regex;

/// Indentation (relative to the body indent) from which an indented block may
/// be treated as verbatim code.
pub const DEEP_INDENT: usize = 7;

/// Column at which rendered subsection titles sit.
pub const SUBSECTION_INDENT: usize = 3;

/// Longest line still considered a heading.
const MAX_HEADING_CHARS: usize = 60;

/// Heading nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    /// Top-level section (`.SH`, `## `, all-caps line).
    Section,
    /// Subsection (`.SS`, `### `, groff's 3-column indented title).
    Subsection,
}

/// A detected heading line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: HeadingLevel,
    pub title: String,
}

/// Returns `true` if `token` is a man title banner token such as
/// `GIT-REBASE(1)` or `STAT(1)`.
///
/// - **Name part**: ASCII alphanumeric plus `-`, `_`, `.`, `+`
/// - **Section part**: ASCII digits or alphabetic characters
pub fn looks_like_man_title_token(token: &str) -> bool {
    if !token.ends_with(')') {
        return false;
    }
    let Some(paren_idx) = token.rfind('(') else {
        return false;
    };
    if paren_idx == 0 {
        return false;
    }
    let name = &token[..paren_idx];
    let section = &token[paren_idx + 1..token.len() - 1];
    name.chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '+'))
        && !section.is_empty()
        && section.chars().all(|ch| ch.is_ascii_alphanumeric())
}

/// Returns `true` when the first token of `trimmed` is a man title token.
pub fn looks_like_man_title_line(trimmed: &str) -> bool {
    trimmed
        .split_whitespace()
        .next()
        .is_some_and(looks_like_man_title_token)
}

/// Width of the leading whitespace of `line` (tabs are expanded earlier).
pub fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Collapses every whitespace run into a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns `true` when `trimmed` starts with an option token (`-x`, `--long`).
pub fn looks_like_flag_header(trimmed: &str) -> bool {
    let rest = trimmed
        .strip_prefix("--")
        .or_else(|| trimmed.strip_prefix('-'));
    rest.and_then(|rest| rest.chars().next())
        .is_some_and(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '?' | '#' | '@'))
}

/// Splits a two-column row (`-a, --all    do not ignore ...`) at the first
/// tab or run of two spaces.
pub fn split_two_columns(line: &str) -> (&str, Option<&str>) {
    let split_at = match (line.find('\t'), line.find("  ")) {
        (Some(tab), Some(spaces)) => Some(tab.min(spaces)),
        (tab, spaces) => tab.or(spaces),
    };
    match split_at {
        Some(idx) => {
            let right = line[idx..].trim();
            (
                line[..idx].trim_end(),
                (!right.is_empty()).then_some(right),
            )
        }
        None => (line, None),
    }
}

/// Builds a lowercase, dash-separated identifier from a section title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("section");
    }
    slug
}

/// Returns `true` for an all-caps title line such as `SEE ALSO` or
/// `C++ INTERFACE`.
///
/// The line must start with an uppercase letter, contain at least two
/// letters and no lowercase ones; digits and a few title punctuation marks
/// are allowed.
pub fn is_all_caps_heading(trimmed: &str) -> bool {
    trimmed.chars().count() <= MAX_HEADING_CHARS
        && trimmed
            .chars()
            .next()
            .is_some_and(|ch| ch.is_alphabetic() && ch.is_uppercase())
        && trimmed.chars().filter(|ch| ch.is_alphabetic()).count() >= 2
        && !looks_like_man_title_line(trimmed)
        && trimmed.chars().all(|ch| {
            (ch.is_alphabetic() && ch.is_uppercase())
                || ch.is_ascii_digit()
                || matches!(ch, ' ' | '/' | '&' | '(' | ')' | '+' | '\'' | ',' | '-')
        })
}

fn looks_like_subsection_title(trimmed: &str) -> bool {
    trimmed.chars().count() <= MAX_HEADING_CHARS
        && trimmed.split_whitespace().count() <= 8
        && trimmed
            .chars()
            .next()
            .is_some_and(|ch| ch.is_alphabetic() && ch.is_uppercase())
        && !trimmed.ends_with(['.', ',', ';'])
        && !is_banner(trimmed)
}

/// groff and mandoc both render `.SS`/`.Ss` titles at three columns.
fn is_subsection_position(indent: usize, base: usize) -> bool {
    indent == SUBSECTION_INDENT && base != SUBSECTION_INDENT
}

/// Returns `true` for fenced code block delimiters.
pub fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Detects a heading line given the document body indent.
pub fn heading_of(line: &str, base: usize) -> Option<Heading> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    if line.starts_with("###") {
        let title = trimmed.trim_start_matches('#').trim();
        if !title.is_empty() {
            return Some(Heading {
                level: HeadingLevel::Subsection,
                title: title.to_string(),
            });
        }
    }
    if let Some(rest) = line.strip_prefix("## ") {
        let title = rest.trim();
        if !title.is_empty() {
            return Some(Heading {
                level: HeadingLevel::Section,
                title: title.to_string(),
            });
        }
    }

    let indent = indent_width(line);
    if is_subsection_position(indent, base) && looks_like_subsection_title(trimmed) {
        return Some(Heading {
            level: HeadingLevel::Subsection,
            title: collapse_whitespace(trimmed),
        });
    }

    (indent < base.max(1) && is_all_caps_heading(trimmed)).then(|| Heading {
        level: HeadingLevel::Section,
        title: collapse_whitespace(trimmed),
    })
}

fn has_date_hint(text: &str) -> bool {
    // SAFETY: These regexes are compile-time constants and are validated by tests.
    static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"\b(?:19[7-9]\d|20\d\d)\b|\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\b",
        )
        .expect("static regex must compile")
    });
    DATE_RE.is_match(text)
}

/// Returns `true` for running headers/footers and page-number lines.
///
/// Recognized shapes:
/// - bare page numbers (`12`, `Page 3`)
/// - running headers whose first and last token are the same `NAME(N)`
/// - footers ending in `NAME(N)` with a date or year column
/// - BSD-style footers whose first and last column repeat (`macOS 14.5 ... macOS 14.5`)
pub fn is_banner(trimmed: &str) -> bool {
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.chars().all(|ch| ch.is_ascii_digit()) {
        return true;
    }
    let lower = trimmed.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix("page ")
        && !rest.is_empty()
        && rest.chars().all(|ch| ch.is_ascii_digit())
    {
        return true;
    }

    let tokens = trimmed.split_whitespace().collect::<Vec<_>>();
    if let (Some(first), Some(last)) = (tokens.first(), tokens.last())
        && tokens.len() >= 2
        && first == last
        && looks_like_man_title_token(first)
    {
        return true;
    }

    if tokens.last().is_some_and(|last| looks_like_man_title_token(last))
        && trimmed.contains("  ")
        && has_date_hint(trimmed)
    {
        return true;
    }

    let columns = split_columns(trimmed);
    columns.len() >= 3 && columns.first() == columns.last()
}

fn split_columns(trimmed: &str) -> Vec<&str> {
    trimmed
        .split("  ")
        .map(str::trim)
        .filter(|column| !column.is_empty())
        .collect()
}

/// Computes the common body indentation of rendered man text.
///
/// Rendered pages indent their body (typically 7 columns) while headings sit
/// at column 0; when most content lines are indented by 5 or more, the
/// smallest such indent is the body indent. Otherwise the text is flush-left
/// and the body indent is 0.
pub fn body_indent<'a>(lines: impl IntoIterator<Item = &'a str>) -> usize {
    let mut in_fence = false;
    let mut indents = Vec::new();

    for line in lines {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        let trimmed = line.trim();
        if in_fence || trimmed.is_empty() || line.starts_with('#') || is_banner(trimmed) {
            continue;
        }
        let indent = indent_width(line);
        if indent == 0 && is_all_caps_heading(trimmed) {
            continue;
        }
        indents.push(indent);
    }

    let deep = indents
        .iter()
        .copied()
        .filter(|indent| *indent >= 5)
        .collect::<Vec<_>>();
    if !indents.is_empty() && deep.len() * 2 > indents.len() {
        deep.into_iter().min().unwrap_or(0)
    } else {
        0
    }
}

/// Parses the leading ASCII digits of `text` (`3p` ⇒ 3).
pub fn leading_number(text: &str) -> Option<u32> {
    let digits = text
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect::<String>();
    digits.parse().ok()
}

/// Reads the manual section from a running header such as
/// `LS(1)   User Commands   LS(1)`.
pub fn running_header_section(text: &str) -> Option<u32> {
    text.lines().take(40).find_map(|line| {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        let first = *tokens.first()?;
        if tokens.len() < 2 || tokens.last() != Some(&first) || !looks_like_man_title_token(first)
        {
            return None;
        }
        let open = first.rfind('(')?;
        leading_number(&first[open + 1..])
    })
}
