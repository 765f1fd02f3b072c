//! Escape/macro normalization.
//!
//! [`normalize`] accepts either roff source or text already rendered by
//! `man`, detects which it was given, and produces plain text or light
//! markdown:
//!
//! - terminal artifacts (overstrike, ANSI, control bytes) are stripped first
//! - roff is rendered line by line; unknown macros never survive as literal
//!   troff
//! - rendered text keeps its line structure
//! - no-fill regions and deep-indented code runs are fenced in markdown mode
//!
//! Plain mode is idempotent: the output of a plain pass is rendered text,
//! which a second pass only tidies.

pub mod artifacts;
pub mod escapes;
pub mod lexer;
pub mod macros;
mod rendered;
mod roff;

use serde::Serialize;
use tracing::debug;

use crate::util::{DEEP_INDENT, indent_width, is_fence, looks_like_flag_header};

use self::lexer::Line;
use self::macros::Macro;

/// Output flavour of the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Plain,
    Markdown,
}

/// Which input language the normalizer detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Roff,
    Rendered,
}

/// What a normalization pass encountered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeReport {
    pub source: SourceKind,
    pub unknown_macros: Vec<String>,
    pub artifacts_stripped: usize,
}

/// Normalizes `text` into plain text or light markdown.
///
/// # Examples
///
/// ```
/// use man_structure_parser::normalize::{Mode, normalize};
///
/// let roff = ".SH NAME\nls \\- list directory contents\n";
/// assert_eq!(normalize(roff, Mode::Plain), "NAME\nls - list directory contents");
/// assert_eq!(
///     normalize(roff, Mode::Markdown),
///     "## NAME\n\nls - list directory contents"
/// );
/// ```
pub fn normalize(text: &str, mode: Mode) -> String {
    normalize_with_report(text, mode).0
}

/// Like [`normalize`], also reporting what was found.
pub fn normalize_with_report(text: &str, mode: Mode) -> (String, NormalizeReport) {
    let cleaned = artifacts::strip_artifacts(text);

    let (lines, source, unknown_macros) = if looks_like_roff(&cleaned.text) {
        let rendered = roff::render(&cleaned.text, mode);
        let lines = match mode {
            Mode::Markdown => fence_chunks(split_indented_code(rendered.lines, 0)),
            Mode::Plain => rendered.lines,
        };
        (lines, SourceKind::Roff, rendered.unknown_macros)
    } else {
        (
            rendered::render(&cleaned.text, mode),
            SourceKind::Rendered,
            Vec::new(),
        )
    };

    debug!(
        ?source,
        ?mode,
        unknown = unknown_macros.len(),
        artifacts = cleaned.stripped,
        "normalized man text"
    );

    (
        tidy(lines),
        NormalizeReport {
            source,
            unknown_macros,
            artifacts_stripped: cleaned.stripped,
        },
    )
}

/// Returns `true` when `text` looks like roff source rather than rendered
/// output: some column-0 line is a comment or a control line with a
/// supported macro name.
///
/// Escapes alone never mark text as roff. Rendered pages such as sed(1) or
/// echo(1) print literal `\(` and `\f`, and plain output of this module
/// must read back unchanged.
pub fn looks_like_roff(text: &str) -> bool {
    text.lines().any(|line| match lexer::classify(line) {
        Line::Control { name, .. } => !name.is_empty() && Macro::is_recognized(name),
        Line::Comment => line.starts_with(['.', '\'']),
        Line::Blank | Line::Text(_) => false,
    })
}

/// A run of output lines: ordinary lines or a code block to fence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Chunk {
    Line(String),
    Code(Vec<String>),
}

/// Separates deep-indented code runs from the surrounding lines.
///
/// A run of lines indented at least `base + 7` columns is code, unless its
/// first line starts with an uppercase letter or the nearest shallower line
/// before it is an option header (then it is that option's description).
/// Existing fences pass through untouched.
pub(crate) fn split_indented_code(lines: Vec<String>, base: usize) -> Vec<Chunk> {
    let threshold = base + DEEP_INDENT;
    let mut chunks = Vec::with_capacity(lines.len());
    let mut in_fence = false;
    let mut last_shallow: Option<String> = None;
    let mut idx = 0;

    while idx < lines.len() {
        let line = &lines[idx];
        if is_fence(line) {
            in_fence = !in_fence;
            chunks.push(Chunk::Line(line.clone()));
            idx += 1;
            continue;
        }
        let trimmed = line.trim();
        if in_fence || trimmed.is_empty() {
            chunks.push(Chunk::Line(line.clone()));
            idx += 1;
            continue;
        }

        if indent_width(line) < threshold {
            last_shallow = Some(trimmed.to_string());
            chunks.push(Chunk::Line(line.clone()));
            idx += 1;
            continue;
        }

        let mut end = idx;
        let mut next_idx = idx + 1;
        while next_idx < lines.len() {
            let next = &lines[next_idx];
            if next.trim().is_empty() {
                next_idx += 1;
                continue;
            }
            if is_fence(next) || indent_width(next) < threshold {
                break;
            }
            end = next_idx;
            next_idx += 1;
        }

        let prose = trimmed.starts_with(|ch: char| ch.is_uppercase());
        let describes_option = last_shallow
            .as_deref()
            .is_some_and(|prev| looks_like_flag_header(strip_list_marker(prev)));
        if prose || describes_option {
            chunks.extend(lines[idx..=end].iter().cloned().map(Chunk::Line));
        } else {
            chunks.push(Chunk::Code(dedent(&lines[idx..=end])));
        }
        idx = end + 1;
    }

    chunks
}

fn strip_list_marker(line: &str) -> &str {
    line.strip_prefix("- ").unwrap_or(line)
}

fn dedent(lines: &[String]) -> Vec<String> {
    let shared = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| indent_width(line))
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|line| line.get(shared..).unwrap_or_default().trim_end().to_string())
        .collect()
}

/// Flattens chunks, wrapping code runs in fences.
pub(crate) fn fence_chunks(chunks: Vec<Chunk>) -> Vec<String> {
    let mut out = Vec::new();
    for chunk in chunks {
        match chunk {
            Chunk::Line(line) => out.push(line),
            Chunk::Code(code) => {
                out.push(String::new());
                out.push("```".to_string());
                out.extend(code);
                out.push("```".to_string());
                out.push(String::new());
            }
        }
    }
    out
}

/// Trims trailing whitespace, collapses blank-line runs outside fences, and
/// drops leading and trailing blank lines.
fn tidy(lines: Vec<String>) -> String {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut in_fence = false;

    for line in lines {
        let line = line.trim_end().to_string();
        if is_fence(&line) {
            in_fence = !in_fence;
        } else if !in_fence
            && line.is_empty()
            && out.last().is_none_or(|prev| prev.is_empty())
        {
            continue;
        }
        out.push(line);
    }

    while out.last().is_some_and(String::is_empty) {
        out.pop();
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_roff_source() {
        assert!(looks_like_roff(".TH LS 1\n.SH NAME\n"));
        assert!(!looks_like_roff("some \\fBbold\\fR text"));
        assert!(looks_like_roff(".\\\" comment only\n"));
        assert!(!looks_like_roff("NAME\n       ls - list directory contents\n"));
        assert!(!looks_like_roff(".hidden files are skipped\n"));
    }

    #[test]
    fn test_plain_normalization_is_idempotent() {
        let roff = ".TH LS 1\n.SH NAME\nls \\- list\n.SH OPTIONS\n.TP\n\\fB\\-a\\fR\nall\n.RS\n.nf\n  code\n.fi\n.RE\n";
        let once = normalize(roff, Mode::Plain);
        assert_eq!(normalize(&once, Mode::Plain), once);

        let rendered = "LS(1)    User Commands    LS(1)\n\n\nNAME\n       ls - list\n\n";
        let once = normalize(rendered, Mode::Plain);
        assert_eq!(normalize(&once, Mode::Plain), once);
    }

    #[test]
    fn test_decoded_backslashes_stay_decoded() {
        let once = normalize(".SH DESCRIPTION\nMatch \\e(foo\\e) groups.\n", Mode::Plain);
        assert_eq!(once, "DESCRIPTION\nMatch \\(foo\\) groups.");
        assert_eq!(normalize(&once, Mode::Plain), once);
    }

    #[test]
    fn test_rendered_escapes_pass_through() {
        let sed = "SED(1)          User Commands          SED(1)\n\nEXAMPLES\n       s/\\(a\\)/\\1/ swaps groups\n";
        let (out, report) = normalize_with_report(sed, Mode::Plain);
        assert_eq!(report.source, SourceKind::Rendered);
        assert!(out.contains("s/\\(a\\)/\\1/ swaps groups"), "{out}");

        let echo = "DESCRIPTION\n       \\f     form feed\n\n       \\n     new line\n";
        let out = normalize(echo, Mode::Plain);
        assert!(out.contains("\\f     form feed"), "{out}");
        assert!(out.contains("\\n     new line"), "{out}");
    }

    #[test]
    fn test_markdown_fences_nofill_exactly() {
        let out = normalize(".SH EXAMPLE\n.nf\n  x = 1\n.fi\n", Mode::Markdown);
        assert_eq!(out, "## EXAMPLE\n\n```\n  x = 1\n```");
    }

    #[test]
    fn test_split_indented_code_rules() {
        let lines = [
            "       -a, --all",
            "              do not ignore entries",
            "",
            "       Example:",
            "              make -j4 all",
            "              make install",
            "",
            "       Afterwards run the tests.",
        ]
        .map(String::from)
        .to_vec();
        let chunks = split_indented_code(lines, 7);
        assert_eq!(
            chunks[4],
            Chunk::Code(vec!["make -j4 all".to_string(), "make install".to_string()])
        );
        assert_eq!(
            chunks[1],
            Chunk::Line("              do not ignore entries".to_string())
        );
        assert!(matches!(chunks.last(), Some(Chunk::Line(line)) if line.contains("Afterwards")));
    }

    #[test]
    fn test_tidy_keeps_blank_lines_inside_fences() {
        let lines = ["", "a", "", "", "```", "x", "", "", "y", "```", "", ""]
            .map(String::from)
            .to_vec();
        assert_eq!(tidy(lines), "a\n\n```\nx\n\n\ny\n```");
    }

    #[test]
    fn test_artifacts_are_reported() {
        let (text, report) = normalize_with_report("N\u{8}NAME\nplain", Mode::Plain);
        assert_eq!(text, "NAME\nplain");
        assert_eq!(report.artifacts_stripped, 1);
        assert_eq!(report.source, SourceKind::Rendered);
    }
}
