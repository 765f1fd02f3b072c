//! Name, title and description extraction.

use std::sync::LazyLock;

use man_structure_core::{PLACEHOLDER_DESCRIPTION, Section};
use regex::Regex;

use super::{PageHeader, paragraphs};
use crate::util::collapse_whitespace;

/// Paragraphs shorter than this are not used as a fallback description.
const MIN_FALLBACK_PARAGRAPH_CHARS: usize = 30;

// SAFETY: These regexes are compile-time constants and are validated by tests.
static NAME_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+[-\u{2010}\u{2013}\u{2014}]{1,2}\s+").expect("static regex must compile")
});

/// Splits a NAME line (`ls, dir - list directory contents`) into the name
/// list and the one-line summary.
///
/// # Examples
///
/// ```
/// use man_structure_parser::extract::title::split_name_line;
///
/// assert_eq!(
///     split_name_line("ls - list directory contents"),
///     ("ls".to_string(), Some("list directory contents".to_string()))
/// );
/// assert_eq!(split_name_line("ls"), ("ls".to_string(), None));
/// ```
pub fn split_name_line(text: &str) -> (String, Option<String>) {
    let text = collapse_whitespace(text);
    match NAME_SPLIT_RE.find(&text) {
        Some(found) => {
            let summary = text[found.end()..].trim();
            (
                text[..found.start()].trim().to_string(),
                (!summary.is_empty()).then(|| summary.to_string()),
            )
        }
        None => (text, None),
    }
}

fn name_section(sections: &[Section]) -> Option<&Section> {
    sections
        .iter()
        .find(|section| section.is_titled("NAME") && !section.content.trim().is_empty())
}

/// Resolves the document name: caller hint, then the first NAME entry, then
/// the page header title.
pub fn resolve_name(hint: &str, sections: &[Section], header: Option<&PageHeader>) -> String {
    let hint = hint.trim();
    if !hint.is_empty() {
        return hint.to_string();
    }

    let from_name = name_section(sections).and_then(|section| {
        let (names, _) = split_name_line(&section.content);
        names
            .split(',')
            .next()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    });

    from_name
        .or_else(|| {
            header
                .and_then(|header| header.title.as_deref())
                .map(str::to_lowercase)
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Extracts `(title, description)`.
///
/// Title: NAME summary, first NAME line, first DESCRIPTION paragraph,
/// first long paragraph anywhere, placeholder.
/// Description: first DESCRIPTION paragraph, NAME summary, first long
/// paragraph anywhere, placeholder.
pub fn extract_title(sections: &[Section], full_text: &str) -> (String, String) {
    let name = name_section(sections);
    let summary = name.and_then(|section| split_name_line(&section.content).1);
    let first_name_line = name.and_then(|section| {
        section
            .content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
    });

    let description_paragraph = sections
        .iter()
        .find(|section| section.is_titled("DESCRIPTION"))
        .and_then(|section| {
            let mut texts = std::iter::once(section.content.as_str())
                .chain(section.subsections.iter().map(|sub| sub.content.as_str()));
            texts.find_map(|text| paragraphs(text).into_iter().next())
        });

    let long_paragraph = || {
        paragraphs(full_text)
            .into_iter()
            .find(|paragraph| paragraph.chars().count() > MIN_FALLBACK_PARAGRAPH_CHARS)
    };

    let title = summary
        .clone()
        .or(first_name_line)
        .or_else(|| description_paragraph.clone())
        .or_else(long_paragraph)
        .unwrap_or_else(|| PLACEHOLDER_DESCRIPTION.to_string());

    let description = description_paragraph
        .or(summary)
        .or_else(long_paragraph)
        .unwrap_or_else(|| PLACEHOLDER_DESCRIPTION.to_string());

    (title, description)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(title: &str, content: &str) -> Section {
        Section::new(&title.to_lowercase(), title, content, 1)
    }

    #[test]
    fn test_title_from_name_section() {
        let sections = vec![
            section("NAME", "ls - list directory contents"),
            section("DESCRIPTION", "List information about the FILEs.\n\nMore."),
        ];
        let (title, description) = extract_title(&sections, "");
        assert_eq!(title, "list directory contents");
        assert_eq!(description, "List information about the FILEs.");
    }

    #[test]
    fn test_name_split_variants() {
        assert_eq!(
            split_name_line("git-rebase \u{2014} Reapply commits").1.as_deref(),
            Some("Reapply commits")
        );
        assert_eq!(
            split_name_line("ls, dir, vdir -- list\n   directory contents").1.as_deref(),
            Some("list directory contents")
        );
        assert_eq!(split_name_line("x-y - z").0, "x-y");
    }

    #[test]
    fn test_title_falls_back_to_description_paragraph() {
        let sections = vec![section(
            "DESCRIPTION",
            "Frobnicates widgets. Also does other things.\n\nSecond paragraph.",
        )];
        let (title, description) = extract_title(&sections, "");
        assert_eq!(title, "Frobnicates widgets. Also does other things.");
        assert_eq!(description, title);
    }

    #[test]
    fn test_description_falls_back_to_name_summary() {
        let sections = vec![section("NAME", "tool - does a thing")];
        let (_, description) = extract_title(&sections, "");
        assert_eq!(description, "does a thing");
    }

    #[test]
    fn test_placeholder_when_nothing_usable() {
        let (title, description) = extract_title(&[], "short words");
        assert_eq!(title, PLACEHOLDER_DESCRIPTION);
        assert_eq!(description, PLACEHOLDER_DESCRIPTION);
    }

    #[test]
    fn test_long_paragraph_fallback() {
        let text = "tiny\n\nThis paragraph is definitely longer than thirty characters.";
        let (title, description) = extract_title(&[], text);
        assert_eq!(title, "This paragraph is definitely longer than thirty characters.");
        assert_eq!(description, title);
    }

    #[test]
    fn test_resolve_name_chain() {
        let sections = vec![section("NAME", "ls, dir - list")];
        assert_eq!(resolve_name(" grep ", &sections, None), "grep");
        assert_eq!(resolve_name("", &sections, None), "ls");
        let header = PageHeader {
            title: Some("TAR".into()),
            ..PageHeader::default()
        };
        assert_eq!(resolve_name("", &[], Some(&header)), "tar");
        assert_eq!(resolve_name("", &[], None), "unknown");
    }
}
