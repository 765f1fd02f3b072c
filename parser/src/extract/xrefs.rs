//! SEE ALSO cross-references.

use std::collections::HashSet;
use std::sync::LazyLock;

use man_structure_core::{CrossReference, MAX_CROSS_REFERENCES, Section};
use regex::Regex;

use super::{section_texts, sections_where};
use crate::util::leading_number;

// SAFETY: These regexes are compile-time constants and are validated by tests.
static XREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z0-9_][A-Za-z0-9_.:+-]*)\s?\(([0-9][A-Za-z0-9]*)\)")
        .expect("static regex must compile")
});

/// Collects `name(section)` citations from SEE ALSO and the distinct command
/// names they mention.
///
/// References to `name` itself are excluded, duplicates of the same
/// `(name, section)` are dropped, and at most [`MAX_CROSS_REFERENCES`] are
/// kept.
///
/// # Examples
///
/// ```
/// use man_structure_core::{CrossReference, Section};
/// use man_structure_parser::extract::xrefs::extract_cross_references;
///
/// let sections = vec![Section::new("see-also", "SEE ALSO", "ls(1), cp(1), ls(1)", 1)];
/// let (see_also, related) = extract_cross_references(&sections, "ls");
/// assert_eq!(see_also, vec![CrossReference::new("cp", 1)]);
/// assert_eq!(related, vec!["cp".to_string()]);
/// ```
pub fn extract_cross_references(
    sections: &[Section],
    name: &str,
) -> (Vec<CrossReference>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut references = Vec::new();

    let texts = sections_where(sections, |title| title.contains("SEE ALSO")).flat_map(section_texts);
    'texts: for text in texts {
        for captures in XREF_RE.captures_iter(text) {
            if references.len() >= MAX_CROSS_REFERENCES {
                break 'texts;
            }
            let cited = captures[1].trim_end_matches(['.', ':', '-']);
            let Some(section) = leading_number(&captures[2]) else {
                continue;
            };
            if cited.is_empty() || cited.eq_ignore_ascii_case(name) {
                continue;
            }
            if seen.insert((cited.to_string(), section)) {
                references.push(CrossReference::new(cited, section));
            }
        }
    }

    let mut names = HashSet::new();
    let related = references
        .iter()
        .filter(|reference| names.insert(reference.name.to_lowercase()))
        .map(|reference| reference.name.clone())
        .collect();

    (references, related)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn see_also(content: &str, name: &str) -> (Vec<CrossReference>, Vec<String>) {
        extract_cross_references(&[Section::new("see-also", "SEE ALSO", content, 1)], name)
    }

    #[test]
    fn test_sections_with_suffixes_and_spacing() {
        let (refs, _) = see_also("printf(3), tar (1), systemd.unit(5), Git::Repo(3pm)", "x");
        assert_eq!(
            refs,
            vec![
                CrossReference::new("printf", 3),
                CrossReference::new("tar", 1),
                CrossReference::new("systemd.unit", 5),
                CrossReference::new("Git::Repo", 3),
            ]
        );
    }

    #[test]
    fn test_related_commands_are_case_insensitive_distinct() {
        let (refs, related) = see_also("stat(1), stat(2), Stat(3)", "ls");
        assert_eq!(refs.len(), 3);
        assert_eq!(related, vec!["stat"]);
    }

    #[test]
    fn test_self_reference_excluded_ignoring_case() {
        let (refs, _) = see_also("LS(1), dir(1)", "ls");
        assert_eq!(refs, vec![CrossReference::new("dir", 1)]);
    }

    #[test]
    fn test_cap_at_fifteen() {
        let content = (0..30).map(|i| format!("cmd{i}(1)")).collect::<Vec<_>>().join(", ");
        let (refs, related) = see_also(&content, "ls");
        assert_eq!(refs.len(), MAX_CROSS_REFERENCES);
        assert_eq!(refs[14].name, "cmd14");
        assert_eq!(related.len(), MAX_CROSS_REFERENCES);
    }

    #[test]
    fn test_no_see_also_section() {
        let (refs, related) = extract_cross_references(&[], "ls");
        assert!(refs.is_empty());
        assert!(related.is_empty());
    }
}
