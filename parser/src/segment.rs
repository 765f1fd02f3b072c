//! Section segmentation of normalized man text.
//!
//! Headings are found by [`heading_of`]: all-caps or `##` lines open
//! top-level sections, 3-column titles or `###` lines open subsections.
//! Running headers, footers and page numbers are dropped from content, and
//! content is dedented by the detected body indent.

use std::collections::HashSet;

use man_structure_core::{Section, SectionInput};

use crate::normalize::escapes::decode_plain;
use crate::normalize::{Mode, normalize};
use crate::util::{
    HeadingLevel, body_indent, collapse_whitespace, heading_of, indent_width, is_banner, is_fence,
    slugify,
};

/// Segmentation result with the counters reported in diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmented {
    pub sections: Vec<Section>,
    pub banners_dropped: usize,
}

/// Splits normalized text into ordered sections.
///
/// # Examples
///
/// ```
/// use man_structure_parser::segment::segment;
///
/// let sections = segment("NAME\n       ls - list\n\nSEE ALSO\n       cp(1)\n");
/// assert_eq!(sections.len(), 2);
/// assert_eq!(sections[0].id, "name");
/// assert_eq!(sections[1].content, "cp(1)");
/// ```
pub fn segment(text: &str) -> Vec<Section> {
    segment_with_stats(text).sections
}

#[derive(Debug, Default)]
struct Draft<'a> {
    title: String,
    lines: Vec<&'a str>,
    subsections: Vec<Draft<'a>>,
}

/// Like [`segment`], also counting dropped banner lines.
pub fn segment_with_stats(text: &str) -> Segmented {
    let lines = text.lines().collect::<Vec<_>>();
    let base = body_indent(lines.iter().copied());

    let mut drafts: Vec<Draft<'_>> = Vec::new();
    let mut banners_dropped = 0;
    let mut in_fence = false;

    for line in lines {
        if is_fence(line) {
            in_fence = !in_fence;
        } else if !in_fence {
            let trimmed = line.trim();
            if is_banner(trimmed) {
                banners_dropped += 1;
                continue;
            }
            if let Some(heading) = heading_of(line, base) {
                let draft = Draft {
                    title: heading.title,
                    ..Draft::default()
                };
                match (heading.level, drafts.last_mut()) {
                    (HeadingLevel::Subsection, Some(parent)) => parent.subsections.push(draft),
                    _ => drafts.push(draft),
                }
                continue;
            }
        }

        let Some(current) = drafts.last_mut() else {
            continue;
        };
        match current.subsections.last_mut() {
            Some(sub) => sub.lines.push(line),
            None => current.lines.push(line),
        }
    }

    let mut ids = HashSet::new();
    let sections = drafts
        .into_iter()
        .map(|draft| build_section(draft, base, 1, &mut ids))
        .collect();

    Segmented {
        sections,
        banners_dropped,
    }
}

fn build_section(draft: Draft<'_>, base: usize, level: u8, ids: &mut HashSet<String>) -> Section {
    let id = unique_id(&draft.title, ids);
    let mut section = Section::new(&id, &draft.title, &clean_lines(&draft.lines, base), level);
    section.subsections = draft
        .subsections
        .into_iter()
        .map(|sub| build_section(sub, base, 2, ids))
        .collect();
    section
}

/// Splits pre-segmented upstream sections, normalizing each content the
/// same way the flat-text path does.
pub fn segment_structured(inputs: &[SectionInput], mode: Mode) -> Vec<Section> {
    let mut ids = HashSet::new();
    inputs
        .iter()
        .map(|input| structured_section(input, mode, 1, &mut ids))
        .collect()
}

fn structured_section(
    input: &SectionInput,
    mode: Mode,
    level: u8,
    ids: &mut HashSet<String>,
) -> Section {
    let title = collapse_whitespace(&decode_plain(&input.title));
    let id = unique_id(&title, ids);
    let normalized = normalize(&input.content, mode);
    let lines = normalized
        .lines()
        .filter(|line| !is_banner(line.trim()))
        .collect::<Vec<_>>();
    let base = body_indent(lines.iter().copied());

    let mut section = Section::new(&id, &title, &clean_lines(&lines, base), level);
    // Only two levels exist: deeper upstream nesting is flattened.
    for sub in &input.subsections {
        let mut child = structured_section(sub, mode, 2, ids);
        let grandchildren = std::mem::take(&mut child.subsections);
        section.subsections.push(child);
        section.subsections.extend(grandchildren);
    }
    section
}

/// Dedents by `base`, trims line ends, and strips surrounding blank lines.
fn clean_lines(lines: &[&str], base: usize) -> String {
    let mut cleaned = lines
        .iter()
        .map(|line| {
            let cut = indent_width(line).min(base);
            line.get(cut..).unwrap_or_else(|| line.trim_start()).trim_end()
        })
        .skip_while(|line| line.is_empty())
        .collect::<Vec<_>>();
    while cleaned.last().is_some_and(|line| line.is_empty()) {
        cleaned.pop();
    }
    cleaned.join("\n")
}

/// Returns a slug for `title` that is unique among `ids`.
fn unique_id(title: &str, ids: &mut HashSet<String>) -> String {
    let slug = slugify(title);
    let mut candidate = slug.clone();
    let mut counter = 2;
    while ids.contains(&candidate) {
        candidate = format!("{slug}-{counter}");
        counter += 1;
    }
    ids.insert(candidate.clone());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    const RENDERED: &str = "\
LS(1)                     User Commands                    LS(1)

NAME
       ls - list directory contents

DESCRIPTION
       List information about the FILEs.

   Sorting
       -t     sort by time

SEE ALSO
       cp(1)

GNU coreutils 9.4               April 2024                        LS(1)
";

    #[test]
    fn test_segments_rendered_page() {
        let segmented = segment_with_stats(RENDERED);
        let titles = segmented
            .sections
            .iter()
            .map(|s| s.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["NAME", "DESCRIPTION", "SEE ALSO"]);
        assert_eq!(segmented.banners_dropped, 2);

        let description = &segmented.sections[1];
        assert_eq!(description.content, "List information about the FILEs.");
        assert_eq!(description.subsections.len(), 1);
        assert_eq!(description.subsections[0].title, "Sorting");
        assert_eq!(description.subsections[0].level, 2);
        assert_eq!(description.subsections[0].content, "-t     sort by time");
        assert_eq!(segmented.sections[2].content, "cp(1)");
    }

    #[test]
    fn test_markdown_headings() {
        let sections = segment("## NAME\n\nls - list\n\n### Details\n\nmore text\n");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content, "ls - list");
        assert_eq!(sections[0].subsections[0].id, "details");
    }

    #[test]
    fn test_fenced_content_is_not_split() {
        let sections = segment("## EXAMPLES\n\n```\nSELECT ALL\n```\n");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content, "```\nSELECT ALL\n```");
    }

    #[test]
    fn test_duplicate_titles_get_unique_ids() {
        let sections = segment("NOTES\nfirst note\nNOTES\nsecond note\n");
        assert_eq!(sections[0].id, "notes");
        assert_eq!(sections[1].id, "notes-2");
    }

    #[test]
    fn test_text_without_headings_has_no_sections() {
        assert!(segment("just some prose without any heading").is_empty());
    }

    #[test]
    fn test_structured_path_matches_flat_path() {
        let flat = segment("NAME\nls - list\n\nDESCRIPTION\nList files.\n   Sorting\n-t  sort by time\n");
        let structured = segment_structured(
            &[
                SectionInput::new("NAME", "ls - list"),
                SectionInput::new("DESCRIPTION", "List files.")
                    .with_subsection(SectionInput::new("Sorting", "-t  sort by time")),
            ],
            Mode::Plain,
        );
        assert_eq!(flat, structured);
    }
}
