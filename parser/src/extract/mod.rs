//! Field extractors.
//!
//! Each extractor reads plain-text [`Section`]s produced by the segmenter
//! and never fails: heuristics that find nothing yield empty values or the
//! documented fallbacks.

pub mod examples;
pub mod flags;
pub mod metadata;
pub mod synopsis;
pub mod title;
pub mod xrefs;

use man_structure_core::{CrossReference, DocumentMetadata, Example, Flag, Section};
use tracing::debug;

use crate::util::{collapse_whitespace, is_all_caps_heading, is_banner, running_header_section};

pub use metadata::PageHeader;

/// Inputs shared by all extractors.
#[derive(Debug, Clone, Copy)]
pub struct ExtractInput<'a> {
    /// Plain-text sections.
    pub sections: &'a [Section],
    /// Whole plain normalized text, for fallbacks that look past sections.
    pub full_text: &'a str,
    pub name_hint: &'a str,
    pub section_hint: Option<u32>,
    pub header: Option<&'a PageHeader>,
}

/// Everything the extractors pull out of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub name: String,
    pub section: u32,
    pub title: String,
    pub description: String,
    pub synopsis: String,
    pub flags: Vec<Flag>,
    pub examples: Vec<Example>,
    pub see_also: Vec<CrossReference>,
    pub related_commands: Vec<String>,
    pub metadata: DocumentMetadata,
}

/// Runs every extractor over `input`.
pub fn extract(input: &ExtractInput<'_>) -> Extraction {
    let name = title::resolve_name(input.name_hint, input.sections, input.header);
    let section = input
        .section_hint
        .or_else(|| input.header.and_then(|header| header.section))
        .or_else(|| running_header_section(input.full_text))
        .unwrap_or(1);

    let (title, description) = title::extract_title(input.sections, input.full_text);
    let synopsis = synopsis::extract_synopsis(input.sections);

    let mut flags = flags::extract_flags(input.sections);
    let from_synopsis = synopsis::synopsis_flags(&synopsis, &flags);
    flags.extend(from_synopsis);

    let examples = examples::extract_examples(input.sections, &name);
    let (see_also, related_commands) = xrefs::extract_cross_references(input.sections, &name);
    let metadata = metadata::extract_metadata(input.header, input.sections);

    debug!(
        name = %name,
        section,
        flags = flags.len(),
        examples = examples.len(),
        see_also = see_also.len(),
        "extracted fields"
    );

    Extraction {
        name,
        section,
        title,
        description,
        synopsis,
        flags,
        examples,
        see_also,
        related_commands,
        metadata,
    }
}

/// Top-level sections whose title satisfies `matches`.
pub(crate) fn sections_where<'a>(
    sections: &'a [Section],
    matches: impl Fn(&str) -> bool,
) -> impl Iterator<Item = &'a Section> {
    sections
        .iter()
        .filter(move |section| matches(&section.title.to_uppercase()))
}

/// The content of a section followed by the content of its subsections.
pub(crate) fn section_texts(section: &Section) -> impl Iterator<Item = &str> {
    std::iter::once(section.content.as_str()).chain(
        section
            .subsections
            .iter()
            .map(|subsection| subsection.content.as_str()),
    )
}

/// Splits text into blank-line separated paragraphs, each collapsed to one
/// line. Banner and heading lines are skipped.
pub(crate) fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                out.push(collapse_whitespace(&current.join(" ")));
                current.clear();
            }
            continue;
        }
        if is_banner(trimmed) || trimmed.starts_with('#') || is_all_caps_heading(trimmed) {
            continue;
        }
        current.push(trimmed);
    }
    if !current.is_empty() {
        out.push(collapse_whitespace(&current.join(" ")));
    }

    out
}
