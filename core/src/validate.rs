//! Structured document validation.
//!
//! Checks the output invariants every [`StructuredDocument`] must satisfy
//! before it is handed to a renderer or indexer: the NAME section is folded
//! away, short sections are dropped, flags are unique by canonical token, and
//! cross-references never point back at the document itself.
//!
//! # Examples
//!
//! ```
//! use man_structure_core::*;
//!
//! let mut doc = StructuredDocument {
//!     name: "ls".into(),
//!     section: 1,
//!     title: "list directory contents".into(),
//!     description: "List information about the FILEs.".into(),
//!     synopsis: "ls [OPTION]... [FILE]...".into(),
//!     sections: Vec::new(),
//!     flags: vec![Flag::new("--all", "show hidden").with_short("-a")],
//!     examples: Vec::new(),
//!     related_commands: vec!["dir".into()],
//!     see_also: vec![CrossReference::new("dir", 1)],
//!     metadata: DocumentMetadata::default(),
//!     search_content: "ls list directory contents".into(),
//!     keywords: vec!["ls".into()],
//!     complexity: Complexity::Basic,
//!     hash: "0123456789abcdef".into(),
//!     parsed_at: "2024-01-01T00:00:00+00:00".into(),
//!     parse_version: PARSER_VERSION.into(),
//! };
//! assert!(validate_document(&doc).is_empty());
//!
//! // A self-reference is an invariant violation.
//! doc.see_also.push(CrossReference::new("LS", 1));
//! assert!(!validate_document(&doc).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{MAX_CROSS_REFERENCES, Section, StructuredDocument};

/// Minimum cleaned content length a kept section must exceed.
pub const MIN_SECTION_CONTENT_CHARS: usize = 5;

/// Document invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Document name is empty or whitespace-only.
    #[error("document name cannot be empty")]
    EmptyName,
    /// The NAME section survived assembly.
    #[error("NAME section must be folded into title/description")]
    NameSectionPresent,
    /// A section without subsections has too little content.
    #[error("section '{0}' has no meaningful content")]
    ShortSection(String),
    /// Two sections share an id.
    #[error("duplicate section id: {0}")]
    DuplicateSectionId(String),
    /// A flag token does not start with a dash.
    #[error("invalid flag token: {0}")]
    InvalidFlag(String),
    /// Two flags share a canonical token.
    #[error("duplicate flag: {0}")]
    DuplicateFlag(String),
    /// A cross-reference names the document itself.
    #[error("self reference in SEE ALSO: {0}")]
    SelfReference(String),
    /// The same `(name, section)` pair appears twice.
    #[error("duplicate cross reference: {0}({1})")]
    DuplicateCrossReference(String, u32),
    /// More cross-references than the cap allows.
    #[error("too many cross references: {0}")]
    TooManyCrossReferences(usize),
    /// An example has an empty command.
    #[error("example command cannot be empty")]
    EmptyExampleCommand,
}

/// Validates a structured document and returns every violation found.
pub fn validate_document(doc: &StructuredDocument) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if doc.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }

    let mut ids = HashSet::new();
    validate_sections(&doc.sections, &mut ids, &mut errors);

    errors.extend(validate_flags(doc));
    errors.extend(validate_cross_references(doc));

    if doc.examples.iter().any(|ex| ex.command.trim().is_empty()) {
        errors.push(ValidationError::EmptyExampleCommand);
    }

    errors
}

fn validate_sections<'a>(
    sections: &'a [Section],
    ids: &mut HashSet<&'a str>,
    errors: &mut Vec<ValidationError>,
) {
    for section in sections {
        if section.level == 1 && section.is_titled("NAME") {
            errors.push(ValidationError::NameSectionPresent);
        }
        if section.content.trim().chars().count() <= MIN_SECTION_CONTENT_CHARS
            && section.subsections.is_empty()
        {
            errors.push(ValidationError::ShortSection(section.title.clone()));
        }
        if !ids.insert(section.id.as_str()) {
            errors.push(ValidationError::DuplicateSectionId(section.id.clone()));
        }
        validate_sections(&section.subsections, ids, errors);
    }
}

fn validate_flags(doc: &StructuredDocument) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for flag in &doc.flags {
        let short_ok = flag.short_flag.as_deref().is_none_or(|s| s.starts_with('-'));
        if !flag.flag.starts_with('-') || !short_ok {
            errors.push(ValidationError::InvalidFlag(flag.flag.clone()));
        }
        if !seen.insert(flag.flag.as_str()) {
            errors.push(ValidationError::DuplicateFlag(flag.flag.clone()));
        }
    }

    errors
}

fn validate_cross_references(doc: &StructuredDocument) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    if doc.see_also.len() > MAX_CROSS_REFERENCES {
        errors.push(ValidationError::TooManyCrossReferences(doc.see_also.len()));
    }

    for xref in &doc.see_also {
        if xref.name.eq_ignore_ascii_case(&doc.name) {
            errors.push(ValidationError::SelfReference(xref.name.clone()));
        }
        if !seen.insert((xref.name.as_str(), xref.section)) {
            errors.push(ValidationError::DuplicateCrossReference(
                xref.name.clone(),
                xref.section,
            ));
        }
    }

    for name in &doc.related_commands {
        if name.eq_ignore_ascii_case(&doc.name) {
            errors.push(ValidationError::SelfReference(name.clone()));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;

    fn document() -> StructuredDocument {
        StructuredDocument {
            name: "tar".into(),
            section: 1,
            title: "an archiving utility".into(),
            description: "GNU tar saves many files together.".into(),
            synopsis: "tar [OPTION...] [FILE]...".into(),
            sections: vec![Section::new(
                "description",
                "DESCRIPTION",
                "GNU tar saves many files together.",
                1,
            )],
            flags: vec![Flag::new("--file", "use archive file").with_short("-f")],
            examples: Vec::new(),
            related_commands: Vec::new(),
            see_also: Vec::new(),
            metadata: DocumentMetadata::default(),
            search_content: "tar".into(),
            keywords: vec!["tar".into()],
            complexity: Complexity::Advanced,
            hash: "0000000000000000".into(),
            parsed_at: "2024-01-01T00:00:00+00:00".into(),
            parse_version: PARSER_VERSION.into(),
        }
    }

    #[test]
    fn test_valid_document_has_no_errors() {
        assert!(validate_document(&document()).is_empty());
    }

    #[test]
    fn test_name_section_is_rejected() {
        let mut doc = document();
        doc.sections
            .push(Section::new("name", "NAME", "tar - an archiving utility", 1));
        assert!(validate_document(&doc).contains(&ValidationError::NameSectionPresent));
    }

    #[test]
    fn test_short_section_without_subsections_is_rejected() {
        let mut doc = document();
        doc.sections.push(Section::new("bugs", "BUGS", "none", 1));
        assert!(
            validate_document(&doc)
                .contains(&ValidationError::ShortSection("BUGS".to_string()))
        );
    }

    #[test]
    fn test_short_section_with_subsections_is_kept() {
        let mut doc = document();
        let mut options = Section::new("options", "OPTIONS", "", 1);
        options.subsections.push(Section::new(
            "operation-mode",
            "Operation mode",
            "-c, --create  create a new archive",
            2,
        ));
        doc.sections.push(options);
        assert!(validate_document(&doc).is_empty());
    }

    #[test]
    fn test_duplicate_flags_and_xrefs_are_reported() {
        let mut doc = document();
        doc.flags.push(Flag::new("--file", "again"));
        doc.see_also.push(CrossReference::new("gzip", 1));
        doc.see_also.push(CrossReference::new("gzip", 1));
        let errors = validate_document(&doc);
        assert!(errors.contains(&ValidationError::DuplicateFlag("--file".to_string())));
        assert!(errors.contains(&ValidationError::DuplicateCrossReference(
            "gzip".to_string(),
            1
        )));
    }

    #[test]
    fn test_cross_reference_cap() {
        let mut doc = document();
        doc.see_also = (0..16)
            .map(|i| CrossReference::new(&format!("tool{i}"), 1))
            .collect();
        assert!(validate_document(&doc).contains(&ValidationError::TooManyCrossReferences(16)));
    }

    #[test]
    fn test_invalid_flag_token() {
        let mut doc = document();
        doc.flags.push(Flag::new("verbose", "no dash"));
        assert!(validate_document(&doc).contains(&ValidationError::InvalidFlag("verbose".to_string())));
    }
}
