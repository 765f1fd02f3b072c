//! Document type definitions for structured manual pages.
//!
//! This module defines the data model produced by the parser and consumed by
//! renderers and search indexers. Every type serializes with [`serde`] using
//! camelCase field names, which is the wire shape external collaborators
//! depend on.

use serde::{Deserialize, Serialize};

/// Version of the parser output contract (semver).
///
/// Embedded in every [`StructuredDocument`] as `parseVersion` and mixed into
/// the content hash, so caches keyed by hash are invalidated when the
/// extraction heuristics change.
pub const PARSER_VERSION: &str = "1.0.0";

/// Description used when no NAME, DESCRIPTION, or long paragraph exists.
pub const PLACEHOLDER_DESCRIPTION: &str = "No description available.";

/// Maximum number of cross-references kept in [`StructuredDocument::see_also`].
pub const MAX_CROSS_REFERENCES: usize = 15;

/// Raw input handed over by the source acquirer, one per parse call.
///
/// `raw_formatted_text` is either roff source or text already rendered by the
/// `man` pipeline; the parser detects which. `raw_groff_source` is optional and
/// only feeds [`DocumentMetadata`].
///
/// # Examples
///
/// ```
/// use man_structure_core::RawDocument;
///
/// let raw = RawDocument::new("ls", "NAME\n       ls - list directory contents\n")
///     .with_section(1);
/// assert_eq!(raw.command_name_hint, "ls");
/// assert_eq!(raw.section_hint, Some(1));
/// assert!(raw.raw_groff_source.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    /// Manual text as produced by `man` (or raw roff).
    pub raw_formatted_text: String,
    /// Raw troff source, when the acquirer could read it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_groff_source: Option<String>,
    /// Command name the caller asked for.
    pub command_name_hint: String,
    /// Manual section the caller asked for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_hint: Option<u32>,
    /// Pre-segmented sections; bypasses text segmentation when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<SectionInput>>,
}

impl RawDocument {
    /// Creates a raw document from formatted text.
    pub fn new(command_name_hint: &str, raw_formatted_text: &str) -> Self {
        Self {
            raw_formatted_text: raw_formatted_text.to_string(),
            raw_groff_source: None,
            command_name_hint: command_name_hint.to_string(),
            section_hint: None,
            sections: None,
        }
    }

    /// Attaches raw troff source.
    pub fn with_groff_source(mut self, source: &str) -> Self {
        self.raw_groff_source = Some(source.to_string());
        self
    }

    /// Sets the section hint.
    pub fn with_section(mut self, section: u32) -> Self {
        self.section_hint = Some(section);
        self
    }

    /// Supplies pre-segmented sections.
    pub fn with_sections(mut self, sections: Vec<SectionInput>) -> Self {
        self.sections = Some(sections);
        self
    }
}

/// Upstream section shape for the structured input path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionInput {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsections: Vec<SectionInput>,
}

impl SectionInput {
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            content: content.to_string(),
            subsections: Vec::new(),
        }
    }

    pub fn with_subsection(mut self, subsection: SectionInput) -> Self {
        self.subsections.push(subsection);
        self
    }
}

/// A top-level section (`level == 1`) or subsection (`level == 2`).
///
/// # Examples
///
/// ```
/// use man_structure_core::Section;
///
/// let section = Section::new("see-also", "SEE ALSO", "cp(1), mv(1)", 1);
/// assert!(section.subsections.is_empty());
/// assert!(section.is_titled("see also"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Slug, unique within one document.
    pub id: String,
    pub title: String,
    pub content: String,
    pub level: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsections: Vec<Section>,
}

impl Section {
    pub fn new(id: &str, title: &str, content: &str, level: u8) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            level,
            subsections: Vec::new(),
        }
    }

    /// Case- and whitespace-insensitive title comparison.
    pub fn is_titled(&self, title: &str) -> bool {
        normalize_title(&self.title) == normalize_title(title)
    }
}

fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// A documented command-line option.
///
/// `flag` is the canonical token: the long form when one exists, otherwise
/// the only form given.
///
/// # Examples
///
/// ```
/// use man_structure_core::Flag;
///
/// let flag = Flag::new("--all", "do not ignore entries starting with .")
///     .with_short("-a");
/// assert_eq!(flag.flag, "--all");
/// assert!(flag.matches("-a"));
/// assert!(!flag.deprecated);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    pub flag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
    pub description: String,
    /// The argument is bracketed (`--color[=WHEN]`).
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,
}

impl Flag {
    pub fn new(flag: &str, description: &str) -> Self {
        Self {
            flag: flag.to_string(),
            short_flag: None,
            argument: None,
            description: description.to_string(),
            optional: false,
            deprecated: false,
        }
    }

    pub fn with_short(mut self, short: &str) -> Self {
        self.short_flag = Some(short.to_string());
        self
    }

    pub fn with_argument(mut self, argument: &str) -> Self {
        self.argument = Some(argument.to_string());
        self
    }

    /// Checks if `token` names this flag in either form.
    pub fn matches(&self, token: &str) -> bool {
        self.flag == token || self.short_flag.as_deref() == Some(token)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A usage example taken from the EXAMPLES section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    /// Command line without the shell prompt.
    pub command: String,
    /// Prose attached to the command; empty when none was found.
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Shell features used by the command (`pipe`, `redirect`, `sudo`, ...).
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A `name(section)` citation from SEE ALSO.
///
/// # Examples
///
/// ```
/// use man_structure_core::CrossReference;
///
/// let xref = CrossReference::new("cp", 1);
/// assert_eq!(serde_json::to_string(&xref).unwrap(), r#"{"name":"cp","section":1}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrossReference {
    pub name: String,
    pub section: u32,
}

impl CrossReference {
    pub fn new(name: &str, section: u32) -> Self {
        Self {
            name: name.to_string(),
            section,
        }
    }
}

/// Coarse difficulty class used by the UI for badges and sorting.
///
/// # Examples
///
/// ```
/// use man_structure_core::Complexity;
///
/// assert_eq!(Complexity::default(), Complexity::Intermediate);
/// assert_eq!(serde_json::to_string(&Complexity::Basic).unwrap(), "\"basic\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Basic,
    #[default]
    Intermediate,
    Advanced,
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

/// Page metadata from the `.TH` (or mdoc `.Dd`/`.Dt`/`.Os`) header and the
/// AUTHOR section.
///
/// Every field is `None` when no troff source was available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Source package, e.g. `GNU coreutils 9.4`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Manual title, e.g. `User Commands`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual: Option<String>,
    /// Trailing version token of `source`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl DocumentMetadata {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// The immutable parse result handed to renderers and indexers.
///
/// Two parses of identical input with the same [`PARSER_VERSION`] produce
/// equal documents except for `parsed_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredDocument {
    pub name: String,
    pub section: u32,
    pub title: String,
    pub description: String,
    pub synopsis: String,
    pub sections: Vec<Section>,
    pub flags: Vec<Flag>,
    pub examples: Vec<Example>,
    pub related_commands: Vec<String>,
    pub see_also: Vec<CrossReference>,
    pub metadata: DocumentMetadata,
    pub search_content: String,
    pub keywords: Vec<String>,
    pub complexity: Complexity,
    pub hash: String,
    /// RFC 3339 UTC timestamp.
    pub parsed_at: String,
    pub parse_version: String,
}

impl StructuredDocument {
    /// Looks up a top-level section by title.
    pub fn find_section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.is_titled(title))
    }

    /// Looks up a flag by long or short form.
    pub fn find_flag(&self, token: &str) -> Option<&Flag> {
        self.flags.iter().find(|flag| flag.matches(token))
    }

    /// Returns `true` when `other` matches this document in every field except
    /// the parse timestamp.
    pub fn same_content(&self, other: &StructuredDocument) -> bool {
        let mut normalized = other.clone();
        normalized.parsed_at.clone_from(&self.parsed_at);
        self == &normalized
    }
}

/// Runtime options; the only configurable surface of the parser.
///
/// # Examples
///
/// ```
/// use man_structure_core::ParseOptions;
///
/// let options = ParseOptions::default();
/// assert!(options.convert_to_markdown);
/// assert!(!options.preserve_formatting);
///
/// let parsed: ParseOptions = serde_json::from_str(r#"{"preserveFormatting":true}"#).unwrap();
/// assert!(parsed.convert_to_markdown);
/// assert!(parsed.preserve_formatting);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    /// Render section content as light markdown instead of plain text.
    pub convert_to_markdown: bool,
    /// Keep normalized line breaks instead of reflowing prose paragraphs.
    pub preserve_formatting: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            convert_to_markdown: true,
            preserve_formatting: false,
        }
    }
}

impl ParseOptions {
    /// Plain-text options, keeping line structure.
    pub fn plain() -> Self {
        Self {
            convert_to_markdown: false,
            preserve_formatting: true,
        }
    }
}
