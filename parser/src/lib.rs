//! Structured manual-page parser.
//!
//! Turns the raw text of a Unix manual page, either roff source or output
//! already rendered by `man`, into a [`StructuredDocument`]:
//!
//! 1. [`normalize`] strips terminal artifacts and renders roff escapes and
//!    macros into plain text or light markdown.
//! 2. [`segment`] splits the text into ordered sections and subsections.
//! 3. [`extract`] pulls the title, synopsis, options, examples, SEE ALSO
//!    references and page metadata out of the plain-text sections.
//! 4. [`assemble`] builds the final document with its derived search
//!    fields, complexity class and content hash.
//!
//! Parsing never fails on odd input: unknown macros are dropped or marked,
//! and fields the heuristics cannot find are left empty. The only error is
//! [`ParseError::InputUnavailable`].
//!
//! # Example
//!
//! ```
//! use man_structure_core::{ParseOptions, RawDocument};
//! use man_structure_parser::parse_man_page;
//!
//! let roff = "\
//! .TH LS 1
//! .SH NAME
//! ls \\- list directory contents
//! .SH OPTIONS
//! .TP
//! \\fB\\-a\\fR, \\fB\\-\\-all\\fR
//! do not ignore entries starting with .
//! ";
//! let doc = parse_man_page(&RawDocument::new("ls", roff), &ParseOptions::default()).unwrap();
//! assert_eq!(doc.title, "list directory contents");
//! assert_eq!(doc.flags[0].flag, "--all");
//! assert!(doc.find_section("NAME").is_none());
//! ```

pub mod assemble;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod output;
pub mod segment;
mod util;

use man_structure_core::{ParseOptions, RawDocument, Section, StructuredDocument};
use rayon::prelude::*;
use tracing::{debug, warn};

pub use config::load_options;
pub use diagnostics::{InputPath, ParseDiagnostics};
pub use error::{ConfigError, ParseError, Result};
pub use normalize::{Mode, normalize};
pub use output::{OutputFormat, format_document};

use extract::{ExtractInput, PageHeader};
use normalize::{looks_like_roff, normalize_with_report};
use segment::{segment, segment_structured, segment_with_stats};

/// Minimum trimmed length of a usable input text.
pub const MIN_INPUT_CHARS: usize = 20;

/// Parser entry point holding the options and the diagnostics of the last
/// parse.
///
/// # Examples
///
/// ```
/// use man_structure_core::{ParseOptions, RawDocument};
/// use man_structure_parser::{ManPageParser, ParseError};
///
/// let mut parser = ManPageParser::new(ParseOptions::plain());
/// let err = parser.parse(&RawDocument::new("ls", "  ")).unwrap_err();
/// assert!(matches!(err, ParseError::InputUnavailable { .. }));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManPageParser {
    options: ParseOptions,
    diagnostics: ParseDiagnostics,
}

impl ManPageParser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            diagnostics: ParseDiagnostics::default(),
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Diagnostics of the most recent [`parse`](Self::parse) call.
    pub fn diagnostics(&self) -> &ParseDiagnostics {
        &self.diagnostics
    }

    /// Parses one raw document.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InputUnavailable`] when neither the formatted
    /// text nor the groff source has at least [`MIN_INPUT_CHARS`] characters
    /// and no structured sections were supplied.
    pub fn parse(&mut self, raw: &RawDocument) -> Result<StructuredDocument> {
        self.diagnostics = ParseDiagnostics::default();
        let (input_path, text) = select_input(raw)?;
        self.diagnostics.input_path = input_path;

        let output_mode = if self.options.convert_to_markdown {
            Mode::Markdown
        } else {
            Mode::Plain
        };

        let header = page_header(raw);

        let (plain_sections, output_sections, full_text) = match raw.sections.as_deref() {
            Some(inputs) if input_path == InputPath::StructuredSections => {
                let plain = segment_structured(inputs, Mode::Plain);
                let output = match output_mode {
                    Mode::Plain => plain.clone(),
                    Mode::Markdown => segment_structured(inputs, Mode::Markdown),
                };
                let full_text = normalize(text, Mode::Plain);
                (plain, output, full_text)
            }
            _ => self.segment_text(text, output_mode),
        };

        self.diagnostics.sections_found = plain_sections.len();
        let extraction = extract::extract(&ExtractInput {
            sections: &plain_sections,
            full_text: &full_text,
            name_hint: &raw.command_name_hint,
            section_hint: raw.section_hint,
            header: header.as_ref(),
        });
        self.diagnostics.flags_found = extraction.flags.len();
        self.diagnostics.examples_found = extraction.examples.len();

        debug!(
            input = ?self.diagnostics.input_path,
            source = ?self.diagnostics.source_kind,
            sections = self.diagnostics.sections_found,
            warnings = self.diagnostics.warnings().len(),
            "parsed man page"
        );

        Ok(assemble::assemble(
            extraction,
            output_sections,
            raw,
            &self.options,
        ))
    }

    /// Normalizes and segments flat text, returning plain sections, output
    /// sections, and the plain text used for fallbacks.
    fn segment_text(&mut self, text: &str, output_mode: Mode) -> (Vec<Section>, Vec<Section>, String) {
        let (plain, report) = normalize_with_report(text, Mode::Plain);
        let segmented = segment_with_stats(&plain);

        self.diagnostics.source_kind = Some(report.source);
        self.diagnostics.artifacts_stripped = report.artifacts_stripped;
        self.diagnostics.banners_dropped = segmented.banners_dropped;
        self.diagnostics.note_unknown_macros(report.unknown_macros);

        let output = match output_mode {
            Mode::Plain => segmented.sections.clone(),
            Mode::Markdown => segment(&normalize(text, Mode::Markdown)),
        };
        (segmented.sections, output, plain)
    }
}

/// Picks the text to parse: structured sections first, then the formatted
/// text, then the groff source.
fn select_input(raw: &RawDocument) -> Result<(InputPath, &str)> {
    let usable = |text: &str| text.trim().chars().count() >= MIN_INPUT_CHARS;

    if raw.sections.as_ref().is_some_and(|sections| !sections.is_empty()) {
        return Ok((InputPath::StructuredSections, raw.raw_formatted_text.as_str()));
    }
    if usable(&raw.raw_formatted_text) {
        return Ok((InputPath::FormattedText, raw.raw_formatted_text.as_str()));
    }
    if let Some(source) = raw.raw_groff_source.as_deref()
        && usable(source)
    {
        return Ok((InputPath::GroffSource, source));
    }

    let length = raw.raw_formatted_text.trim().chars().count();
    warn!(
        name = %raw.command_name_hint,
        length,
        minimum = MIN_INPUT_CHARS,
        "man page input unavailable"
    );
    Err(ParseError::InputUnavailable {
        length,
        minimum: MIN_INPUT_CHARS,
    })
}

/// Parses one document, returning `None` when the input is unavailable.
pub fn parse_man_page(raw: &RawDocument, options: &ParseOptions) -> Option<StructuredDocument> {
    ManPageParser::new(*options).parse(raw).ok()
}

/// Parses documents in parallel on the current rayon pool, preserving
/// input order.
pub fn parse_batch(raws: &[RawDocument], options: &ParseOptions) -> Vec<Result<StructuredDocument>> {
    raws.par_iter()
        .map(|raw| ManPageParser::new(*options).parse(raw))
        .collect()
}

/// Page header of a raw document, from its groff source or roff text.
pub fn page_header(raw: &RawDocument) -> Option<PageHeader> {
    raw.raw_groff_source
        .as_deref()
        .and_then(extract::metadata::read_header)
        .or_else(|| {
            looks_like_roff(&raw.raw_formatted_text)
                .then(|| extract::metadata::read_header(&raw.raw_formatted_text))
                .flatten()
        })
}

#[cfg(test)]
mod tests {
    use man_structure_core::SectionInput;

    use super::*;

    #[test]
    fn test_select_input_prefers_formatted_text() {
        let raw = RawDocument::new("ls", "NAME\n       ls - list directory contents\n")
            .with_groff_source(".TH LS 1\n.SH NAME\nls \\- list directory contents\n");
        assert_eq!(select_input(&raw).unwrap().0, InputPath::FormattedText);
    }

    #[test]
    fn test_select_input_falls_back_to_groff() {
        let raw = RawDocument::new("ls", "short")
            .with_groff_source(".TH LS 1\n.SH NAME\nls \\- list directory contents\n");
        assert_eq!(select_input(&raw).unwrap().0, InputPath::GroffSource);
    }

    #[test]
    fn test_select_input_unavailable() {
        let err = select_input(&RawDocument::new("ls", "   tiny   ")).unwrap_err();
        assert_eq!(
            err,
            ParseError::InputUnavailable {
                length: 4,
                minimum: MIN_INPUT_CHARS
            }
        );
    }

    #[test]
    fn test_structured_input_path() {
        let raw = RawDocument::new("ls", "").with_sections(vec![
            SectionInput::new("NAME", "ls - list directory contents"),
            SectionInput::new("DESCRIPTION", "List information about the FILEs."),
        ]);
        let mut parser = ManPageParser::new(ParseOptions::default());
        let doc = parser.parse(&raw).unwrap();
        assert_eq!(parser.diagnostics().input_path, InputPath::StructuredSections);
        assert_eq!(doc.title, "list directory contents");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].id, "description");
    }

    #[test]
    fn test_header_from_groff_source_feeds_metadata() {
        let raw = RawDocument::new("", "NAME\n       ls - list directory contents\n")
            .with_groff_source(".TH LS 1 \"March 2024\" \"GNU coreutils 9.4\" \"User Commands\"\n");
        let doc = parse_man_page(&raw, &ParseOptions::default()).unwrap();
        assert_eq!(doc.name, "ls");
        assert_eq!(doc.metadata.version.as_deref(), Some("9.4"));
        assert_eq!(doc.metadata.manual.as_deref(), Some("User Commands"));
        assert_eq!(page_header(&raw).and_then(|header| header.section), Some(1));
    }

    #[test]
    fn test_parse_batch_keeps_order() {
        let raws = vec![
            RawDocument::new("a", "NAME\n       a - first command of the batch\n"),
            RawDocument::new("b", ""),
            RawDocument::new("c", "NAME\n       c - third command of the batch\n"),
        ];
        let results = parse_batch(&raws, &ParseOptions::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().name, "a");
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().title, "third command of the batch");
    }
}
