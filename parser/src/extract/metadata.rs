//! Page header (`.TH`, mdoc `.Dd`/`.Dt`/`.Os`) and AUTHOR metadata.

use man_structure_core::{DocumentMetadata, Section};

use super::paragraphs;
use crate::normalize::escapes::decode_plain;
use crate::normalize::lexer::{Line, classify, parse_macro_args};
use crate::util::leading_number;

/// Fields of a page header.
///
/// `.TH title section [date [source [manual]]]` for man pages;
/// `.Dd date`, `.Dt TITLE section`, `.Os source` for mdoc.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageHeader {
    pub title: Option<String>,
    pub section: Option<u32>,
    pub date: Option<String>,
    pub source: Option<String>,
    pub manual: Option<String>,
}

/// Reads the page header from roff source. Returns `None` when the source
/// has no header request before its first section.
///
/// # Examples
///
/// ```
/// use man_structure_parser::extract::metadata::read_header;
///
/// let header = read_header(".TH LS 1 \"March 2024\" \"GNU coreutils 9.4\" \"User Commands\"\n").unwrap();
/// assert_eq!(header.title.as_deref(), Some("LS"));
/// assert_eq!(header.section, Some(1));
/// assert_eq!(header.manual.as_deref(), Some("User Commands"));
/// ```
pub fn read_header(source: &str) -> Option<PageHeader> {
    let mut header = PageHeader::default();
    let mut found = false;

    for line in source.lines() {
        let Line::Control { name, args } = classify(line) else {
            continue;
        };
        let args = parse_macro_args(args)
            .iter()
            .map(|arg| decode_plain(arg).trim().to_string())
            .collect::<Vec<_>>();
        let arg = |idx: usize| args.get(idx).filter(|arg| !arg.is_empty()).cloned();

        match name {
            "TH" => {
                return Some(PageHeader {
                    title: arg(0),
                    section: arg(1).as_deref().and_then(leading_number),
                    date: arg(2),
                    source: arg(3),
                    manual: arg(4),
                });
            }
            "Dd" => {
                header.date = mdoc_date(&args.join(" "));
                found = true;
            }
            "Dt" => {
                header.title = arg(0);
                header.section = arg(1).as_deref().and_then(leading_number);
                found = true;
            }
            "Os" => {
                header.source = Some(args.join(" ")).filter(|source| !source.is_empty());
                found = true;
            }
            "SH" | "Sh" => break,
            _ => {}
        }
    }

    found.then_some(header)
}

/// Strips the `$Mdocdate: ... $` wrapper used by OpenBSD-style pages.
fn mdoc_date(raw: &str) -> Option<String> {
    let date = raw
        .trim()
        .trim_start_matches("$Mdocdate:")
        .trim_end_matches('$')
        .trim();
    (!date.is_empty()).then(|| date.to_string())
}

/// Builds document metadata from the header and the AUTHOR section.
pub fn extract_metadata(header: Option<&PageHeader>, sections: &[Section]) -> DocumentMetadata {
    let author = sections
        .iter()
        .find(|section| section.is_titled("AUTHOR") || section.is_titled("AUTHORS"))
        .and_then(|section| paragraphs(&section.content).into_iter().next());

    let Some(header) = header else {
        return DocumentMetadata {
            author,
            ..DocumentMetadata::default()
        };
    };

    DocumentMetadata {
        date: header.date.clone(),
        version: header.source.as_deref().and_then(version_of),
        source: header.source.clone(),
        manual: header.manual.clone(),
        author,
    }
}

/// The trailing version-like token of a source string (`GNU coreutils 9.4`).
fn version_of(source: &str) -> Option<String> {
    let last = source.split_whitespace().last()?;
    let digits = last.strip_prefix(['v', 'V']).unwrap_or(last);
    (source.split_whitespace().count() > 1 && digits.starts_with(|ch: char| ch.is_ascii_digit()))
        .then(|| last.to_string())
}
