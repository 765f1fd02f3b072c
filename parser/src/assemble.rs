//! Document assembly.
//!
//! Merges extractor output with the rendered sections into the final
//! [`StructuredDocument`], computing the derived fields: flattened search
//! text, keywords, complexity class, and content hash.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::Utc;
use man_structure_core::{
    Complexity, MIN_SECTION_CONTENT_CHARS, PARSER_VERSION, ParseOptions, RawDocument, Section,
    SectionInput, StructuredDocument,
};
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::extract::Extraction;
use crate::util::{indent_width, is_fence, looks_like_flag_header};

/// Keywords drawn from title and description, besides the name.
const MAX_KEYWORDS: usize = 10;

/// Flag counts bounding the intermediate complexity class.
const BASIC_FLAG_LIMIT: usize = 5;
const ADVANCED_FLAG_LIMIT: usize = 20;

/// Hex digits kept from the SHA-256 digest.
const HASH_HEX_DIGITS: usize = 16;

// SAFETY: These regexes are compile-time constants and are validated by tests.
static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w]+").expect("static regex must compile"));

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "about", "after", "also", "been", "before", "both", "does", "each", "either", "every",
        "from", "have", "into", "like", "many", "more", "most", "must", "only", "other", "over",
        "same", "shall", "should", "some", "such", "than", "that", "their", "them", "then",
        "there", "these", "they", "this", "those", "through", "under", "until", "used", "using",
        "very", "were", "what", "when", "where", "which", "while", "will", "with", "within",
        "without", "would", "your",
    ]
    .into_iter()
    .collect()
});

static BASIC_COMMANDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "basename", "cat", "cd", "clear", "cp", "date", "dirname", "echo", "false", "head",
        "hostname", "less", "ln", "ls", "man", "mkdir", "more", "mv", "pwd", "rm", "rmdir",
        "sleep", "tail", "touch", "true", "uname", "wc", "which", "whoami", "yes",
    ]
    .into_iter()
    .collect()
});

static ADVANCED_COMMANDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "awk", "docker", "ffmpeg", "find", "gawk", "gcc", "gdb", "git", "iptables", "jq",
        "kubectl", "make", "nft", "openssl", "parted", "perf", "rsync", "sed", "ssh",
        "strace", "systemctl", "tar", "tcpdump",
    ]
    .into_iter()
    .collect()
});

/// Builds the final document.
///
/// `sections` are the output-mode sections (markdown or plain); the NAME
/// section and sections whose content is too short are dropped here, and
/// prose is reflowed unless `options.preserve_formatting` is set.
pub fn assemble(
    extraction: Extraction,
    sections: Vec<Section>,
    raw: &RawDocument,
    options: &ParseOptions,
) -> StructuredDocument {
    let sections = finalize_sections(sections, !options.preserve_formatting, true);
    let search_content = search_content(&[
        &extraction.name,
        &extraction.title,
        &extraction.description,
        &extraction.synopsis,
    ]);
    let keywords = keywords(&extraction.name, &extraction.title, &extraction.description);
    let complexity = classify_complexity(&extraction.name, extraction.flags.len());
    let hash = content_hash(raw);

    debug!(
        name = %extraction.name,
        sections = sections.len(),
        keywords = keywords.len(),
        %complexity,
        hash = %hash,
        "assembled document"
    );

    StructuredDocument {
        name: extraction.name,
        section: extraction.section,
        title: extraction.title,
        description: extraction.description,
        synopsis: extraction.synopsis,
        sections,
        flags: extraction.flags,
        examples: extraction.examples,
        related_commands: extraction.related_commands,
        see_also: extraction.see_also,
        metadata: extraction.metadata,
        search_content,
        keywords,
        complexity,
        hash,
        parsed_at: Utc::now().to_rfc3339(),
        parse_version: PARSER_VERSION.to_string(),
    }
}

/// Drops NAME (top level only) and short sections, reflowing content first.
/// A short section that still has subsections is kept.
fn finalize_sections(sections: Vec<Section>, reflow_prose: bool, top_level: bool) -> Vec<Section> {
    sections
        .into_iter()
        .filter(|section| !(top_level && section.is_titled("NAME")))
        .filter_map(|mut section| {
            if reflow_prose {
                section.content = reflow(&section.content);
            }
            section.subsections = finalize_sections(
                std::mem::take(&mut section.subsections),
                reflow_prose,
                false,
            );
            let meaningful =
                section.content.trim().chars().count() > MIN_SECTION_CONTENT_CHARS;
            (meaningful || !section.subsections.is_empty()).then_some(section)
        })
        .collect()
}

/// Joins consecutive prose lines of a paragraph with single spaces.
///
/// Fenced code, indented lines, headings, list items, option headers,
/// prompt lines and comment markers are never joined.
///
/// # Examples
///
/// ```
/// use man_structure_parser::assemble::reflow;
///
/// assert_eq!(reflow("List information\nabout the FILEs.\n\n- item"), "List information about the FILEs.\n\n- item");
/// assert_eq!(reflow("```\na\nb\n```"), "```\na\nb\n```");
/// ```
pub fn reflow(content: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_fence = false;
    let mut joinable_prev = false;

    for line in content.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
            out.push(line.to_string());
            joinable_prev = false;
            continue;
        }

        let joinable = !in_fence && is_joinable_prose(line);
        match out.last_mut() {
            Some(prev) if joinable && joinable_prev => {
                prev.push(' ');
                prev.push_str(line.trim());
            }
            _ => out.push(line.to_string()),
        }
        joinable_prev = joinable;
    }

    out.join("\n")
}

fn is_joinable_prose(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || indent_width(line) > 0 {
        return false;
    }
    let list_item = (trimmed.starts_with(['-', '*', '\u{2022}', '\u{00b7}'])
        && trimmed.chars().nth(1) == Some(' '))
        || trimmed
            .split_once(". ")
            .is_some_and(|(number, _)| !number.is_empty() && number.chars().all(|ch| ch.is_ascii_digit()));

    !(trimmed.starts_with('#')
        || trimmed.starts_with("<!--")
        || trimmed.starts_with("$ ")
        || trimmed.starts_with("% ")
        || list_item
        || looks_like_flag_header(trimmed))
}

/// Lowercases the parts and collapses every non-word run to one space.
///
/// # Examples
///
/// ```
/// use man_structure_parser::assemble::search_content;
///
/// assert_eq!(search_content(&["ls", "List directory-contents!"]), "ls list directory contents");
/// ```
pub fn search_content(parts: &[&str]) -> String {
    let joined = parts.join(" ").to_lowercase();
    NON_WORD_RE.replace_all(&joined, " ").trim().to_string()
}

/// The command name followed by up to ten distinct significant words of
/// the title and description.
pub fn keywords(name: &str, title: &str, description: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = vec![name.to_string()];
    seen.insert(name.to_lowercase());

    let text = format!("{title} {description}").to_lowercase();
    let words = text
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| word.chars().count() > 3 && !STOP_WORDS.contains(word));

    for word in words {
        if out.len() > MAX_KEYWORDS {
            break;
        }
        if seen.insert(word.to_string()) {
            out.push(word.to_string());
        }
    }
    out
}

/// Curated command sets first, then the flag count.
pub fn classify_complexity(name: &str, flag_count: usize) -> Complexity {
    let name = name.to_lowercase();
    if BASIC_COMMANDS.contains(name.as_str()) {
        Complexity::Basic
    } else if ADVANCED_COMMANDS.contains(name.as_str()) {
        Complexity::Advanced
    } else if flag_count < BASIC_FLAG_LIMIT {
        Complexity::Basic
    } else if flag_count > ADVANCED_FLAG_LIMIT {
        Complexity::Advanced
    } else {
        Complexity::Intermediate
    }
}

/// First 16 hex digits of SHA-256 over the parser version, a NUL byte, the
/// raw formatted text, then the groff source and any structured section
/// input, each NUL separated.
pub fn content_hash(raw: &RawDocument) -> String {
    let mut hasher = Sha256::new();
    hasher.update(PARSER_VERSION.as_bytes());
    hasher.update([0u8]);
    hasher.update(raw.raw_formatted_text.as_bytes());
    if let Some(source) = &raw.raw_groff_source {
        hasher.update([0u8]);
        hasher.update(source.as_bytes());
    }
    if let Some(sections) = &raw.sections {
        for section in sections {
            hash_section_input(&mut hasher, section);
        }
    }
    let digest = format!("{:x}", hasher.finalize());
    digest[..HASH_HEX_DIGITS].to_string()
}

fn hash_section_input(hasher: &mut Sha256, section: &SectionInput) {
    hasher.update([0u8]);
    hasher.update(section.title.as_bytes());
    hasher.update([0u8]);
    hasher.update(section.content.as_bytes());
    for subsection in &section.subsections {
        hash_section_input(hasher, subsection);
    }
}
