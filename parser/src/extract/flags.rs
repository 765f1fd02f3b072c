//! Option extraction.
//!
//! A small state machine walks the OPTIONS text line by line:
//!
//! ```text
//! Idle --header--> InFlagHeader --text--> InFlagDescription
//!  ^                   |  ^  header (alias)     |   |
//!  |                   +--+                     |   | header: close, reopen
//!  +----------- blank + shallow text -----------+   |
//!                                                   +--> InFlagHeader
//! ```
//!
//! Headers are lines starting with `-x` or `--long`, optionally followed by
//! an argument placeholder and an inline description after two spaces.

use std::collections::HashMap;

use man_structure_core::{Flag, Section};
use tracing::debug;

use super::{section_texts, sections_where};
use crate::util::{collapse_whitespace, indent_width, looks_like_flag_header, split_two_columns};

/// Extracts options from OPTIONS sections, falling back to DESCRIPTION.
///
/// # Examples
///
/// ```
/// use man_structure_core::Section;
/// use man_structure_parser::extract::flags::extract_flags;
///
/// let content = "-a, --all\n       do not ignore entries starting with .";
/// let flags = extract_flags(&[Section::new("options", "OPTIONS", content, 1)]);
/// assert_eq!(flags[0].flag, "--all");
/// assert_eq!(flags[0].short_flag.as_deref(), Some("-a"));
/// ```
pub fn extract_flags(sections: &[Section]) -> Vec<Flag> {
    let mut scanner = FlagScanner::default();
    for section in sections_where(sections, |title| title.contains("OPTION")) {
        for text in section_texts(section) {
            scanner.scan(text);
        }
    }

    if scanner.set.is_empty() {
        for section in sections_where(sections, |title| title == "DESCRIPTION") {
            for text in section_texts(section) {
                scanner.scan(text);
            }
        }
    }

    debug!(count = scanner.set.flags.len(), "extracted flags");
    scanner.set.flags
}

/// Parsing state of the option scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum FlagState {
    #[default]
    Idle,
    InFlagHeader,
    InFlagDescription,
}

/// A parsed option header line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FlagHeader {
    tokens: Vec<String>,
    argument: Option<String>,
    optional: bool,
    inline: Option<String>,
}

#[derive(Debug)]
enum FlagLine<'a> {
    Header { header: FlagHeader, indent: usize },
    Text { text: &'a str, indent: usize },
    Blank,
}

#[derive(Debug)]
struct PendingFlag {
    header: FlagHeader,
    indent: usize,
    description: Vec<String>,
}

#[derive(Debug, Default)]
struct FlagScanner {
    state: FlagState,
    current: Option<PendingFlag>,
    saw_blank: bool,
    set: FlagSet,
}

impl FlagScanner {
    fn scan(&mut self, text: &str) {
        for line in text.lines() {
            let line = self.classify(line);
            self.step(line);
        }
        self.close();
        self.state = FlagState::Idle;
    }

    fn classify<'a>(&self, line: &'a str) -> FlagLine<'a> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return FlagLine::Blank;
        }
        let indent = indent_width(line);
        // A header-looking line nested under the current header is prose.
        let nested = self
            .current
            .as_ref()
            .is_some_and(|pending| indent > pending.indent);
        if !nested && let Some(header) = parse_header(trimmed) {
            return FlagLine::Header { header, indent };
        }
        FlagLine::Text {
            text: trimmed,
            indent,
        }
    }

    fn step(&mut self, line: FlagLine<'_>) {
        self.state = match (self.state, line) {
            (FlagState::Idle, FlagLine::Header { header, indent }) => self.open(header, indent),
            (FlagState::Idle, FlagLine::Text { .. } | FlagLine::Blank) => FlagState::Idle,

            (FlagState::InFlagHeader, FlagLine::Header { header, indent }) => {
                // `.TQ`-style alias lines: consecutive headers share one body.
                if let Some(pending) = self.current.as_mut()
                    && header.inline.is_none()
                {
                    pending.header.tokens.extend(header.tokens);
                    if pending.header.argument.is_none() {
                        pending.header.argument = header.argument;
                        pending.header.optional = header.optional;
                    }
                    FlagState::InFlagHeader
                } else {
                    self.close();
                    self.open(header, indent)
                }
            }
            (FlagState::InFlagHeader, FlagLine::Text { text, .. }) => {
                self.append(text);
                FlagState::InFlagDescription
            }
            (FlagState::InFlagHeader, FlagLine::Blank) => FlagState::InFlagHeader,

            (FlagState::InFlagDescription, FlagLine::Header { header, indent }) => {
                self.close();
                self.open(header, indent)
            }
            (FlagState::InFlagDescription, FlagLine::Text { text, indent }) => {
                let shallow = self
                    .current
                    .as_ref()
                    .is_some_and(|pending| indent <= pending.indent);
                if self.saw_blank && shallow {
                    self.close();
                    FlagState::Idle
                } else {
                    self.append(text);
                    FlagState::InFlagDescription
                }
            }
            (FlagState::InFlagDescription, FlagLine::Blank) => {
                self.saw_blank = true;
                FlagState::InFlagDescription
            }
        };
    }

    fn open(&mut self, header: FlagHeader, indent: usize) -> FlagState {
        let next = if header.inline.is_some() {
            FlagState::InFlagDescription
        } else {
            FlagState::InFlagHeader
        };
        self.current = Some(PendingFlag {
            header,
            indent,
            description: Vec::new(),
        });
        self.saw_blank = false;
        next
    }

    fn append(&mut self, text: &str) {
        if let Some(pending) = self.current.as_mut() {
            pending.description.push(text.to_string());
        }
    }

    fn close(&mut self) {
        let Some(pending) = self.current.take() else {
            return;
        };
        if let Some(flag) = pending.into_flag() {
            self.set.insert(flag);
        }
    }
}

impl PendingFlag {
    fn into_flag(self) -> Option<Flag> {
        let FlagHeader {
            tokens,
            argument,
            optional,
            inline,
        } = self.header;

        let canonical = tokens
            .iter()
            .find(|token| token.starts_with("--"))
            .or_else(|| tokens.first())?
            .clone();
        let short = tokens
            .iter()
            .find(|token| !token.starts_with("--") && **token != canonical)
            .cloned();

        let description = collapse_whitespace(
            &inline
                .into_iter()
                .chain(self.description)
                .collect::<Vec<_>>()
                .join(" "),
        );
        let lowered = description.to_lowercase();

        Some(Flag {
            flag: canonical,
            short_flag: short,
            argument,
            deprecated: lowered.contains("deprecated") || lowered.contains("obsolete"),
            description,
            optional,
        })
    }
}

/// Ordered flag collection deduplicated by long and short form.
#[derive(Debug, Default)]
struct FlagSet {
    flags: Vec<Flag>,
    index: HashMap<String, usize>,
}

impl FlagSet {
    fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Inserts `flag`, merging into an earlier entry with the same long or
    /// short form. The entry keeps its position; a later non-empty
    /// description replaces the earlier one.
    fn insert(&mut self, flag: Flag) {
        let existing = self.index.get(&flag.flag).copied().or_else(|| {
            flag.short_flag
                .as_ref()
                .and_then(|short| self.index.get(short).copied())
        });

        let idx = match existing {
            Some(idx) => {
                merge_flag(&mut self.flags[idx], flag);
                idx
            }
            None => {
                self.flags.push(flag);
                self.flags.len() - 1
            }
        };

        let entry = &self.flags[idx];
        self.index.insert(entry.flag.clone(), idx);
        if let Some(short) = &entry.short_flag {
            self.index.insert(short.clone(), idx);
        }
    }
}

fn merge_flag(existing: &mut Flag, later: Flag) {
    if later.flag.starts_with("--") && !existing.flag.starts_with("--") {
        let short = std::mem::replace(&mut existing.flag, later.flag);
        existing.short_flag.get_or_insert(short);
    }
    if existing.short_flag.is_none() {
        existing.short_flag = later.short_flag;
    }
    if later.argument.is_some() {
        existing.argument = later.argument;
        existing.optional = later.optional;
    }
    if !later.description.is_empty() {
        existing.description = later.description;
        existing.deprecated = later.deprecated;
    }
}

/// Parses an option header line such as `-o, --output=FILE  write to FILE`.
fn parse_header(trimmed: &str) -> Option<FlagHeader> {
    if !looks_like_flag_header(trimmed) {
        return None;
    }

    let (left, inline) = split_two_columns(trimmed);
    let mut header = FlagHeader {
        inline: inline.map(str::to_string),
        ..FlagHeader::default()
    };

    for part in split_parts(left) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if part.starts_with('-') {
            let (token, rest) = split_token(part);
            let token = token.trim_end_matches([',', ';', ':']);
            if !is_flag_token(token) {
                if header.tokens.is_empty() {
                    return None;
                }
                continue;
            }
            header.tokens.push(token.to_string());

            let (argument, optional, prose) = parse_argument(rest);
            if argument.is_some() {
                header.argument = argument;
                header.optional = optional;
            }
            if let Some(prose) = prose {
                header.inline.get_or_insert(prose);
            }
        } else if header.argument.is_none()
            && let (Some(argument), optional, None) = parse_argument(part)
        {
            header.argument = Some(argument);
            header.optional = optional;
        } else {
            header.inline.get_or_insert_with(|| part.to_string());
            break;
        }
    }

    (!header.tokens.is_empty()).then_some(header)
}

/// Splits header alternatives at `,` and `|` outside brackets.
fn split_parts(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        match ch {
            '[' | '{' | '<' | '(' => depth += 1,
            ']' | '}' | '>' | ')' => depth = depth.saturating_sub(1),
            ',' | '|' if depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn split_token(part: &str) -> (&str, &str) {
    match part.find(['=', '[', ' ', '<', '\t']) {
        Some(idx) => (&part[..idx], &part[idx..]),
        None => (part, ""),
    }
}

fn is_flag_token(token: &str) -> bool {
    let body = token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))
        .unwrap_or_default();
    body.chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '?' | '#' | '@'))
        && body
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '?' | '#' | '@' | '+'))
}

/// Splits what follows a flag token into `(argument, optional, prose)`.
fn parse_argument(rest: &str) -> (Option<String>, bool, Option<String>) {
    if let Some(inner) = rest.strip_prefix("[=") {
        let (argument, tail) = inner.split_once(']').unwrap_or((inner, ""));
        return (clean_argument(argument), true, prose_of(tail));
    }
    if let Some(inner) = rest.strip_prefix('=') {
        let (argument, tail) = inner.split_once(char::is_whitespace).unwrap_or((inner, ""));
        return (clean_argument(argument), false, prose_of(tail));
    }

    let rest = rest.trim_start();
    if rest.is_empty() {
        return (None, false, None);
    }
    if let Some(inner) = rest.strip_prefix('[') {
        let (argument, tail) = inner.split_once(']').unwrap_or((inner, ""));
        let argument = argument.trim_start_matches(['=', ' ']);
        return (clean_argument(argument), true, prose_of(tail));
    }
    if rest.starts_with('<') {
        let (argument, tail) = rest.split_once('>').unwrap_or((rest, ""));
        return (clean_argument(argument), false, prose_of(tail));
    }

    let mut words = rest.split_whitespace();
    let first = words.next().unwrap_or_default();
    let remainder = words.collect::<Vec<_>>();
    if remainder.is_empty() || is_placeholder(first) {
        (clean_argument(first), false, prose_of(&remainder.join(" ")))
    } else {
        (None, false, prose_of(rest))
    }
}

fn clean_argument(raw: &str) -> Option<String> {
    let cleaned = raw
        .trim()
        .trim_matches(|ch| matches!(ch, '<' | '>' | '[' | ']' | '='))
        .trim_end_matches([',', ';', ':']);
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

fn prose_of(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// `FILE`, `<file>`, `{a,b}`, `N...`: words that name a value rather than
/// start a sentence.
fn is_placeholder(word: &str) -> bool {
    if word.starts_with(['<', '{', '[']) || word.ends_with("...") {
        return true;
    }
    word.chars().any(|ch| ch.is_ascii_uppercase())
        && word
            .chars()
            .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-' | '.'))
}
