//! SYNOPSIS extraction and the synopsis flag fallback.

use std::sync::LazyLock;

use man_structure_core::{Flag, Section};
use regex::Regex;

use super::{section_texts, sections_where};
use crate::util::{collapse_whitespace, is_banner};

/// Description given to flags known only from the synopsis.
pub const SYNOPSIS_FLAG_DESCRIPTION: &str = "Option listed in the synopsis.";

// SAFETY: These regexes are compile-time constants and are validated by tests.
static SYNOPSIS_FLAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s\[|(])(--?[A-Za-z0-9?][A-Za-z0-9_-]*)").expect("static regex must compile")
});

/// Joins every SYNOPSIS line into one whitespace-collapsed logical line.
///
/// # Examples
///
/// ```
/// use man_structure_core::Section;
/// use man_structure_parser::extract::synopsis::extract_synopsis;
///
/// let sections = vec![Section::new("synopsis", "SYNOPSIS", "ls [OPTION]...\n   [FILE]...", 1)];
/// assert_eq!(extract_synopsis(&sections), "ls [OPTION]... [FILE]...");
/// ```
pub fn extract_synopsis(sections: &[Section]) -> String {
    let lines = sections_where(sections, |title| title.starts_with("SYNOPSIS"))
        .flat_map(section_texts)
        .flat_map(str::lines)
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_banner(line) && !line.starts_with("```"))
        .collect::<Vec<_>>();
    collapse_whitespace(&lines.join(" "))
}

/// Flags cited in `synopsis` that `known` does not already contain, in
/// order of first appearance.
pub fn synopsis_flags(synopsis: &str, known: &[Flag]) -> Vec<Flag> {
    let mut found: Vec<Flag> = Vec::new();
    for captures in SYNOPSIS_FLAG_RE.captures_iter(synopsis) {
        let token = captures[1].trim_end_matches('-');
        if token.len() < 2 || token == "--" {
            continue;
        }
        let seen = known.iter().chain(found.iter()).any(|flag| flag.matches(token));
        if !seen {
            found.push(Flag::new(token, SYNOPSIS_FLAG_DESCRIPTION));
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synopsis_joins_subsections_and_drops_banners() {
        let mut section = Section::new("synopsis", "SYNOPSIS", "tar -c [-f ARCHIVE]", 1);
        section
            .subsections
            .push(Section::new("short", "Short form", "tar -x\nTAR(1)  x  TAR(1)", 2));
        assert_eq!(extract_synopsis(&[section]), "tar -c [-f ARCHIVE] tar -x");
    }

    #[test]
    fn test_synopsis_flags_skip_known_and_duplicates() {
        let known = vec![Flag::new("--all", "all").with_short("-a")];
        let flags = synopsis_flags("ls [-a] [-l|--long] [--color=WHEN] -l file-name", &known);
        let tokens = flags.iter().map(|flag| flag.flag.as_str()).collect::<Vec<_>>();
        assert_eq!(tokens, vec!["-l", "--long", "--color"]);
        assert!(flags.iter().all(|flag| flag.description == SYNOPSIS_FLAG_DESCRIPTION));
    }

    #[test]
    fn test_missing_synopsis_is_empty() {
        assert_eq!(extract_synopsis(&[]), "");
        assert!(synopsis_flags("", &[]).is_empty());
    }
}
