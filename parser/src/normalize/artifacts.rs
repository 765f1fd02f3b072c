//! Terminal encoding artifact removal.
//!
//! Runs before any structural parsing: ANSI CSI sequences, backspace
//! overstrike (`X\bX` bold, `_\bX` underline), carriage returns, and stray
//! control bytes are removed; tabs are expanded to 8-column stops.

use std::sync::LazyLock;

use regex::Regex;

const TAB_STOP: usize = 8;

/// Text with artifacts removed and the number of artifacts found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cleaned {
    pub text: String,
    pub stripped: usize,
}

/// Removes terminal encoding artifacts from `input`.
pub fn strip_artifacts(input: &str) -> Cleaned {
    // SAFETY: These regexes are compile-time constants and are validated by tests.
    static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b[()][A-Za-z0-9]")
            .expect("static regex must compile")
    });

    let mut stripped = 0;
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);

    let without_ansi = ANSI_RE.replace_all(input, |_: &regex::Captures<'_>| {
        stripped += 1;
        ""
    });

    let mut text = String::with_capacity(without_ansi.len());
    let mut column = 0usize;
    let mut chars = without_ansi.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\n' => {
                text.push('\n');
                column = 0;
            }
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    stripped += 1;
                }
            }
            '\t' => {
                let width = TAB_STOP - column % TAB_STOP;
                text.extend(std::iter::repeat_n(' ', width));
                column += width;
            }
            '\u{8}' => {
                stripped += 1;
                if text.ends_with(|c: char| c != '\n') {
                    text.pop();
                    column = column.saturating_sub(1);
                }
            }
            c if c.is_control() => stripped += 1,
            c => {
                text.push(c);
                column += 1;
            }
        }
    }

    Cleaned { text, stripped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overstrike_bold_and_underline() {
        let cleaned = strip_artifacts("N\u{8}NA\u{8}AM\u{8}ME\u{8}E\n_\u{8}f_\u{8}i_\u{8}l_\u{8}e");
        assert_eq!(cleaned.text, "NAME\nfile");
        assert_eq!(cleaned.stripped, 8);
    }

    #[test]
    fn test_ansi_and_carriage_returns() {
        let cleaned = strip_artifacts("\u{1b}[1mls\u{1b}[0m - list\r\nnext\r");
        assert_eq!(cleaned.text, "ls - list\nnext");
        assert_eq!(cleaned.stripped, 3);
    }

    #[test]
    fn test_tabs_expand_to_stops() {
        assert_eq!(strip_artifacts("a\tb").text, "a       b");
        assert_eq!(strip_artifacts("\tx").text, "        x");
    }

    #[test]
    fn test_control_bytes_and_bom() {
        let cleaned = strip_artifacts("\u{feff}a\u{7}b\u{0}c");
        assert_eq!(cleaned.text, "abc");
        assert_eq!(cleaned.stripped, 2);
    }

    #[test]
    fn test_clean_text_is_unchanged() {
        let text = "NAME\n       ls - list directory contents";
        let cleaned = strip_artifacts(text);
        assert_eq!(cleaned.text, text);
        assert_eq!(cleaned.stripped, 0);
    }
}
