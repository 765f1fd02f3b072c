//! Normalization of text already formatted by `man`.
//!
//! Plain mode keeps the text as-is (tidying happens in the caller). Markdown
//! mode turns column-0 and 3-column titles into `##`/`###` headings, trims
//! prose, and fences deep-indented code runs.

use super::{Chunk, Mode, split_indented_code};
use crate::util::{HeadingLevel, body_indent, heading_of, is_fence, looks_like_flag_header};

pub(super) fn render(text: &str, mode: Mode) -> Vec<String> {
    let lines = text.lines().map(str::to_string).collect::<Vec<_>>();
    match mode {
        Mode::Plain => lines,
        Mode::Markdown => to_markdown(lines),
    }
}

fn to_markdown(lines: Vec<String>) -> Vec<String> {
    let base = body_indent(lines.iter().map(String::as_str));
    let mut out = Vec::with_capacity(lines.len());
    let mut in_fence = false;

    for chunk in split_indented_code(lines, base) {
        let line = match chunk {
            Chunk::Code(code) => {
                out.push(String::new());
                out.push("```".to_string());
                out.extend(code);
                out.push("```".to_string());
                out.push(String::new());
                continue;
            }
            Chunk::Line(line) => line,
        };

        if is_fence(&line) {
            in_fence = !in_fence;
            out.push(line.trim().to_string());
            continue;
        }
        if in_fence {
            out.push(line);
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            out.push(String::new());
            continue;
        }

        if let Some(heading) = heading_of(&line, base) {
            let marker = match heading.level {
                HeadingLevel::Section => "##",
                HeadingLevel::Subsection => "###",
            };
            out.push(String::new());
            out.push(format!("{marker} {}", heading.title));
            out.push(String::new());
            continue;
        }

        out.push(trimmed.to_string());
        if looks_like_flag_header(trimmed) {
            out.push(String::new());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "\
LS(1)                     User Commands                    LS(1)

NAME
       ls - list directory contents

DESCRIPTION
       List information about the FILEs.

   Sorting
       -a, --all
              do not ignore entries starting with .

EXAMPLES
       Build everything:

              make -j4 all
";

    #[test]
    fn test_plain_mode_keeps_lines() {
        assert_eq!(render("  a\n b", Mode::Plain), vec!["  a", " b"]);
    }

    #[test]
    fn test_markdown_headings_and_prose() {
        let out = render(PAGE, Mode::Markdown).join("\n");
        assert!(out.contains("## NAME\n\nls - list directory contents"));
        assert!(out.contains("### Sorting"));
        assert!(out.contains("-a, --all\n\ndo not ignore entries starting with ."));
        assert!(out.contains("Build everything:\n\n\n```\nmake -j4 all\n```"));
    }
}
