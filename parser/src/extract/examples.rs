//! Usage example extraction from EXAMPLES sections.
//!
//! Commands are recognized by a shell prompt (`$ `, `% `, `# `) or by
//! starting with the document's own name. Prose before a command describes
//! it; indented lines after it are its output.

use man_structure_core::{Example, Section};

use super::{section_texts, sections_where};
use crate::util::{collapse_whitespace, indent_width};

/// Extracts examples from every section titled `EXAMPLE...`.
///
/// # Examples
///
/// ```
/// use man_structure_core::Section;
/// use man_structure_parser::extract::examples::extract_examples;
///
/// let content = "List files:\n  $ ls -la\n";
/// let examples = extract_examples(&[Section::new("examples", "EXAMPLES", content, 1)], "ls");
/// assert_eq!(examples[0].command, "ls -la");
/// assert_eq!(examples[0].description, "List files:");
/// ```
pub fn extract_examples(sections: &[Section], name: &str) -> Vec<Example> {
    let mut examples = Vec::new();
    for section in sections_where(sections, |title| title.starts_with("EXAMPLE")) {
        for text in section_texts(section) {
            let mut scanner = ExampleScanner::new(name);
            for line in text.lines() {
                scanner.step(line);
            }
            examples.extend(scanner.finish());
        }
    }
    examples
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExampleState {
    Idle,
    InExampleCommand,
    InExampleOutput,
    InExampleDescription,
}

#[derive(Debug)]
enum ExampleLine<'a> {
    Blank,
    Command(&'a str),
    Indented(&'a str),
    Prose(&'a str),
}

#[derive(Debug, Default)]
struct DraftExample {
    command: String,
    description: Vec<String>,
    output: Vec<String>,
}

struct ExampleScanner<'a> {
    name: &'a str,
    state: ExampleState,
    current: Option<DraftExample>,
    pending: Vec<String>,
    continues: bool,
    examples: Vec<Example>,
}

impl<'a> ExampleScanner<'a> {
    fn new(name: &'a str) -> Self {
        Self {
            name,
            state: ExampleState::Idle,
            current: None,
            pending: Vec::new(),
            continues: false,
            examples: Vec::new(),
        }
    }

    fn step(&mut self, raw: &str) {
        if self.continues
            && let Some(draft) = self.current.as_mut()
        {
            let next = raw.trim();
            if !next.is_empty() {
                self.continues = next.ends_with('\\');
                draft.command.push(' ');
                draft.command.push_str(next.trim_end_matches('\\').trim_end());
                return;
            }
            self.continues = false;
        }

        let line = self.classify(raw);
        self.state = match (self.state, line) {
            (_, ExampleLine::Command(command)) => {
                self.close();
                self.open(command)
            }
            (ExampleState::Idle | ExampleState::InExampleDescription, ExampleLine::Indented(text))
                if looks_like_command(text) =>
            {
                self.open(text)
            }

            (ExampleState::Idle, ExampleLine::Blank | ExampleLine::Indented(_)) => {
                ExampleState::Idle
            }
            (ExampleState::Idle, ExampleLine::Prose(text))
            | (ExampleState::InExampleDescription, ExampleLine::Prose(text) | ExampleLine::Indented(text)) => {
                self.pending.push(text.to_string());
                ExampleState::InExampleDescription
            }
            (ExampleState::InExampleDescription, ExampleLine::Blank) => {
                ExampleState::InExampleDescription
            }

            (ExampleState::InExampleCommand, ExampleLine::Blank) => ExampleState::InExampleCommand,
            (
                ExampleState::InExampleCommand | ExampleState::InExampleOutput,
                ExampleLine::Indented(text),
            ) => self.indented_after_command(raw, text),
            (ExampleState::InExampleOutput, ExampleLine::Blank) => {
                if let Some(draft) = self.current.as_mut() {
                    draft.output.push(String::new());
                }
                ExampleState::InExampleOutput
            }
            (
                ExampleState::InExampleCommand | ExampleState::InExampleOutput,
                ExampleLine::Prose(text),
            ) => {
                self.close();
                self.pending.push(text.to_string());
                ExampleState::InExampleDescription
            }
        };
    }

    fn classify<'l>(&self, raw: &'l str) -> ExampleLine<'l> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return ExampleLine::Blank;
        }
        if let Some(command) = strip_prompt(trimmed) {
            return ExampleLine::Command(command);
        }
        if starts_with_name(trimmed, self.name) && !trimmed.ends_with(['.', ':']) {
            return ExampleLine::Command(trimmed);
        }
        if indent_width(raw) > 0 {
            ExampleLine::Indented(trimmed)
        } else {
            ExampleLine::Prose(trimmed)
        }
    }

    /// An indented line right after a command is its description when it
    /// reads like a sentence and nothing was attached yet, otherwise output.
    fn indented_after_command(&mut self, raw: &str, text: &str) -> ExampleState {
        let Some(draft) = self.current.as_mut() else {
            return ExampleState::Idle;
        };
        if self.state == ExampleState::InExampleCommand
            && draft.description.is_empty()
            && self.pending.is_empty()
            && looks_like_prose(text)
        {
            draft.description.push(text.to_string());
            return ExampleState::InExampleCommand;
        }
        draft.output.push(raw.trim_end().to_string());
        ExampleState::InExampleOutput
    }

    fn open(&mut self, command: &str) -> ExampleState {
        self.continues = command.ends_with('\\');
        self.current = Some(DraftExample {
            command: command.trim_end_matches('\\').trim_end().to_string(),
            description: std::mem::take(&mut self.pending),
            output: Vec::new(),
        });
        ExampleState::InExampleCommand
    }

    fn close(&mut self) {
        self.continues = false;
        let Some(draft) = self.current.take() else {
            return;
        };
        let command = collapse_whitespace(&draft.command);
        if command.is_empty() {
            return;
        }
        self.examples.push(Example {
            tags: tag_command(&command),
            command,
            description: collapse_whitespace(&draft.description.join(" ")),
            output: dedent_output(draft.output),
        });
    }

    fn finish(mut self) -> Vec<Example> {
        self.close();
        // Trailing prose belongs to the last example when it has none.
        if !self.pending.is_empty()
            && let Some(last) = self.examples.last_mut()
            && last.description.is_empty()
        {
            last.description = collapse_whitespace(&self.pending.join(" "));
        }
        self.examples
    }
}

fn strip_prompt(trimmed: &str) -> Option<&str> {
    if let Some(rest) = trimmed
        .strip_prefix("$ ")
        .or_else(|| trimmed.strip_prefix("% "))
    {
        return Some(rest.trim()).filter(|rest| !rest.is_empty());
    }
    // `# ` is a root prompt only before a lowercase command word.
    trimmed
        .strip_prefix("# ")
        .map(str::trim)
        .filter(|rest| rest.starts_with(|ch: char| ch.is_ascii_lowercase()))
}

fn starts_with_name(trimmed: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let mut words = trimmed.split_whitespace();
    let mut first = words.next().unwrap_or_default();
    if first == "sudo" {
        first = words.next().unwrap_or_default();
    }
    if first == name {
        return true;
    }
    // `git rebase` for `git-rebase`.
    words
        .next()
        .is_some_and(|second| name.split_once('-') == Some((first, second)))
}

fn looks_like_command(text: &str) -> bool {
    let first = text.split_whitespace().next().unwrap_or_default();
    text.starts_with(|ch: char| ch.is_ascii_lowercase() || matches!(ch, '.' | '/'))
        && !text.ends_with(['.', ':'])
        && !first.chars().any(|ch| ch.is_uppercase())
}

fn looks_like_prose(text: &str) -> bool {
    let words = text.split_whitespace().count();
    let sentence_end = text.ends_with(['.', ':']);
    (text.starts_with(|ch: char| ch.is_uppercase()) && sentence_end) || (words >= 4 && sentence_end)
}

fn dedent_output(mut lines: Vec<String>) -> Option<String> {
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    let shared = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| indent_width(line))
        .min()?;
    Some(
        lines
            .iter()
            .map(|line| line.get(shared..).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// Shell features used by `command`, in a fixed order.
fn tag_command(command: &str) -> Vec<String> {
    let words = command.split_whitespace().collect::<Vec<_>>();
    let has_word = |wanted: &str| words.iter().any(|word| *word == wanted);

    let checks = [
        ("pipe", has_word("|")),
        (
            "redirect",
            words.iter().any(|word| {
                word.starts_with(['>', '<']) || word.starts_with("2>") || word.starts_with("&>")
            }),
        ),
        ("sudo", words.first() == Some(&"sudo")),
        ("chain", has_word("&&") || has_word("||") || has_word(";") || command.contains("; ")),
        ("substitution", command.contains("$(") || command.contains('`')),
        ("background", words.last() == Some(&"&")),
        ("glob", words.iter().skip(1).any(|word| word.contains(['*', '?']) && !word.starts_with('-'))),
        ("flags", words.iter().skip(1).any(|word| word.starts_with('-') && word.len() > 1)),
    ];

    checks
        .into_iter()
        .filter_map(|(tag, present)| present.then(|| tag.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn examples(content: &str, name: &str) -> Vec<Example> {
        extract_examples(&[Section::new("examples", "EXAMPLES", content, 1)], name)
    }

    #[test]
    fn test_prompt_commands_with_descriptions() {
        let found = examples(
            "List files:\n  $ ls -la\n\nSort by size:\n  $ ls -S | head\n",
            "ls",
        );
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].command, "ls -la");
        assert_eq!(found[0].description, "List files:");
        assert_eq!(found[0].tags, vec!["flags"]);
        assert_eq!(found[1].command, "ls -S | head");
        assert_eq!(found[1].tags, vec!["pipe", "flags"]);
    }

    #[test]
    fn test_command_output_is_captured_and_dedented() {
        let found = examples("$ ls\n    a.txt\n      b.txt\n\nThat is all.\n", "ls");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].output.as_deref(), Some("a.txt\n  b.txt"));
        assert_eq!(found[0].description, "That is all.");
    }

    #[test]
    fn test_indented_command_after_prose() {
        let found = examples("Build everything:\n\n       make -j4 all\n", "make");
        assert_eq!(found[0].command, "make -j4 all");
        assert_eq!(found[0].description, "Build everything:");

        let found = examples("Run a custom script:\n\n    ./configure --prefix=/usr\n", "make");
        assert_eq!(found[0].command, "./configure --prefix=/usr");
    }

    #[test]
    fn test_line_continuation() {
        let found = examples("$ tar -czf out.tgz \\\n    src/ docs/\n", "tar");
        assert_eq!(found[0].command, "tar -czf out.tgz src/ docs/");
        assert_eq!(found[0].output, None);
    }

    #[test]
    fn test_name_prefixed_commands_and_sentences() {
        let found = examples("git rebase -i HEAD~3\ngit rebase is powerful.\n", "git-rebase");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].command, "git rebase -i HEAD~3");
        assert_eq!(found[0].description, "git rebase is powerful.");
    }

    #[test]
    fn test_root_prompt_and_tags() {
        let found = examples("# mount /dev/sdb1 /mnt && ls /mnt/*.txt > list &\n", "mount");
        assert_eq!(found[0].command, "mount /dev/sdb1 /mnt && ls /mnt/*.txt > list &");
        assert_eq!(found[0].tags, vec!["redirect", "chain", "background", "glob"]);

        let found = examples("$ sudo ls $(pwd)\n", "ls");
        assert_eq!(found[0].tags, vec!["sudo", "substitution"]);
    }

    #[test]
    fn test_no_examples_section() {
        assert!(extract_examples(&[], "ls").is_empty());
        assert!(examples("Nothing to see here.\n", "ls").is_empty());
    }
}
