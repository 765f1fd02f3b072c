//! Line classifier for raw roff source.

/// One classified input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// A control line (`.name args` or `'name args`); arguments are raw,
    /// escapes still encoded.
    Control { name: &'a str, args: &'a str },
    /// A `.\"` / `'\"` / `\"` comment line.
    Comment,
    /// Whitespace-only line.
    Blank,
    Text(&'a str),
}

/// Classifies a single line of roff input.
pub fn classify(line: &str) -> Line<'_> {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    if line.starts_with("\\\"") || line.starts_with("\\#") {
        return Line::Comment;
    }

    let Some(rest) = line
        .strip_prefix('.')
        .or_else(|| line.strip_prefix('\''))
    else {
        return Line::Text(line);
    };

    let rest = rest.trim_start_matches([' ', '\t']);
    if rest.starts_with("\\\"") || rest.starts_with("\\#") {
        return Line::Comment;
    }

    let name_end = rest
        .find(|ch: char| ch.is_whitespace())
        .unwrap_or(rest.len());
    let (name, args) = rest.split_at(name_end);
    Line::Control {
        name,
        args: args.trim(),
    }
}

/// Splits macro arguments, honoring double quotes.
///
/// Escapes are kept encoded so callers can decode them with font context.
/// Inside quotes `""` is a literal quote. An unterminated quote makes the
/// rest of the line one argument, and `\"` ends the argument list.
pub fn parse_macro_args(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut started = false;
    let mut in_quotes = false;
    let mut chars = input.trim().chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.next_if_eq(&'"').is_some() {
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if !started => {
                in_quotes = true;
                started = true;
            }
            '\\' => {
                let Some(next) = chars.next() else {
                    current.push('\\');
                    break;
                };
                if next == '"' {
                    break;
                }
                current.push('\\');
                current.push(next);
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    out.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            other => {
                current.push(other);
                started = true;
            }
        }
    }

    if started {
        out.push(current);
    }

    out
}
