//! Roff escape sequence handling.
//!
//! [`decode`] turns a line of roff text into [`Piece`]s: literal text, font
//! switches, and the `\c` line-join marker. Special-character and string
//! escapes resolve through a fixed glyph table; size, colour, motion and
//! register escapes are dropped.

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::LazyLock;

/// Typeface selected by a font escape or font macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Font {
    #[default]
    Roman,
    Bold,
    Italic,
    BoldItalic,
    Code,
}

impl Font {
    /// Resolves a font name as used by `\f` and `.ft`.
    ///
    /// Returns `None` for `P` (previous font).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "B" | "3" | "TB" | "HB" => Some(Self::Bold),
            "I" | "2" | "TI" | "HI" => Some(Self::Italic),
            "BI" | "4" | "TBI" => Some(Self::BoldItalic),
            "CW" | "C" | "CR" | "CB" | "CI" | "TT" | "V" => Some(Self::Code),
            "P" => None,
            _ => Some(Self::Roman),
        }
    }

    /// Markdown emphasis marker; empty for roman.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Roman => "",
            Self::Bold => "**",
            Self::Italic => "*",
            Self::BoldItalic => "***",
            Self::Code => "`",
        }
    }
}

/// Font change requested by an escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSwitch {
    Set(Font),
    Previous,
}

/// One decoded unit of a roff text line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Text(String),
    Font(FontSwitch),
    /// `\c`: the next input line continues this one.
    Join,
}

static GLYPHS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("lq", "\u{201c}"),
        ("rq", "\u{201d}"),
        ("oq", "\u{2018}"),
        ("cq", "\u{2019}"),
        ("Lq", "\u{201c}"),
        ("Rq", "\u{201d}"),
        ("dq", "\""),
        ("q", "\""),
        ("aq", "'"),
        ("em", "\u{2014}"),
        ("en", "\u{2013}"),
        ("hy", "-"),
        ("mi", "\u{2212}"),
        ("pl", "+"),
        ("eq", "="),
        ("bu", "\u{2022}"),
        ("co", "\u{a9}"),
        ("rg", "\u{ae}"),
        ("R", "\u{ae}"),
        ("tm", "\u{2122}"),
        ("Tm", "\u{2122}"),
        ("de", "\u{b0}"),
        ("mu", "\u{d7}"),
        ("di", "\u{f7}"),
        ("rs", "\\"),
        ("sl", "/"),
        ("ga", "`"),
        ("aa", "\u{b4}"),
        ("ti", "~"),
        ("ha", "^"),
        ("ba", "|"),
        ("or", "|"),
        ("lB", "["),
        ("rB", "]"),
        ("lC", "{"),
        ("rC", "}"),
        ("la", "\u{27e8}"),
        ("ra", "\u{27e9}"),
        ("Fo", "\u{ab}"),
        ("Fc", "\u{bb}"),
        ("fo", "\u{2039}"),
        ("fc", "\u{203a}"),
        ("dg", "\u{2020}"),
        ("sc", "\u{a7}"),
        ("ps", "\u{b6}"),
        ("<=", "\u{2264}"),
        (">=", "\u{2265}"),
        ("!=", "\u{2260}"),
        ("+-", "\u{b1}"),
        ("->", "\u{2192}"),
        ("<-", "\u{2190}"),
        ("ua", "\u{2191}"),
        ("da", "\u{2193}"),
        ("**", "*"),
        ("sq", "\u{25a1}"),
        ("ul", "_"),
        ("Ga", "`"),
    ])
});

/// Looks up a named glyph (`\(xx`, `\[name]`, `\*(xx`, `\C'name'`).
fn glyph(name: &str) -> Option<String> {
    if let Some(hex) = name.strip_prefix('u')
        && (4..=6).contains(&hex.len())
        && hex.chars().all(|ch| ch.is_ascii_hexdigit())
    {
        return u32::from_str_radix(hex, 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from);
    }
    GLYPHS.get(name).map(|glyph| (*glyph).to_string())
}

/// Reads an escape name: `(xx`, `[name]`, or a single character.
fn read_name(chars: &mut Peekable<Chars<'_>>) -> String {
    match chars.next() {
        Some('(') => chars.by_ref().take(2).collect(),
        Some('[') => chars.by_ref().take_while(|ch| *ch != ']').collect(),
        Some(ch) => ch.to_string(),
        None => String::new(),
    }
}

/// Reads a quote-delimited argument such as `'2n'` in `\h'2n'`.
fn read_delimited(chars: &mut Peekable<Chars<'_>>) -> String {
    match chars.next() {
        Some(delimiter) => chars.by_ref().take_while(|ch| *ch != delimiter).collect(),
        None => String::new(),
    }
}

/// Consumes a `\s` size argument (`\s-1`, `\s+2`, `\s0`, `\s(12`, `\s[12]`).
fn skip_size(chars: &mut Peekable<Chars<'_>>) {
    chars.next_if(|&ch| matches!(ch, '+' | '-'));
    match chars.peek() {
        Some('(') | Some('[') => {
            read_name(chars);
        }
        Some('\'') => {
            read_delimited(chars);
        }
        Some(ch) if ch.is_ascii_digit() => {
            let first = chars.next();
            if first != Some('0') && first.is_some_and(|d| d < '4') {
                chars.next_if(char::is_ascii_digit);
            }
        }
        _ => {}
    }
}

/// Decodes one line of roff text into pieces.
///
/// Never fails: unknown escapes fall back to the escaped character and
/// unknown glyph names are dropped.
pub fn decode(input: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut text = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    fn flush(text: &mut String, pieces: &mut Vec<Piece>) {
        if !text.is_empty() {
            pieces.push(Piece::Text(std::mem::take(text)));
        }
    }

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            text.push(ch);
            continue;
        }

        let Some(next) = chars.next() else {
            text.push('\\');
            break;
        };

        match next {
            'f' => {
                let name = read_name(&mut chars);
                flush(&mut text, &mut pieces);
                pieces.push(Piece::Font(match Font::from_name(&name) {
                    Some(font) => FontSwitch::Set(font),
                    None => FontSwitch::Previous,
                }));
            }
            '(' => {
                let name = chars.by_ref().take(2).collect::<String>();
                text.extend(glyph(&name));
            }
            '[' => {
                let name = chars.by_ref().take_while(|ch| *ch != ']').collect::<String>();
                text.extend(glyph(&name));
            }
            '*' => {
                let name = read_name(&mut chars);
                text.extend(glyph(&name));
            }
            'C' => {
                let name = read_delimited(&mut chars);
                text.extend(glyph(&name));
            }
            'e' | '\\' | 'E' => text.push('\\'),
            '-' => text.push('-'),
            '.' => text.push('.'),
            '\'' => text.push('\''),
            '`' => text.push('`'),
            ' ' | '~' | '0' | 't' => text.push(' '),
            '_' => text.push('_'),
            '&' | '|' | '^' | ')' | '/' | ',' | '%' | ':' | '{' | '}' | 'd' | 'u' | 'r'
            | 'z' | 'a' | 'p' => {}
            '"' | '#' => break,
            'c' => {
                flush(&mut text, &mut pieces);
                pieces.push(Piece::Join);
                break;
            }
            's' => skip_size(&mut chars),
            'n' => {
                chars.next_if(|&ch| matches!(ch, '+' | '-'));
                read_name(&mut chars);
            }
            'm' | 'g' | 'k' | 'M' | 'F' | 'V' | 'Y' | '$' | 'O' => {
                read_name(&mut chars);
            }
            'h' | 'v' | 'w' | 'l' | 'L' | 'D' | 'X' | 'o' | 'b' | 'x' | 'N' | 'Z' | 'H'
            | 'S' | 'R' | 'A' | 'B' => {
                read_delimited(&mut chars);
            }
            other => text.push(other),
        }
    }

    flush(&mut text, &mut pieces);
    pieces
}

/// Decodes `input` and keeps only its text, dropping font changes.
pub fn decode_plain(input: &str) -> String {
    decode(input)
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Text(text) => Some(text),
            Piece::Font(_) | Piece::Join => None,
        })
        .collect()
}

/// Returns `true` when `pieces` end with a `\c` join marker.
pub fn ends_with_join(pieces: &[Piece]) -> bool {
    matches!(pieces.last(), Some(Piece::Join))
}

/// Renders decoded pieces as light markdown, carrying the font state across
/// lines the way roff does.
///
/// Emphasis markers are closed at the end of every rendered line and
/// reopened on the next, so each output line is self-contained markdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineRenderer {
    current: Font,
    previous: Font,
}

impl InlineRenderer {
    /// Switches back to roman, e.g. at a section heading.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn switch(&mut self, switch: FontSwitch) {
        let next = match switch {
            FontSwitch::Set(font) => font,
            FontSwitch::Previous => self.previous,
        };
        self.previous = self.current;
        self.current = next;
    }

    /// Renders one line of pieces.
    pub fn render(&mut self, pieces: &[Piece]) -> String {
        let mut spans: Vec<(Font, String)> = Vec::new();
        for piece in pieces {
            match piece {
                Piece::Text(text) => match spans.last_mut() {
                    Some((font, span)) if *font == self.current => span.push_str(text),
                    _ => spans.push((self.current, text.clone())),
                },
                Piece::Font(switch) => self.switch(*switch),
                Piece::Join => {}
            }
        }

        let mut out = String::new();
        for (font, span) in spans {
            push_span(&mut out, font, &span);
        }
        out
    }
}

/// Appends `span` wrapped in the marker of `font`, keeping surrounding
/// whitespace outside the markers and dropping empty emphasis.
fn push_span(out: &mut String, font: Font, span: &str) {
    let marker = font.marker();
    let core = span.trim();
    if marker.is_empty() || core.is_empty() {
        out.push_str(span);
        return;
    }
    let leading = &span[..span.len() - span.trim_start().len()];
    let trailing = &span[span.trim_end().len()..];
    out.push_str(leading);
    out.push_str(marker);
    out.push_str(core);
    out.push_str(marker);
    out.push_str(trailing);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_strips_fonts() {
        assert_eq!(decode_plain("\\fB--help\\fR"), "--help");
        assert_eq!(decode_plain("path\\ with\\ space"), "path with space");
        assert_eq!(decode_plain("\\f(CWcode\\fP and \\f[B]bold\\f[]"), "code and bold");
        assert_eq!(decode_plain("\\f3bold\\f1"), "bold");
    }

    #[test]
    fn test_special_characters() {
        assert_eq!(
            decode_plain("\\(lqquoted\\(rq \\(em \\(bu \\(co \\[rg] \\(tm \\(de \\(mu \\(di"),
            "\u{201c}quoted\u{201d} \u{2014} \u{2022} \u{a9} \u{ae} \u{2122} \u{b0} \u{d7} \u{f7}"
        );
        assert_eq!(decode_plain("a\\(<=b \\(+-1 x\\(->y"), "a\u{2264}b \u{b1}1 x\u{2192}y");
        assert_eq!(decode_plain("\\[u00E9]t\\['e]"), "\u{e9}t");
        assert_eq!(decode_plain("\\*(lqhi\\*(rq \\*R"), "\u{201c}hi\u{201d} \u{ae}");
        assert_eq!(decode_plain("back\\eslash \\\\ \\-\\-all"), "back\\slash \\ --all");
    }

    #[test]
    fn test_dropped_escapes_and_comments() {
        assert_eq!(decode_plain("\\s-1SMALL\\s0 text"), "SMALL text");
        assert_eq!(decode_plain("a\\h'2n'b\\v'-1'c"), "abc");
        assert_eq!(decode_plain("x\\&.y\\|z"), "x.yz");
        assert_eq!(decode_plain("value \\\" trailing comment"), "value ");
        assert_eq!(decode_plain("\\m[red]red\\m[]"), "red");
        assert_eq!(decode_plain("reg \\n(.g end"), "reg  end");
    }

    #[test]
    fn test_join_marker() {
        let pieces = decode("first\\c");
        assert!(ends_with_join(&pieces));
        assert_eq!(pieces[0], Piece::Text("first".to_string()));
    }

    #[test]
    fn test_markdown_rendering_of_fonts() {
        let mut renderer = InlineRenderer::default();
        assert_eq!(
            renderer.render(&decode("\\fB\\-a\\fR, \\fB\\-\\-all\\fR")),
            "**-a**, **--all**"
        );
        assert_eq!(
            renderer.render(&decode("use \\fIFILE \\fPnow")),
            "use *FILE* now"
        );
        assert_eq!(renderer.render(&decode("\\f(CWx = 1\\fR")), "`x = 1`");
        assert_eq!(renderer.render(&decode("\\fB\\fR empty")), " empty");
    }

    #[test]
    fn test_font_state_carries_across_lines() {
        let mut renderer = InlineRenderer::default();
        assert_eq!(renderer.render(&decode("start \\fBbold")), "start **bold**");
        assert_eq!(renderer.render(&decode("still bold\\fR done")), "**still bold** done");
    }
}
