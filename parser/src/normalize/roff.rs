//! Renders man(7) roff source line by line.
//!
//! Text is not refilled: every roff text line becomes one output line, with
//! list and `.RS` indentation applied. No-fill regions (`.nf`/`.EX`) keep
//! their whitespace and become fenced blocks in markdown mode.

use super::Mode;
use super::escapes::{self, Font, FontSwitch, InlineRenderer, Piece};
use super::lexer::{self, Line};
use super::macros::{FontStyle, IndentKind, Macro};
use crate::util::{HeadingLevel, SUBSECTION_INDENT, collapse_whitespace, is_all_caps_heading};

/// Columns added by `.RS` and by tagged-paragraph bodies in plain mode.
const INDENT_STEP: usize = 4;

const BULLETS: [&str; 5] = ["\u{2022}", "\u{b7}", "*", "-", "o"];

/// Output of one roff rendering pass.
#[derive(Debug, Clone, Default)]
pub(super) struct Rendered {
    pub lines: Vec<String>,
    /// Unrecognized macro names, in first-seen order.
    pub unknown_macros: Vec<String>,
}

/// Renders roff `text` in `mode`.
pub(super) fn render(text: &str, mode: Mode) -> Rendered {
    let mut renderer = RoffRenderer::new(mode);
    for line in text.lines() {
        renderer.line(line);
    }
    renderer.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListState {
    None,
    TagPending,
    Body,
}

/// A rendered span of text in both plain and mode-specific form.
struct Fragment {
    plain: String,
    styled: String,
}

struct RoffRenderer {
    mode: Mode,
    out: Vec<String>,
    inline: InlineRenderer,
    indent: usize,
    indent_stack: Vec<usize>,
    list: ListState,
    bullet_pending: bool,
    tag_gap: bool,
    verbatim: Option<Vec<String>>,
    pending_font: Option<FontStyle>,
    pending_heading: Option<HeadingLevel>,
    pending_link: Option<String>,
    in_definition: bool,
    join_next: bool,
    unknown_macros: Vec<String>,
}

impl RoffRenderer {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            out: Vec::new(),
            inline: InlineRenderer::default(),
            indent: 0,
            indent_stack: Vec::new(),
            list: ListState::None,
            bullet_pending: false,
            tag_gap: false,
            verbatim: None,
            pending_font: None,
            pending_heading: None,
            pending_link: None,
            in_definition: false,
            join_next: false,
            unknown_macros: Vec::new(),
        }
    }

    fn line(&mut self, raw: &str) {
        if self.in_definition {
            if raw.trim_start().starts_with("..") {
                self.in_definition = false;
            }
            return;
        }

        match lexer::classify(raw) {
            Line::Blank => match &mut self.verbatim {
                Some(buffer) => buffer.push(String::new()),
                None => self.push_blank(),
            },
            Line::Comment => {}
            Line::Text(text) => self.text(text),
            Line::Control { name, args } => self.control(name, args),
        }
    }

    fn finish(mut self) -> Rendered {
        self.close_verbatim();
        Rendered {
            lines: self.out,
            unknown_macros: self.unknown_macros,
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(buffer) = &mut self.verbatim {
            buffer.push(escapes::decode_plain(text).trim_end().to_string());
            return;
        }

        let pieces = escapes::decode(text);
        let joins = escapes::ends_with_join(&pieces);
        let fragment = match self.pending_font.take() {
            Some(style) => self.style_args(style, &[text]),
            None => {
                let plain = plain_text(&pieces);
                let styled = match self.mode {
                    Mode::Markdown => self.inline.render(&pieces),
                    Mode::Plain => plain.clone(),
                };
                Fragment { plain, styled }
            }
        };
        self.emit(fragment, joins);
    }

    fn control(&mut self, name: &str, args: &str) {
        let kind = Macro::classify(name);

        if self.verbatim.is_some() {
            self.verbatim_control(kind, args);
            return;
        }

        match kind {
            Macro::Title | Macro::Ignored => {}
            Macro::Header(level) => self.header(level, args),
            Macro::Paragraph => {
                self.list = ListState::None;
                self.bullet_pending = false;
                self.push_blank();
            }
            Macro::Break { blank } => {
                if blank {
                    self.push_blank();
                }
            }
            Macro::Indent(kind) => self.indent(kind, args),
            Macro::FontInline(style) => {
                let args = lexer::parse_macro_args(args);
                if args.is_empty() {
                    self.pending_font = Some(style);
                } else {
                    let args = args.iter().map(String::as_str).collect::<Vec<_>>();
                    let fragment = self.style_args(style, &args);
                    self.emit(fragment, false);
                }
            }
            Macro::Verbatim { open } => {
                if open {
                    self.verbatim = Some(Vec::new());
                }
            }
            Macro::Link { open: true } => {
                self.pending_link = lexer::parse_macro_args(args)
                    .first()
                    .map(|target| escapes::decode_plain(target));
            }
            Macro::Link { open: false } => {
                if let Some(target) = self.pending_link.take() {
                    let trailing = escapes::decode_plain(args);
                    let text = format!("<{target}>{}", trailing.trim());
                    self.emit(
                        Fragment {
                            plain: text.clone(),
                            styled: text,
                        },
                        false,
                    );
                }
            }
            Macro::Definition => self.in_definition = true,
            Macro::Unknown(name) => {
                if self.mode == Mode::Markdown {
                    self.out.push(format!("<!-- .{name} -->"));
                }
                if !self.unknown_macros.contains(&name) {
                    self.unknown_macros.push(name);
                }
            }
        }
    }

    /// Control lines inside a no-fill region.
    fn verbatim_control(&mut self, kind: Macro, args: &str) {
        match kind {
            Macro::Verbatim { open: false } => self.close_verbatim(),
            Macro::Header(level) => {
                self.close_verbatim();
                self.header(level, args);
            }
            Macro::FontInline(style) => {
                let args = lexer::parse_macro_args(args);
                if !args.is_empty() {
                    let args = args.iter().map(String::as_str).collect::<Vec<_>>();
                    let plain = self.style_args(style, &args).plain;
                    if let Some(buffer) = &mut self.verbatim {
                        buffer.push(plain.trim_end().to_string());
                    }
                }
            }
            Macro::Break { blank: true } => {
                if let Some(buffer) = &mut self.verbatim {
                    buffer.push(String::new());
                }
            }
            Macro::Definition => self.in_definition = true,
            _ => {}
        }
    }

    fn header(&mut self, level: HeadingLevel, args: &str) {
        let args = lexer::parse_macro_args(args);
        if args.is_empty() {
            self.pending_heading = Some(level);
        } else {
            let title = escapes::decode_plain(&args.join(" "));
            self.heading(level, &title);
        }
    }

    fn heading(&mut self, level: HeadingLevel, title: &str) {
        let title = collapse_whitespace(title);
        if title.is_empty() {
            return;
        }

        self.indent = 0;
        self.indent_stack.clear();
        self.list = ListState::None;
        self.bullet_pending = false;
        self.tag_gap = false;
        self.pending_font = None;
        self.join_next = false;
        self.inline.reset();

        self.push_blank();
        let line = match (self.mode, level) {
            (Mode::Plain, HeadingLevel::Section) => plain_section_title(&title),
            (Mode::Plain, HeadingLevel::Subsection) => {
                format!("{}{}", pad(SUBSECTION_INDENT), plain_subsection_title(&title))
            }
            (Mode::Markdown, HeadingLevel::Section) => format!("## {title}"),
            (Mode::Markdown, HeadingLevel::Subsection) => format!("### {title}"),
        };
        self.out.push(line);
        if self.mode == Mode::Markdown {
            self.out.push(String::new());
        }
    }

    fn indent(&mut self, kind: IndentKind, args: &str) {
        match kind {
            IndentKind::Push => {
                self.indent_stack.push(self.indent);
                self.indent += INDENT_STEP;
                self.list = ListState::None;
                self.bullet_pending = false;
            }
            IndentKind::Pop => {
                self.indent = self.indent_stack.pop().unwrap_or(0);
                self.list = ListState::None;
                self.bullet_pending = false;
            }
            IndentKind::TaggedParagraph => {
                self.push_blank();
                self.list = ListState::TagPending;
                self.bullet_pending = false;
            }
            IndentKind::ExtraTag => self.list = ListState::TagPending,
            IndentKind::IndentedParagraph => {
                self.push_blank();
                self.bullet_pending = false;
                let args = lexer::parse_macro_args(args);
                let tag = args.first().map(String::as_str).unwrap_or_default();
                let decoded = escapes::decode_plain(tag);
                let decoded = decoded.trim();
                if decoded.is_empty() {
                    self.list = ListState::Body;
                } else if BULLETS.contains(&decoded) {
                    self.list = ListState::Body;
                    self.bullet_pending = true;
                } else {
                    self.list = ListState::TagPending;
                    let fragment = self.style_args(FontStyle::Single(Font::Roman), &[tag]);
                    self.emit(fragment, false);
                }
            }
            IndentKind::HangingParagraph => {
                self.list = ListState::None;
                self.bullet_pending = false;
                self.push_blank();
            }
        }
    }

    /// Applies a font macro to its arguments without touching the running
    /// font state.
    fn style_args(&self, style: FontStyle, args: &[&str]) -> Fragment {
        let mut pieces = Vec::new();
        match style {
            FontStyle::Single(font) => {
                pieces.push(Piece::Font(FontSwitch::Set(font)));
                pieces.extend(escapes::decode(&args.join(" ")));
            }
            FontStyle::Alternating(first, second) => {
                for (idx, arg) in args.iter().enumerate() {
                    let font = if idx % 2 == 0 { first } else { second };
                    pieces.push(Piece::Font(FontSwitch::Set(font)));
                    pieces.extend(escapes::decode(arg));
                }
            }
        }

        let plain = plain_text(&pieces);
        let styled = match self.mode {
            Mode::Markdown => InlineRenderer::default().render(&pieces),
            Mode::Plain => plain.clone(),
        };
        Fragment { plain, styled }
    }

    fn emit(&mut self, fragment: Fragment, joins: bool) {
        if let Some(level) = self.pending_heading.take() {
            self.heading(level, &fragment.plain);
            return;
        }

        let continues = std::mem::replace(&mut self.join_next, joins);
        if continues && let Some(last) = self.out.last_mut().filter(|last| !last.is_empty()) {
            last.push_str(&fragment.styled);
            return;
        }

        let styled = fragment.styled;
        let line = match (self.list, self.mode) {
            (ListState::TagPending, Mode::Markdown) => {
                self.list = ListState::Body;
                self.tag_gap = true;
                format!("- {}", styled.trim())
            }
            (ListState::TagPending, Mode::Plain) => {
                self.list = ListState::Body;
                format!("{}{}", pad(self.indent), styled.trim())
            }
            (ListState::Body, Mode::Markdown) if self.bullet_pending => {
                self.bullet_pending = false;
                format!("- {}", styled.trim())
            }
            (ListState::Body, Mode::Plain) if self.bullet_pending => {
                self.bullet_pending = false;
                format!("{}\u{2022} {}", pad(self.indent), styled.trim())
            }
            (ListState::Body, Mode::Markdown) => {
                if std::mem::take(&mut self.tag_gap) {
                    self.out.push(String::new());
                }
                format!("  {}", styled.trim_start())
            }
            (ListState::Body, Mode::Plain) => format!("{}{styled}", pad(self.indent + INDENT_STEP)),
            (ListState::None, Mode::Markdown) => styled,
            (ListState::None, Mode::Plain) => format!("{}{styled}", pad(self.indent)),
        };
        self.out.push(line);
    }

    fn text_indent(&self) -> usize {
        match self.list {
            ListState::Body => self.indent + INDENT_STEP,
            ListState::None | ListState::TagPending => self.indent,
        }
    }

    fn close_verbatim(&mut self) {
        let Some(mut buffer) = self.verbatim.take() else {
            return;
        };
        while buffer.last().is_some_and(|line| line.trim().is_empty()) {
            buffer.pop();
        }
        let first = buffer
            .iter()
            .position(|line| !line.trim().is_empty())
            .unwrap_or(buffer.len());
        buffer.drain(..first);
        if buffer.is_empty() {
            return;
        }

        match self.mode {
            Mode::Markdown => {
                self.push_blank();
                self.out.push("```".to_string());
                self.out.extend(buffer);
                self.out.push("```".to_string());
                self.out.push(String::new());
            }
            Mode::Plain => {
                let prefix = pad(self.text_indent());
                for line in buffer {
                    if line.is_empty() {
                        self.out.push(line);
                    } else {
                        self.out.push(format!("{prefix}{line}"));
                    }
                }
            }
        }
        self.tag_gap = false;
    }

    fn push_blank(&mut self) {
        if self.out.last().is_some_and(|line| !line.is_empty()) {
            self.out.push(String::new());
        }
    }
}

fn plain_text(pieces: &[Piece]) -> String {
    pieces
        .iter()
        .filter_map(|piece| match piece {
            Piece::Text(text) => Some(text.as_str()),
            Piece::Font(_) | Piece::Join => None,
        })
        .collect()
}

fn pad(width: usize) -> String {
    " ".repeat(width)
}

/// Uppercases a `.SH` title so it reads as an all-caps heading line.
fn plain_section_title(title: &str) -> String {
    let upper = title.to_uppercase();
    if is_all_caps_heading(&upper) {
        return upper;
    }
    let cleaned = upper
        .chars()
        .map(|ch| if ch.is_alphanumeric() { ch } else { ' ' })
        .collect::<String>();
    let cleaned = collapse_whitespace(&cleaned);
    if is_all_caps_heading(&cleaned) {
        cleaned
    } else {
        upper
    }
}

/// Capitalizes a `.SS` title and drops trailing sentence punctuation.
fn plain_subsection_title(title: &str) -> String {
    let title = title.trim_end_matches(['.', ',', ';']);
    let mut chars = title.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
