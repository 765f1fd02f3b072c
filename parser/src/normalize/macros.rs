//! Closed vocabulary of supported roff requests and man(7) macros.

use super::escapes::Font;
use crate::util::HeadingLevel;

/// Indentation and list macros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentKind {
    /// `.RS`
    Push,
    /// `.RE`
    Pop,
    /// `.TP`: the next line is a tag, the following lines its body.
    TaggedParagraph,
    /// `.TQ`: another tag line for the current item.
    ExtraTag,
    /// `.IP [tag]`
    IndentedParagraph,
    /// `.HP`
    HangingParagraph,
}

/// How a font macro styles its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    /// All arguments in one font, joined by spaces (`.B`, `.I`).
    Single(Font),
    /// Arguments alternate between two fonts and are joined without spaces
    /// (`.BR ls (1)` renders `ls(1)` with `ls` bold).
    Alternating(Font, Font),
}

/// A classified control line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Macro {
    /// Page header: `.TH`, `.Dt`, `.Dd`, `.Os`. Consumed by metadata only.
    Title,
    Header(HeadingLevel),
    Paragraph,
    /// `.br` (`blank == false`) or `.sp` (`blank == true`).
    Break { blank: bool },
    Indent(IndentKind),
    FontInline(FontStyle),
    /// `.nf`/`.EX` open, `.fi`/`.EE` close a no-fill region.
    Verbatim { open: bool },
    /// `.UR`/`.MT` open, `.UE`/`.ME` close a hyperlink.
    Link { open: bool },
    /// `.de`, `.ig`, `.am`: skipped up to the closing `..`.
    Definition,
    /// Layout requests and conditionals with no textual effect.
    Ignored,
    Unknown(String),
}

impl Macro {
    /// Classifies a control-line name.
    pub fn classify(name: &str) -> Self {
        use Font::{Bold, Italic, Roman};
        use FontStyle::{Alternating, Single};

        match name {
            "TH" | "Dt" | "Dd" | "Os" => Self::Title,
            "SH" | "Sh" => Self::Header(HeadingLevel::Section),
            "SS" | "Ss" => Self::Header(HeadingLevel::Subsection),
            "PP" | "P" | "LP" | "Pp" | "Lp" => Self::Paragraph,
            "br" => Self::Break { blank: false },
            "sp" => Self::Break { blank: true },
            "RS" => Self::Indent(IndentKind::Push),
            "RE" => Self::Indent(IndentKind::Pop),
            "TP" => Self::Indent(IndentKind::TaggedParagraph),
            "TQ" => Self::Indent(IndentKind::ExtraTag),
            "IP" => Self::Indent(IndentKind::IndentedParagraph),
            "HP" => Self::Indent(IndentKind::HangingParagraph),
            "B" | "SB" => Self::FontInline(Single(Bold)),
            "I" => Self::FontInline(Single(Italic)),
            "SM" | "R" => Self::FontInline(Single(Roman)),
            "BI" => Self::FontInline(Alternating(Bold, Italic)),
            "IB" => Self::FontInline(Alternating(Italic, Bold)),
            "BR" => Self::FontInline(Alternating(Bold, Roman)),
            "RB" => Self::FontInline(Alternating(Roman, Bold)),
            "IR" => Self::FontInline(Alternating(Italic, Roman)),
            "RI" => Self::FontInline(Alternating(Roman, Italic)),
            "nf" | "EX" => Self::Verbatim { open: true },
            "fi" | "EE" => Self::Verbatim { open: false },
            "UR" | "MT" => Self::Link { open: true },
            "UE" | "ME" => Self::Link { open: false },
            "de" | "de1" | "ig" | "am" => Self::Definition,
            "" | "." | "ad" | "na" | "nh" | "hy" | "ne" | "in" | "ll" | "ft" | "ps" | "vs" | "PD"
            | "DT" | "so" | "mso" | "ds" | "nr" | "rr" | "rm" | "tr" | "UC" | "ta" | "ti"
            | "ce" | "cs" | "bp" | "ns" | "rs" | "hw" | "lf" | "pc" | "ev" | "fam" | "fl"
            | "ec" | "eo" | "cc" | "c2" | "cu" | "ul" | "if" | "ie" | "el" | "do" | "ss"
            | "\\}" | "AT" | "PU" | "Id" | "LO" => Self::Ignored,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns `true` for names in the supported vocabulary.
    pub fn is_recognized(name: &str) -> bool {
        !matches!(Self::classify(name), Self::Unknown(_))
    }
}
