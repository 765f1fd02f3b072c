//! Diagnostics collected while parsing one document.

use serde::Serialize;

use crate::normalize::SourceKind;

/// Which input the parser ended up reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum InputPath {
    #[default]
    FormattedText,
    GroffSource,
    StructuredSections,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseDiagnostics {
    pub input_path: InputPath,
    /// `None` for structured input, where each section is detected separately.
    pub source_kind: Option<SourceKind>,
    /// Unrecognized macro names, deduplicated, in order of first use.
    pub unknown_macros: Vec<String>,
    pub artifacts_stripped: usize,
    pub banners_dropped: usize,
    pub sections_found: usize,
    pub flags_found: usize,
    pub examples_found: usize,
}

impl ParseDiagnostics {
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.input_path == InputPath::GroffSource {
            warnings.push("Formatted text too short; parsed groff source instead".to_string());
        }

        if !self.unknown_macros.is_empty() {
            warnings.push(format!(
                "Unknown macros ignored: {}",
                self.unknown_macros
                    .iter()
                    .map(|name| format!(".{name}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        if self.artifacts_stripped > 0 {
            warnings.push(format!(
                "Stripped {} terminal artifacts (overstrike, ANSI, control bytes)",
                self.artifacts_stripped
            ));
        }

        if self.sections_found == 0 {
            warnings.push("No section headings found".to_string());
        }

        warnings
    }

    /// Records unknown macros, keeping first-use order.
    pub(crate) fn note_unknown_macros(&mut self, names: impl IntoIterator<Item = String>) {
        for name in names {
            if !self.unknown_macros.contains(&name) {
                self.unknown_macros.push(name);
            }
        }
    }
}
