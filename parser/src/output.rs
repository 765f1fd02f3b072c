//! Output formatting for structured documents.

use man_structure_core::{Section, StructuredDocument};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Markdown,
}

/// Formats a document in the requested output format.
pub fn format_document(doc: &StructuredDocument, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(doc).map_err(|e| format!("JSON serialization failed: {e}"))
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(doc).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(document_to_markdown(doc)),
    }
}

fn document_to_markdown(doc: &StructuredDocument) -> String {
    let mut out = String::new();

    out.push_str(&format!("# {}({}) - {}\n\n", doc.name, doc.section, doc.title));
    out.push_str(&format!("{}\n\n", doc.description));

    if !doc.synopsis.is_empty() {
        out.push_str("## Synopsis\n\n");
        out.push_str(&format!("```\n{}\n```\n\n", doc.synopsis));
    }

    for section in &doc.sections {
        push_section(&mut out, section, "##");
    }

    if !doc.flags.is_empty() {
        out.push_str("## Options\n\n");
        out.push_str("| Flag | Argument | Description |\n");
        out.push_str("|------|----------|-------------|\n");
        for flag in &doc.flags {
            let name = match &flag.short_flag {
                Some(short) => format!("{short}, {}", flag.flag),
                None => flag.flag.clone(),
            };
            let argument = match (&flag.argument, flag.optional) {
                (Some(arg), true) => format!("[{arg}]"),
                (Some(arg), false) => arg.clone(),
                (None, _) => String::new(),
            };
            let mut desc = flag.description.replace('|', "\\|");
            if flag.deprecated {
                desc.insert_str(0, "*(deprecated)* ");
            }
            out.push_str(&format!("| `{name}` | {argument} | {desc} |\n"));
        }
        out.push('\n');
    }

    if !doc.examples.is_empty() {
        out.push_str("## Examples\n\n");
        for example in &doc.examples {
            if !example.description.is_empty() {
                out.push_str(&format!("{}\n\n", example.description));
            }
            out.push_str(&format!("```sh\n$ {}\n", example.command));
            if let Some(ref output) = example.output {
                out.push_str(&format!("{output}\n"));
            }
            out.push_str("```\n\n");
        }
    }

    if !doc.see_also.is_empty() {
        let refs = doc
            .see_also
            .iter()
            .map(|xref| format!("`{}({})`", xref.name, xref.section))
            .collect::<Vec<_>>();
        out.push_str(&format!("**See also:** {}\n\n", refs.join(", ")));
    }

    out.push_str(&format!(
        "**Complexity:** {} | **Hash:** `{}` | **Parser:** {}\n",
        doc.complexity, doc.hash, doc.parse_version
    ));

    out
}

fn push_section(out: &mut String, section: &Section, marker: &str) {
    out.push_str(&format!("{marker} {}\n\n", section.title));
    if !section.content.is_empty() {
        out.push_str(&format!("{}\n\n", section.content));
    }
    for subsection in &section.subsections {
        push_section(out, subsection, "###");
    }
}

#[cfg(test)]
mod tests {
    use man_structure_core::*;

    use super::*;

    fn document() -> StructuredDocument {
        StructuredDocument {
            name: "ls".into(),
            section: 1,
            title: "list directory contents".into(),
            description: "List information about the FILEs.".into(),
            synopsis: "ls [OPTION]... [FILE]...".into(),
            sections: vec![Section::new(
                "description",
                "DESCRIPTION",
                "List information about the FILEs.",
                1,
            )],
            flags: vec![
                Flag::new("--all", "do not ignore entries").with_short("-a"),
                Flag {
                    optional: true,
                    ..Flag::new("--color", "colorize").with_argument("WHEN")
                },
            ],
            examples: vec![Example {
                command: "ls -la".into(),
                description: "List everything:".into(),
                output: None,
                tags: vec!["flags".into()],
            }],
            related_commands: vec!["dir".into()],
            see_also: vec![CrossReference::new("dir", 1)],
            metadata: DocumentMetadata::default(),
            search_content: "ls list directory contents".into(),
            keywords: vec!["ls".into()],
            complexity: Complexity::Basic,
            hash: "0123456789abcdef".into(),
            parsed_at: "2024-01-01T00:00:00+00:00".into(),
            parse_version: PARSER_VERSION.into(),
        }
    }

    #[test]
    fn test_json_uses_camel_case_fields() {
        let json = format_document(&document(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["searchContent"], "ls list directory contents");
        assert_eq!(value["flags"][0]["shortFlag"], "-a");
        assert_eq!(value["seeAlso"][0]["name"], "dir");
        assert_eq!(value["parseVersion"], PARSER_VERSION);
    }

    #[test]
    fn test_yaml_round_trips() {
        let yaml = format_document(&document(), OutputFormat::Yaml).unwrap();
        let parsed: StructuredDocument = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, document());
    }

    #[test]
    fn test_markdown_layout() {
        let md = format_document(&document(), OutputFormat::Markdown).unwrap();
        assert!(md.starts_with("# ls(1) - list directory contents\n"));
        assert!(md.contains("## Synopsis\n\n```\nls [OPTION]... [FILE]...\n```"));
        assert!(md.contains("| `-a, --all` |  | do not ignore entries |"));
        assert!(md.contains("| `--color` | [WHEN] | colorize |"));
        assert!(md.contains("```sh\n$ ls -la\n```"));
        assert!(md.contains("**See also:** `dir(1)`"));
    }
}
