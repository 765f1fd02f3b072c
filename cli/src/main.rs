use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use man_structure_core::{ParseOptions, RawDocument, StructuredDocument, validate_document};
use man_structure_parser::{
    ManPageParser, Mode, OutputFormat, format_document, load_options, normalize, parse_batch,
};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "man-structure")]
#[command(about = "Turn manual pages into structured documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse one manual page from a file.
    ParseFile(ParseFileArgs),
    /// Parse one manual page read from stdin.
    ParseStdin(ParseStdinArgs),
    /// Print the normalized text of a manual page.
    Normalize(NormalizeArgs),
    /// Parse many manual pages in parallel into an output directory.
    Batch(BatchArgs),
}

/// Options shared by every parsing subcommand.
#[derive(Debug, Args)]
struct ParseFlags {
    /// Output format.
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
    /// YAML file with parse options.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Keep section content as plain text instead of markdown.
    #[arg(long)]
    plain: bool,
    /// Keep line breaks instead of reflowing paragraphs.
    #[arg(long)]
    preserve_formatting: bool,
}

#[derive(Debug, Args)]
struct ParseFileArgs {
    /// Path to the manual page (roff source or `man` output).
    #[arg(long)]
    input: PathBuf,
    /// Command name; inferred from the file name when omitted.
    #[arg(long)]
    name: Option<String>,
    /// Manual section; inferred from the file name or page header when omitted.
    #[arg(long)]
    section: Option<u32>,
    /// Treat the input as groff source rather than formatted text.
    #[arg(long)]
    groff: bool,
    #[command(flatten)]
    flags: ParseFlags,
}

#[derive(Debug, Args)]
struct ParseStdinArgs {
    /// Command name of the page being parsed.
    #[arg(long)]
    name: String,
    /// Manual section.
    #[arg(long)]
    section: Option<u32>,
    #[command(flatten)]
    flags: ParseFlags,
}

#[derive(Debug, Args)]
struct NormalizeArgs {
    /// Path to the manual page.
    #[arg(long)]
    input: PathBuf,
    /// Emit light markdown instead of plain text.
    #[arg(long)]
    markdown: bool,
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// Manual page files to parse.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Output directory for per-page documents.
    #[arg(long)]
    output: PathBuf,
    /// Number of parallel jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    #[command(flatten)]
    flags: ParseFlags,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::ParseFile(args) => run_parse_file(args),
        Command::ParseStdin(args) => run_parse_stdin(args),
        Command::Normalize(args) => run_normalize(args),
        Command::Batch(args) => run_batch(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_parse_file(args: ParseFileArgs) -> Result<(), String> {
    let text = read_input(&args.input)?;
    let (inferred_name, inferred_section) = infer_name_and_section(&args.input);
    let name = args.name.unwrap_or(inferred_name);

    let mut raw = if args.groff {
        RawDocument::new(&name, "").with_groff_source(&text)
    } else {
        RawDocument::new(&name, &text)
    };
    raw.section_hint = args.section.or(inferred_section);

    parse_and_print(&raw, &args.flags)
}

fn run_parse_stdin(args: ParseStdinArgs) -> Result<(), String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .map_err(|err| format!("Failed to read stdin: {err}"))?;

    let mut raw = RawDocument::new(&args.name, &text);
    raw.section_hint = args.section;

    parse_and_print(&raw, &args.flags)
}

fn run_normalize(args: NormalizeArgs) -> Result<(), String> {
    let text = read_input(&args.input)?;
    let mode = if args.markdown {
        Mode::Markdown
    } else {
        Mode::Plain
    };
    println!("{}", normalize(&text, mode));
    Ok(())
}

fn run_batch(args: BatchArgs) -> Result<(), String> {
    let options = resolve_options(&args.flags)?;

    let raws = args
        .inputs
        .iter()
        .map(|path| {
            let text = read_input(path)?;
            let (name, section) = infer_name_and_section(path);
            let mut raw = RawDocument::new(&name, &text);
            raw.section_hint = section;
            Ok(raw)
        })
        .collect::<Result<Vec<_>, String>>()?;

    fs::create_dir_all(&args.output).map_err(|err| {
        format!(
            "Failed to create output directory '{}': {err}",
            args.output.display()
        )
    })?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.unwrap_or(0))
        .build()
        .map_err(|err| format!("Failed to build thread pool: {err}"))?;
    let results = pool.install(|| parse_batch(&raws, &options));

    let ext = format_extension(args.flags.format);
    let mut written = 0usize;
    let mut failures = Vec::new();
    let mut stems = HashSet::new();

    for (path, result) in args.inputs.iter().zip(results) {
        let doc = match result {
            Ok(doc) => doc,
            Err(err) => {
                warn!(input = %path.display(), error = %err, "skipping page");
                failures.push(path.display().to_string());
                continue;
            }
        };
        report_violations(&doc);

        let stem = format!("{}.{}", doc.name, doc.section);
        let unique = unique_stem(&stem, &mut stems);
        if unique != stem {
            warn!(
                input = %path.display(),
                output = %unique,
                "another page already wrote {stem}; using a suffixed file name"
            );
        }
        let out_path = args.output.join(format!("{unique}.{ext}"));
        let raw = format_document(&doc, args.flags.format)?;
        fs::write(&out_path, raw)
            .map_err(|err| format!("Failed to write '{}': {err}", out_path.display()))?;
        written += 1;
    }

    println!("Parsed and wrote {written} document(s).");
    if !failures.is_empty() {
        eprintln!(
            "{} page(s) had no usable input: {}",
            failures.len(),
            failures.join(", ")
        );
    }

    Ok(())
}

fn parse_and_print(raw: &RawDocument, flags: &ParseFlags) -> Result<(), String> {
    let options = resolve_options(flags)?;
    let mut parser = ManPageParser::new(options);
    let doc = parser.parse(raw).map_err(|err| err.to_string())?;

    for warning in parser.diagnostics().warnings() {
        eprintln!("warning: {warning}");
    }
    report_violations(&doc);

    println!("{}", format_document(&doc, flags.format)?);
    Ok(())
}

/// Loads the config file, if any, then applies command-line overrides.
fn resolve_options(flags: &ParseFlags) -> Result<ParseOptions, String> {
    let mut options = match &flags.config {
        Some(path) => load_options(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => ParseOptions::default(),
    };
    if flags.plain {
        options.convert_to_markdown = false;
    }
    if flags.preserve_formatting {
        options.preserve_formatting = true;
    }
    info!(?options, "resolved parse options");
    Ok(options)
}

fn report_violations(doc: &StructuredDocument) {
    for violation in validate_document(doc) {
        warn!(name = %doc.name, %violation, "document violates an invariant");
    }
}

/// Returns `stem`, or `stem-2`, `stem-3`, ... when it was already taken.
fn unique_stem(stem: &str, taken: &mut HashSet<String>) -> String {
    let mut candidate = stem.to_string();
    let mut counter = 2;
    while taken.contains(&candidate) {
        candidate = format!("{stem}-{counter}");
        counter += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

fn read_input(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("Failed to read '{}': {err}", path.display()))
}

fn format_extension(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Json => "json",
        OutputFormat::Yaml => "yaml",
        OutputFormat::Markdown => "md",
    }
}

/// Splits a page file name such as `ls.1`, `git-rebase.1.txt` or `printf.3p`
/// into the command name and manual section.
fn infer_name_and_section(path: &Path) -> (String, Option<u32>) {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name
        .strip_suffix(".txt")
        .or_else(|| file_name.strip_suffix(".man"))
        .unwrap_or(&file_name);

    if let Some((name, ext)) = stem.rsplit_once('.')
        && !name.is_empty()
        && ext.starts_with(|ch: char| ch.is_ascii_digit())
    {
        let digits = ext
            .chars()
            .take_while(|ch| ch.is_ascii_digit())
            .collect::<String>();
        return (name.to_string(), digits.parse().ok());
    }
    (stem.to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_name_and_section() {
        let cases = [
            ("ls.1", "ls", Some(1)),
            ("pages/git-rebase.1.txt", "git-rebase", Some(1)),
            ("printf.3p", "printf", Some(3)),
            ("notes.txt", "notes", None),
            ("python3.11.1", "python3.11", Some(1)),
        ];
        for (path, name, section) in cases {
            assert_eq!(
                infer_name_and_section(Path::new(path)),
                (name.to_string(), section),
                "{path}"
            );
        }
    }

    #[test]
    fn test_unique_stem_suffixes_collisions() {
        let mut taken = HashSet::new();
        assert_eq!(unique_stem("ls.1", &mut taken), "ls.1");
        assert_eq!(unique_stem("ls.1", &mut taken), "ls.1-2");
        assert_eq!(unique_stem("ls.1", &mut taken), "ls.1-3");
        assert_eq!(unique_stem("cp.1", &mut taken), "cp.1");
    }

    #[test]
    fn test_flags_override_config() {
        let flags = ParseFlags {
            format: OutputFormat::Json,
            config: None,
            plain: true,
            preserve_formatting: true,
        };
        assert_eq!(resolve_options(&flags).unwrap(), ParseOptions::plain());
    }
}
