//! Integration tests for the parse-file, parse-stdin, normalize and batch flows.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

fn man_structure_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_man-structure"))
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("parser")
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn run(args: &[&str]) -> std::process::Output {
    Command::new(man_structure_bin())
        .args(args)
        .output()
        .expect("failed to run man-structure")
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("Invalid JSON output: {e}\n{stdout}"))
}

// ---- parse-file ----

#[test]
fn test_parse_file_infers_name_and_section() {
    let input = fixture("ls.1");
    let output = run(&["parse-file", "--input", input.to_str().unwrap()]);
    let doc = stdout_json(&output);

    assert_eq!(doc["name"], "ls");
    assert_eq!(doc["section"], 1);
    assert_eq!(doc["title"], "list directory contents");
    assert_eq!(doc["flags"][0]["flag"], "--all");
    assert_eq!(doc["flags"][0]["shortFlag"], "-a");
    assert_eq!(doc["seeAlso"][0]["name"], "dir");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning: Unknown macros ignored: .XY"), "{stderr}");
}

#[test]
fn test_parse_file_groff_and_plain() {
    let input = fixture("ls.1");
    let output = run(&[
        "parse-file",
        "--groff",
        "--plain",
        "--name",
        "ls",
        "--input",
        input.to_str().unwrap(),
    ]);
    let doc = stdout_json(&output);

    let sections = doc["sections"].as_array().unwrap();
    assert!(
        sections
            .iter()
            .all(|section| !section["content"].as_str().unwrap().contains("**"))
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("parsed groff source instead"), "{stderr}");
}

#[test]
fn test_parse_file_markdown_output() {
    let input = fixture("ls.txt");
    let output = run(&[
        "parse-file",
        "--format",
        "markdown",
        "--input",
        input.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "parse-file failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("# ls(1) - list directory contents"), "{stdout}");
    assert!(stdout.contains("## Options"));
    assert!(stdout.contains("```sh\n$ ls -la\n```"));
}

#[test]
fn test_parse_file_yaml_output() {
    let input = fixture("ls.txt");
    let output = run(&[
        "parse-file",
        "--format",
        "yaml",
        "--input",
        input.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: ls"), "{stdout}");
    assert!(stdout.contains("complexity: basic"), "{stdout}");
}

#[test]
fn test_parse_file_with_config() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    config.write_all(b"convertToMarkdown: false\n").unwrap();

    let input = fixture("ls.1");
    let output = run(&[
        "parse-file",
        "--config",
        config.path().to_str().unwrap(),
        "--input",
        input.to_str().unwrap(),
    ]);
    let doc = stdout_json(&output);
    let examples = doc["sections"]
        .as_array()
        .unwrap()
        .iter()
        .find(|section| section["title"] == "EXAMPLES")
        .unwrap();
    assert!(!examples["content"].as_str().unwrap().contains("```"));
}

#[test]
fn test_parse_file_missing_input_fails() {
    let output = run(&["parse-file", "--input", "/nonexistent/ls.1"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: Failed to read"), "{stderr}");
}

// ---- parse-stdin ----

#[test]
fn test_parse_stdin() {
    let mut child = Command::new(man_structure_bin())
        .args(["parse-stdin", "--name", "ls", "--section", "1"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn man-structure");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(fs::read_to_string(fixture("ls.txt")).unwrap().as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let doc = stdout_json(&output);
    assert_eq!(doc["name"], "ls");
    assert_eq!(doc["synopsis"], "ls [OPTION]... [FILE]...");
}

#[test]
fn test_parse_stdin_unavailable_input() {
    let mut child = Command::new(man_structure_bin())
        .args(["parse-stdin", "--name", "ls"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn man-structure");
    child.stdin.take().unwrap().write_all(b"ls(1)\n").unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: man page input unavailable"), "{stderr}");
}

// ---- normalize ----

#[test]
fn test_normalize_markdown() {
    let input = fixture("ls.1");
    let output = run(&["normalize", "--markdown", "--input", input.to_str().unwrap()]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("## NAME\n\nls - list directory contents"), "{stdout}");
    assert!(stdout.contains("```\n$ ls -la\n```"));
}

// ---- batch ----

#[test]
fn test_batch_writes_one_file_per_page() {
    let output_dir = tempfile::tempdir().unwrap();
    let pages = tempfile::tempdir().unwrap();
    let ls = pages.path().join("ls.1");
    let empty = pages.path().join("empty.1");
    fs::copy(fixture("ls.1"), &ls).unwrap();
    fs::write(&empty, "").unwrap();

    let output = run(&[
        "batch",
        "--jobs",
        "2",
        "--output",
        output_dir.path().to_str().unwrap(),
        ls.to_str().unwrap(),
        empty.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "batch failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Parsed and wrote 1 document(s)."), "{stdout}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 page(s) had no usable input"), "{stderr}");

    let written = fs::read_to_string(output_dir.path().join("ls.1.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(doc["title"], "list directory contents");
}

#[test]
fn test_batch_keeps_pages_with_the_same_name() {
    let output_dir = tempfile::tempdir().unwrap();
    let pages = tempfile::tempdir().unwrap();
    let first = pages.path().join("man1").join("ls.1");
    let second = pages.path().join("local").join("ls.1");
    for page in [&first, &second] {
        fs::create_dir_all(page.parent().unwrap()).unwrap();
        fs::copy(fixture("ls.1"), page).unwrap();
    }

    let output = run(&[
        "batch",
        "--output",
        output_dir.path().to_str().unwrap(),
        first.to_str().unwrap(),
        second.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "batch failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Parsed and wrote 2 document(s)."), "{stdout}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("using a suffixed file name"), "{stderr}");

    assert!(output_dir.path().join("ls.1.json").exists());
    assert!(output_dir.path().join("ls.1-2.json").exists());
}
