//! Parser configuration files.
//!
//! [`ParseOptions`] is the only runtime configuration. It can be kept in a
//! YAML file; missing keys take their defaults.
//!
//! # Example YAML
//!
//! ```yaml
//! convertToMarkdown: false
//! preserveFormatting: true
//! ```

use std::io::BufReader;
use std::path::Path;

use man_structure_core::ParseOptions;

use crate::error::ConfigError;

/// Loads parse options from a YAML file.
///
/// An empty file yields the defaults.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, or
/// [`ConfigError::Yaml`] if parsing fails.
///
/// # Examples
///
/// ```no_run
/// use man_structure_parser::config::load_options;
///
/// let options = load_options("man-structure.yml").unwrap();
/// println!("markdown: {}", options.convert_to_markdown);
/// ```
pub fn load_options(path: impl AsRef<Path>) -> Result<ParseOptions, ConfigError> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let options: Option<ParseOptions> = serde_yaml::from_reader(reader)?;
    Ok(options.unwrap_or_default())
}
