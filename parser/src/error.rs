//! Error types for parsing and configuration loading.
//!
//! Parsing itself is total over textual input: the only rejected case is a
//! document with no usable text. Everything else degrades to empty fields.

use thiserror::Error;

/// Errors returned by [`ManPageParser::parse`](crate::ManPageParser::parse).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Neither the formatted text nor the groff source has enough content.
    #[error("man page input unavailable: {length} characters, at least {minimum} required")]
    InputUnavailable { length: usize, minimum: usize },
}

/// Errors that can occur while loading parser configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;
