//! Core document types for structured manual pages.
//!
//! This crate defines the output contract of the man-page parser:
//!
//! - [`StructuredDocument`]: the immutable parse result (sections, flags,
//!   examples, cross-references, derived metadata).
//! - [`Section`], [`Flag`], [`Example`], [`CrossReference`]: the pieces a
//!   renderer or search indexer consumes.
//! - [`RawDocument`]: the transient input supplied by the source acquirer.
//! - [`ParseOptions`]: the only runtime configuration of the parser.
//!
//! Validation ([`validate_document`]) checks the invariants every assembled
//! document must hold, such as the absence of the NAME section and of
//! self-referencing SEE ALSO entries.
//!
//! # Example
//!
//! ```
//! use man_structure_core::*;
//!
//! let flag = Flag::new("--recursive", "copy directories recursively").with_short("-r");
//! assert_eq!(flag.flag, "--recursive");
//!
//! let raw = RawDocument::new("cp", "NAME\n       cp - copy files and directories\n");
//! assert_eq!(raw.command_name_hint, "cp");
//! assert!(ParseOptions::default().convert_to_markdown);
//! ```

mod types;
mod validate;

pub use types::*;
pub use validate::{MIN_SECTION_CONTENT_CHARS, ValidationError, validate_document};
