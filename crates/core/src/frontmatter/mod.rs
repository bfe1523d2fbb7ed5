//! Frontmatter extraction.
//!
//! This module provides functionality to:
//! - Split a `---` delimited metadata block from markdown content
//! - Parse that block as a YAML key-value document
//! - Read typed values (strings, string lists, tags) out of it

pub mod parser;
pub mod types;

pub use parser::{FrontmatterParseError, parse_yaml, split};
pub use types::Frontmatter;
