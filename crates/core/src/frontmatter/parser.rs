//! Frontmatter parsing from markdown documents.

use super::types::Frontmatter;
use thiserror::Error;

/// Errors that can occur during frontmatter parsing.
#[derive(Debug, Error)]
pub enum FrontmatterParseError {
    #[error("invalid YAML frontmatter: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
}

const DELIMITER: &str = "---";

/// Split a document into its raw frontmatter block and body.
///
/// The content must open with a `---` line and a matching `---` line must
/// follow; anything else means the document has no metadata block.
pub fn split(content: &str) -> Option<(&str, &str)> {
    let first_line_end = content.find('\n').unwrap_or(content.len());
    if content[..first_line_end].trim_end() != DELIMITER {
        return None;
    }

    let after_open = content.get(first_line_end + 1..)?;
    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let yaml = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// Parse a raw YAML block into frontmatter. An empty block is an empty
/// mapping, not an error.
pub fn parse_yaml(yaml: &str) -> Result<Frontmatter, FrontmatterParseError> {
    if yaml.trim().is_empty() {
        return Ok(Frontmatter::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}
