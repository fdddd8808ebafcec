//! Flat `key: value` frontmatter for markdown prompt files.
//!
//! Only the subset plugins actually use is accepted: a `---` first line,
//! `key: value` lines, and a closing `---` line. Values are never typed.

use std::collections::HashMap;
use std::path::Path;

const DELIMITER: &str = "---";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    fields: HashMap<String, String>,
}

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Value of `key`, or `default` when the key is absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

pub fn parse_frontmatter(content: &str) -> Frontmatter {
    if !content.starts_with(DELIMITER) {
        return Frontmatter::default();
    }

    let fields = content
        .lines()
        .skip(1)
        .take_while(|line| line.trim() != DELIMITER)
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect();

    Frontmatter { fields }
}

/// Frontmatter of the file at `path`; unreadable or non-UTF-8 files yield empty metadata.
pub fn read_frontmatter(path: &Path) -> Frontmatter {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_frontmatter(&content),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "frontmatter unreadable");
            Frontmatter::default()
        }
    }
}
