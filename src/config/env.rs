//! Environment-sourced settings.
//!
//! # Responsibilities
//! - Snapshot the process environment once at startup
//! - Fill unset keys from a local env file (`KEY=VALUE` lines)
//! - Never overwrite a key that the process environment already defines
//!
//! # Design Decisions
//! - The process environment itself is never mutated; the merged view is a plain value
//! - A missing env file is normal (production sets real variables)

use std::collections::HashMap;
use std::io;
use std::path::Path;

/// Immutable key/value view of the gateway's environment.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Snapshot the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build an environment from explicit pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Merge an env file into this environment.
    ///
    /// Keys already present are left untouched. Returns `Ok(false)` when the
    /// file does not exist.
    pub fn merge_env_file(&mut self, path: &Path) -> io::Result<bool> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        let mut added = 0usize;
        for (key, value) in parse_env_file(&content) {
            if !self.vars.contains_key(&key) {
                self.vars.insert(key, value);
                added += 1;
            }
        }

        tracing::debug!(path = ?path, added, "Env file merged");
        Ok(true)
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

/// Parse `KEY=VALUE` lines, skipping blanks and `#` comments.
fn parse_env_file(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
