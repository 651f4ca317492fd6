//! `.env` files: ordered `KEY=value` lines.
//!
//! The bootstrapper writes one of these for the orchestration stack, and the
//! config layer reads it back to resolve provider secrets that are not set in
//! the process environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvFileError {
    #[error("line {line}: expected KEY=value, got '{content}'")]
    Malformed { line: usize, content: String },

    #[error("line {line}: empty key")]
    EmptyKey { line: usize },

    #[error("env file I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Ordered set of environment entries. Setting an existing key replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    entries: Vec<(String, String)>,
}

impl EnvFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One `KEY=value` per line, newline-terminated.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (k, v) in &self.entries {
            out.push_str(k);
            out.push('=');
            out.push_str(v);
            out.push('\n');
        }
        out
    }

    /// Parse `.env` content. Blank lines and `#` comments are skipped, and one
    /// layer of matching quotes is stripped from values.
    pub fn parse(content: &str) -> Result<Self, EnvFileError> {
        let mut env = EnvFile::new();
        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=').ok_or_else(|| EnvFileError::Malformed {
                line: idx + 1,
                content: raw.to_string(),
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(EnvFileError::EmptyKey { line: idx + 1 });
            }
            env.set(key, unquote(value.trim()));
        }
        Ok(env)
    }

    pub fn load(path: &Path) -> Result<Self, EnvFileError> {
        let content = fs::read_to_string(path).map_err(|source| EnvFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Write the file, replacing whatever was there.
    pub fn write(&self, path: &Path) -> Result<(), EnvFileError> {
        fs::write(path, self.render()).map_err(|source| EnvFileError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' || first == b'\'') && first == last {
            return &value[1..value.len() - 1];
        }
    }
    value
}
