//! Minimal `.properties` reader for component locator files.
//!
//! Supports `key=value` and `key: value` pairs, `#`/`!` comments, blank lines
//! and trailing-backslash continuation lines. Values are trimmed.

use std::collections::HashMap;
use std::path::Path;

use crate::result::{ActionError, ActionResult};

/// Key/value store for one component
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyStore {
    name: String,
    entries: HashMap<String, String>,
}

impl PropertyStore {
    /// Create an empty store
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Parse property text
    #[must_use]
    pub fn parse(name: impl Into<String>, text: &str) -> Self {
        let mut store = Self::new(name);
        let mut pending = String::new();

        for raw in text.lines() {
            let line = raw.trim();
            if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!'))
            {
                continue;
            }

            if let Some(head) = line.strip_suffix('\\') {
                pending.push_str(head);
                continue;
            }
            pending.push_str(line);

            let logical = std::mem::take(&mut pending);
            store.insert_line(&logical);
        }

        if !pending.is_empty() {
            store.insert_line(&pending);
        }
        store
    }

    /// Read and parse a property file
    pub fn from_file(name: impl Into<String>, path: &Path) -> ActionResult<Self> {
        let name = name.into();
        let text =
            std::fs::read_to_string(path).map_err(|e| ActionError::PropertyStoreUnavailable {
                component: name.clone(),
                message: format!("{}: {e}", path.display()),
            })?;
        Ok(Self::parse(name, &text))
    }

    fn insert_line(&mut self, line: &str) {
        let split_at = line.find(['=', ':']);
        let (key, value) = match split_at {
            Some(idx) => (&line[..idx], &line[idx + 1..]),
            None => (line, ""),
        };
        let key = key.trim();
        if !key.is_empty() {
            let _ = self
                .entries
                .insert(key.to_string(), value.trim().to_string());
        }
    }

    /// Set a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let _ = self.entries.insert(key.into(), value.into());
    }

    /// Look up a non-empty value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Store name (the component)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the store has no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
