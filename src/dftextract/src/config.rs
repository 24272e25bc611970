//! Extraction configuration
//!
//! ```toml
//! ambiguity = "error"      # or "first" (default)
//! skip = ["Density of States", "Forces"]
//! max_depth = 3
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What to do when more than one backend accepts a directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguityPolicy {
    /// Take the first match in registration order
    #[default]
    First,
    /// Fail with `AmbiguousBackend`
    Error,
}

fn default_max_depth() -> usize {
    4
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ambiguity: AmbiguityPolicy,
    /// Canonical property names never attempted
    pub skip: Vec<String>,
    /// How deep [`crate::discover`] descends below the root
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ambiguity: AmbiguityPolicy::default(),
            skip: Vec::new(),
            max_depth: default_max_depth(),
        }
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&contents)
    }

    pub fn is_skipped(&self, name: &str) -> bool {
        self.skip.iter().any(|s| s == name)
    }
}
