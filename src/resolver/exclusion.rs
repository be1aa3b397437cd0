//! Module exclusion patterns
//!
//! Patterns are matched against a module's short name by substring
//! containment, never by exact identity, so one pattern filters a whole
//! family of modules.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Direction of the containment test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionMatch {
    /// Excluded when a pattern contains the module name
    PatternContainsName,
    /// Excluded when the module name contains a pattern
    NameContainsPattern,
    /// Excluded when either string contains the other
    #[default]
    Either,
}

/// Set of exclusion patterns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    patterns: HashSet<String>,
    mode: ExclusionMatch,
}

impl ExclusionSet {
    /// Empty set with the default match mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Set of patterns with the default match mode
    ///
    /// Blank patterns are dropped.
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for pattern in patterns {
            set.insert(pattern);
        }
        set
    }

    pub fn with_mode(mut self, mode: ExclusionMatch) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ExclusionMatch {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ExclusionMatch) {
        self.mode = mode;
    }

    /// Add a pattern; returns false if it was already present or is blank
    pub fn insert(&mut self, pattern: impl Into<String>) -> bool {
        let pattern = pattern.into();
        if pattern.trim().is_empty() {
            return false;
        }
        self.patterns.insert(pattern)
    }

    pub fn remove(&mut self, pattern: &str) -> bool {
        self.patterns.remove(pattern)
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.patterns.contains(pattern)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }

    /// Whether a module with this short name is excluded
    pub fn is_excluded(&self, module_name: &str) -> bool {
        if module_name.is_empty() {
            return false;
        }
        self.patterns.iter().any(|pattern| match self.mode {
            ExclusionMatch::PatternContainsName => pattern.contains(module_name),
            ExclusionMatch::NameContainsPattern => module_name.contains(pattern.as_str()),
            ExclusionMatch::Either => {
                pattern.contains(module_name) || module_name.contains(pattern.as_str())
            }
        })
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_patterns(iter)
    }
}
