//! Configuration management for reference resolution
//!
//! Handles configuration loading from TOML or JSON files and environment
//! overrides.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::resolver::exclusion::ExclusionMatch;
use crate::utils::env::{env_opt, split_list};

/// Environment variable selecting the resolution strategy
pub const ENV_STRATEGY: &str = "REFERENCE_RESOLVER_STRATEGY";

/// Environment variable adding comma-separated exclusion patterns
pub const ENV_EXCLUDE: &str = "REFERENCE_RESOLVER_EXCLUDE";

/// How the primary reference set is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStrategy {
    /// Every module currently loaded in the process (default)
    #[default]
    Snapshot,
    /// The root and its transitive static references, when the root has a
    /// usable dependency manifest; otherwise the snapshot
    Transitive,
}

impl std::str::FromStr for ResolutionStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snapshot" => Ok(ResolutionStrategy::Snapshot),
            "transitive" => Ok(ResolutionStrategy::Transitive),
            other => Err(anyhow::anyhow!("Unknown resolution strategy: {}", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (e.g. "info", "reference_resolver=debug")
    #[serde(default)]
    pub filter: Option<String>,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json_format: bool,
}

/// Resolver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Exclusion patterns matched against module short names
    #[serde(default)]
    pub excluded_modules: Vec<String>,

    /// Direction of the exclusion containment test
    #[serde(default)]
    pub exclusion_match: ExclusionMatch,

    /// Metadata blob files always handed to the compiler
    #[serde(default)]
    pub additional_references: Vec<PathBuf>,

    /// Primary resolution strategy
    #[serde(default)]
    pub strategy: ResolutionStrategy,

    /// Logging configuration
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

impl ResolverConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ResolverConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ResolverConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, choosing the format by file extension
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Save configuration to a TOML file
    pub fn to_toml_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from a file, apply environment overrides and validate
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides
    ///
    /// `REFERENCE_RESOLVER_STRATEGY` replaces the strategy and
    /// `REFERENCE_RESOLVER_EXCLUDE` appends exclusion patterns.
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        self.apply_overrides_with(env_opt)
    }

    /// Apply overrides read through `lookup` instead of the process environment
    pub fn apply_overrides_with<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(strategy) = lookup(ENV_STRATEGY) {
            self.strategy = strategy
                .parse()
                .with_context(|| format!("Invalid {}", ENV_STRATEGY))?;
            debug!("Strategy overridden from environment: {:?}", self.strategy);
        }

        let patterns = lookup(ENV_EXCLUDE)
            .map(|value| split_list(&value))
            .unwrap_or_default();
        for pattern in patterns {
            if !self.excluded_modules.contains(&pattern) {
                self.excluded_modules.push(pattern);
            }
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(blank) = self.excluded_modules.iter().find(|p| p.trim().is_empty()) {
            return Err(anyhow::anyhow!(
                "Exclusion patterns must not be blank (got {:?})",
                blank
            ));
        }

        for path in &self.additional_references {
            if path.as_os_str().is_empty() {
                return Err(anyhow::anyhow!("Additional reference path must not be empty"));
            }
        }

        Ok(())
    }
}
