//! Configuration management for tandem.
//!
//! This module provides the [`Config`] struct which controls file discovery and
//! the external sorter/formatter commands. Configuration can be loaded from:
//! - `tandem.toml` files (top-level keys)
//! - `pyproject.toml` files (the `[tool.tandem]` table)
//! - An explicit file passed with `--config`
//!
//! Config files are discovered by searching from the file being formatted up
//! towards the filesystem root. The first directory holding a config file is
//! the project root; settings are not merged across directories.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::Context;
use glob::Pattern;
use serde::Deserialize;

use crate::Result;

/// Config file names checked in each directory, first match wins
const CONFIG_FILE_NAMES: &[&str] = &["tandem.toml", "pyproject.toml"];

/// Name of the `[tool.*]` table read from `pyproject.toml`
const PYPROJECT_TABLE: &str = "tandem";

fn default_extensions() -> Vec<String> {
    vec!["py".to_string(), "pyi".to_string()]
}

/// Settings for one external transform
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ToolConfig {
    /// Program and arguments; `{path}` is replaced with the file path.
    /// An empty command disables the transform.
    #[serde(default)]
    pub command: Vec<String>,
}

impl ToolConfig {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.command.is_empty()
    }
}

/// Per-project configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the config file, if one was found
    pub project_root: Option<PathBuf>,

    /// Config file the settings came from
    pub config_path: Option<PathBuf>,

    /// Glob patterns for paths to leave alone
    pub excludes: Vec<String>,

    /// File extensions picked up when walking directories (default: py, pyi)
    pub extensions: Vec<String>,

    /// Files containing this text are skipped
    pub skip_marker: Option<String>,

    /// Import sorter command, run first
    pub sort: ToolConfig,

    /// Code formatter command, run second
    pub format: ToolConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: None,
            config_path: None,
            excludes: Vec::new(),
            extensions: default_extensions(),
            skip_marker: None,
            sort: ToolConfig::default(),
            format: ToolConfig::default(),
        }
    }
}

/// Partial configuration for TOML parsing
///
/// All fields are `Option<T>` so we can distinguish between
/// "explicitly set" and "not specified" when applying to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialConfig {
    pub excludes: Option<Vec<String>>,
    pub extensions: Option<Vec<String>>,
    pub skip_marker: Option<String>,
    pub sort: Option<ToolConfig>,
    pub format: Option<ToolConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    #[serde(default)]
    tool: HashMap<String, toml::Value>,
}

impl Config {
    /// Validate configuration values
    ///
    /// Returns `None` if valid, or `Some(error_message)` if invalid.
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        for exclude in &self.excludes {
            if let Err(e) = Pattern::new(exclude) {
                return Some(format!("invalid exclude pattern {exclude:?}: {e}"));
            }
        }
        if self.extensions.iter().any(String::is_empty) {
            return Some("extensions must not be empty strings".to_string());
        }
        None
    }

    /// Compiled exclude patterns; invalid patterns are dropped
    ///
    /// A trailing `/` marks a directory pattern and is stripped, since
    /// patterns are also matched against single path components.
    #[must_use]
    pub fn exclude_patterns(&self) -> Vec<Pattern> {
        self.excludes
            .iter()
            .filter_map(|p| Pattern::new(p.trim_end_matches('/')).ok())
            .collect()
    }

    /// Load configuration from a `tandem.toml` or `pyproject.toml` file
    ///
    /// A `pyproject.toml` without a `[tool.tandem]` table yields defaults,
    /// with the project root still set to its directory.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let partial = if is_pyproject(path) {
            let pyproject: PyProject = toml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            match pyproject.tool.get(PYPROJECT_TABLE) {
                Some(table) => table
                    .clone()
                    .try_into::<PartialConfig>()
                    .with_context(|| format!("invalid [tool.tandem] in {}", path.display()))?,
                None => PartialConfig::default(),
            }
        } else {
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?
        };

        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let mut config = Self {
            project_root: path.parent().map(Path::to_path_buf),
            config_path: Some(path.clone()),
            ..Self::default()
        };
        config.apply_partial(partial);

        if let Some(error) = config.validate() {
            anyhow::bail!("invalid configuration in {}: {error}", path.display());
        }
        Ok(config)
    }

    /// Apply a partial config, only overriding fields that are explicitly set
    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(v) = partial.excludes {
            self.excludes = v;
        }
        if let Some(v) = partial.extensions {
            self.extensions = v
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect();
        }
        if let Some(v) = partial.skip_marker {
            self.skip_marker = Some(v).filter(|marker| !marker.is_empty());
        }
        if let Some(v) = partial.sort {
            self.sort = v;
        }
        if let Some(v) = partial.format {
            self.format = v;
        }
    }

    /// Find the config file governing a given path
    ///
    /// Searches from the path's directory (or the path itself if it is a
    /// directory) up to the root. Paths that don't exist start the search in
    /// the current directory.
    #[must_use]
    pub fn discover_config_file(start_path: &Path) -> Option<PathBuf> {
        let start_dir = discovery_start(start_path)?;

        for ancestor in start_dir.ancestors() {
            for config_name in CONFIG_FILE_NAMES {
                let config_path = ancestor.join(config_name);
                if config_path.is_file() {
                    return Some(config_path);
                }
            }
        }
        None
    }

    /// Load configuration for a path via discovery
    ///
    /// Returns the default config if no file is found.
    pub fn from_discovered_file(start_path: &Path) -> Result<Self> {
        match Self::discover_config_file(start_path) {
            Some(path) => Self::from_toml_file(&path),
            None => Ok(Self::default()),
        }
    }
}

fn is_pyproject(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == "pyproject.toml")
}

fn discovery_start(start_path: &Path) -> Option<PathBuf> {
    let start_dir = if start_path.is_file() {
        match start_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    } else if start_path.is_dir() {
        start_path.to_path_buf()
    } else {
        // Path doesn't exist, use current directory
        std::env::current_dir().ok()?
    };
    Some(start_dir.canonicalize().unwrap_or(start_dir))
}

/// Resolves the configuration that applies to a path
pub trait ConfigResolver: Send + Sync {
    fn resolve(&self, path: &Path) -> Result<Config>;
}

/// Filesystem discovery, cached per starting directory
#[derive(Debug, Default)]
pub struct DiscoveredConfig {
    cache: Mutex<HashMap<PathBuf, Config>>,
}

impl DiscoveredConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigResolver for DiscoveredConfig {
    fn resolve(&self, path: &Path) -> Result<Config> {
        let Some(start_dir) = discovery_start(path) else {
            return Ok(Config::default());
        };

        if let Some(config) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&start_dir)
        {
            return Ok(config.clone());
        }

        let config = Config::from_discovered_file(&start_dir)?;
        if let Some(config_path) = &config.config_path {
            log::debug!(
                "Using config {} for {}",
                config_path.display(),
                path.display()
            );
        }
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(start_dir, config.clone());
        Ok(config)
    }
}

/// The same configuration for every path
#[derive(Debug, Clone, Default)]
pub struct FixedConfig(pub Config);

impl ConfigResolver for FixedConfig {
    fn resolve(&self, _path: &Path) -> Result<Config> {
        Ok(self.0.clone())
    }
}
