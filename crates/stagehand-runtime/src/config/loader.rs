//! Configuration loader with hierarchical merging.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Global config (`~/.stagehand/config.toml`)
//! 3. Project config (`<root>/.stagehand/config.toml`)
//! 4. Environment variables (`STAGEHAND_*`)
//!
//! Each layer overrides the previous.

use super::{default_config_path, ConfigError, StagehandConfig, PROJECT_CONFIG_DIR, PROJECT_CONFIG_FILE};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parses a numeric environment variable into `$field`.
macro_rules! parse_env_num {
    ($field:expr, $var:literal) => {
        if let Ok(val) = std::env::var($var) {
            $field = val
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid_env_var($var, format!("expected integer: {e}")))?;
        }
    };
}

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```no_run
/// use stagehand_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_project_root("/path/to/project")
///     .skip_env_vars()
///     .load()?;
/// # Ok::<(), stagehand_runtime::config::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Global config file path (defaults to `~/.stagehand/config.toml`).
    global_config_path: Option<PathBuf>,

    project_root: Option<PathBuf>,

    skip_env: bool,
    skip_global: bool,
    skip_project: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Project config is read from `<path>/.stagehand/config.toml`.
    #[must_use]
    pub fn with_project_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_root = Some(path.into());
        self
    }

    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    #[must_use]
    pub fn skip_global_config(mut self) -> Self {
        self.skip_global = true;
        self
    }

    #[must_use]
    pub fn skip_project_config(mut self) -> Self {
        self.skip_project = true;
        self
    }

    /// Loads and merges configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a config file exists but cannot be read or
    /// parsed, or an environment variable is malformed. Missing files are
    /// ignored.
    pub fn load(&self) -> Result<StagehandConfig, ConfigError> {
        let mut config = StagehandConfig::default();

        if !self.skip_global {
            let global_path = self
                .global_config_path
                .clone()
                .unwrap_or_else(default_config_path);

            if let Some(global) = load_file(&global_path)? {
                debug!(path = %global_path.display(), "loaded global config");
                config.merge(&global);
            }
        }

        if !self.skip_project {
            if let Some(ref root) = self.project_root {
                let path = root.join(PROJECT_CONFIG_DIR).join(PROJECT_CONFIG_FILE);
                if let Some(project) = load_file(&path)? {
                    debug!(path = %path.display(), "loaded project config");
                    config.merge(&project);
                }
            }
        }

        if !self.skip_env {
            apply_env_vars(&mut config)?;
        }

        Ok(config)
    }
}

fn load_file(path: &Path) -> Result<Option<StagehandConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let config = StagehandConfig::from_toml(&content).map_err(|e| ConfigError::parse_toml(path, e))?;
    Ok(Some(config))
}

fn apply_env_vars(config: &mut StagehandConfig) -> Result<(), ConfigError> {
    parse_env_num!(config.runtime.max_attempts, "STAGEHAND_MAX_ATTEMPTS");
    parse_env_num!(config.runtime.instruction_limit, "STAGEHAND_INSTRUCTION_LIMIT");

    if let Ok(val) = std::env::var("STAGEHAND_GRANTS") {
        config.grants.capabilities = Some(split_list(&val));
    }
    if let Ok(val) = std::env::var("STAGEHAND_PACK") {
        config.pack.manifest = Some(PathBuf::from(val));
    }
    if let Ok(val) = std::env::var("STAGEHAND_MOOD") {
        config.pack.mood = Some(val);
    }
    Ok(())
}

/// Splits a comma separated list, dropping blanks.
fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
