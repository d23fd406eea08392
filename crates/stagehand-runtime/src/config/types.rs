//! Configuration types.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use stagehand_auth::Capability;
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StagehandConfig {
    pub runtime: RuntimeConfig,
    pub grants: GrantsConfig,
    pub pack: PackConfig,
}

impl StagehandConfig {
    /// Parses a TOML document; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Malformed TOML or mistyped values.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Renders the configuration as a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Serialize`] on serialization failure.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Overlays `other` onto `self`.
    ///
    /// Values in `other` that equal the defaults are treated as unset.
    pub fn merge(&mut self, other: &Self) {
        self.runtime.merge(&other.runtime);
        self.grants.merge(&other.grants);
        self.pack.merge(&other.pack);
    }

    /// Granted capabilities. Unknown names are logged and skipped.
    #[must_use]
    pub fn granted_capabilities(&self) -> Capability {
        let names = self.grants.capabilities.as_deref().unwrap_or_default();
        let (caps, unknown) = Capability::parse_list(names);
        for name in unknown {
            tracing::warn!(capability = name, "ignoring unknown capability in grants");
        }
        caps
    }
}

/// Turn loop and sandbox limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Attempts per turn, compile and execution failures combined.
    pub max_attempts: u32,

    /// VM instructions before a script is aborted.
    pub instruction_limit: u32,

    /// Cap on captured `print` output per script.
    pub max_output_bytes: usize,

    /// Failure messages kept for the conversation context.
    pub feedback_history: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            instruction_limit: 1_000_000,
            max_output_bytes: 32_768,
            feedback_history: 50,
        }
    }
}

impl RuntimeConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.max_attempts != default.max_attempts {
            self.max_attempts = other.max_attempts;
        }
        if other.instruction_limit != default.instruction_limit {
            self.instruction_limit = other.instruction_limit;
        }
        if other.max_output_bytes != default.max_output_bytes {
            self.max_output_bytes = other.max_output_bytes;
        }
        if other.feedback_history != default.feedback_history {
            self.feedback_history = other.feedback_history;
        }
    }
}

/// What the user allows packs to do.
///
/// `None` grants nothing; an explicit empty list in a later layer revokes
/// grants made by an earlier one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GrantsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<String>>,
}

impl GrantsConfig {
    fn merge(&mut self, other: &Self) {
        if other.capabilities.is_some() {
            self.capabilities.clone_from(&other.capabilities);
        }
    }
}

/// Pack selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PackConfig {
    /// Path to the pack manifest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,

    /// Mood to start in; the pack default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
}

impl PackConfig {
    fn merge(&mut self, other: &Self) {
        if other.manifest.is_some() {
            self.manifest.clone_from(&other.manifest);
        }
        if other.mood.is_some() {
            self.mood.clone_from(&other.mood);
        }
    }
}
