//! Configuration management with hierarchical layering.
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌──────────────────────────────────────────────┐
//! │  1. Environment Variables (STAGEHAND_*)      │
//! ├──────────────────────────────────────────────┤
//! │  2. Project Config (.stagehand/config.toml)  │
//! ├──────────────────────────────────────────────┤
//! │  3. Global Config (~/.stagehand/config.toml) │
//! ├──────────────────────────────────────────────┤
//! │  4. Default Values                           │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `STAGEHAND_MAX_ATTEMPTS` | `runtime.max_attempts` | integer |
//! | `STAGEHAND_INSTRUCTION_LIMIT` | `runtime.instruction_limit` | integer |
//! | `STAGEHAND_GRANTS` | `grants.capabilities` | comma list |
//! | `STAGEHAND_PACK` | `pack.manifest` | path |
//! | `STAGEHAND_MOOD` | `pack.mood` | string |
//!
//! # Example Configuration
//!
//! ```toml
//! [runtime]
//! max_attempts = 3
//! instruction_limit = 1000000
//! max_output_bytes = 32768
//! feedback_history = 50
//!
//! [grants]
//! capabilities = ["image", "audio", "prompt"]
//!
//! [pack]
//! manifest = "packs/ocean/pack.toml"
//! mood = "calm"
//! ```

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::{GrantsConfig, PackConfig, RuntimeConfig, StagehandConfig};

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".stagehand")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join(PROJECT_CONFIG_FILE)
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".stagehand";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
