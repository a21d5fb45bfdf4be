//! Configuration types for bpx.
//!
//! [`Config::load`] reads `~/.config/bpx/config.toml`, creating it with
//! hardcoded defaults if it does not yet exist. [`Config::defaults`] returns
//! the same defaults without touching the filesystem (useful in tests).

use serde::Deserialize;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[dataset]
# path = "/path/to/blueprints.jsonl"

[search]
cancel_check_interval = 256
result_limit          = 0

[display]
truncate_values = 80
link_marker     = "->"

[logging]
debug_file = "/tmp/bpx-debug.log"
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level application configuration, loaded from `~/.config/bpx/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[dataset]` section of `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetConfig {
    /// Dump to load when `--dataset` is not given.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// `[search]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Records scored between two cancellation checks.
    #[serde(default = "default_cancel_check_interval")]
    pub cancel_check_interval: usize,
    /// Maximum rows printed per result set; 0 prints everything.
    #[serde(default)]
    pub result_limit: usize,
}

fn default_cancel_check_interval() -> usize { 256 }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cancel_check_interval: default_cancel_check_interval(),
            result_limit: 0,
        }
    }
}

/// `[display]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_truncate_values")]
    pub truncate_values: usize,
    #[serde(default = "default_link_marker")]
    pub link_marker: String,
}

fn default_truncate_values() -> usize { 80 }
fn default_link_marker() -> String { "->".to_string() }

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            truncate_values: default_truncate_values(),
            link_marker: default_link_marker(),
        }
    }
}

/// `[logging]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_debug_file")]
    pub debug_file: PathBuf,
}

fn default_debug_file() -> PathBuf { PathBuf::from("/tmp/bpx-debug.log") }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug_file: default_debug_file(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `~/.config/bpx/config.toml`, layered on top of the built-in
    /// defaults. Creates the file with defaults if it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
        }

        Self::load_from(&path)
    }

    /// Layer the file at `path` (if present) over the built-in defaults.
    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path).required(false))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("bpx")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
