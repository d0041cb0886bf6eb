use std::path::PathBuf;

use serde::Deserialize;

use crate::evaluation::SandboxConfig;
use crate::format::DEFAULT_FORMAT;
use crate::range::RangeSpec;

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub version: u32,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub range: RangeSpec,
    #[serde(default)]
    pub scripting: ScriptingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// Format specifier used when neither widget nor variable names one.
    #[serde(default = "default_format")]
    pub default_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { default_format: default_format() }
    }
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScriptingConfig {
    /// Maximum memory for the formula VM in bytes (0 = unlimited).
    #[serde(default = "default_memory_limit")]
    pub memory_limit: usize,

    /// Maximum instructions a single formula may run (0 = unlimited).
    #[serde(default = "default_instruction_limit")]
    pub instruction_limit: u32,
}

impl Default for ScriptingConfig {
    fn default() -> Self {
        Self {
            memory_limit: default_memory_limit(),
            instruction_limit: default_instruction_limit(),
        }
    }
}

fn default_memory_limit() -> usize {
    SandboxConfig::restricted().memory_limit
}

fn default_instruction_limit() -> u32 {
    SandboxConfig::restricted().instruction_limit
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file_level: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file_level: None, file: None }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// File the settings came from; `None` when running on defaults.
    pub source: Option<PathBuf>,
    pub display: DisplayConfig,
    pub range: RangeSpec,
    pub sandbox: SandboxConfig,
    pub logging: LoggingConfig,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            source: None,
            display: DisplayConfig::default(),
            range: RangeSpec::default(),
            sandbox: SandboxConfig::restricted(),
            logging: LoggingConfig::default(),
        }
    }
}
