//! Target configuration.
//!
//! The surrounding compiler driver selects a target and its calling-convention
//! variant with a small TOML document:
//!
//! ```toml
//! target = "videocore"
//!
//! [convention]
//! arg_registers = ["r0", "r1", "r2", "r3", "r4", "r5"]
//! return_registers = ["r0", "r1"]
//! wide_values = "split"        # or "no-split"
//! variadic = "stack"           # or "registers"
//! return_via_pointer = true
//! ```
//!
//! Every field is optional; missing fields take the VideoCore defaults.

use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when reading or validating a target configuration.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Error reading target configuration {}: {message}", .path.display())]
    #[diagnostic(
        code(vcore_lower::config_read),
        help("Check file permissions and ensure the file is not corrupted")
    )]
    Read { path: PathBuf, message: String },

    /// The TOML document is malformed or has fields of the wrong type.
    #[error("Invalid target configuration: {0}")]
    #[diagnostic(
        code(vcore_lower::config_parse),
        help("Check the TOML syntax and the field names of the [convention] table")
    )]
    Parse(String),

    /// No lowering exists for the requested target.
    #[error("Unknown target `{0}`")]
    #[diagnostic(code(vcore_lower::unknown_target), help("Supported targets: videocore (alias vc4)"))]
    UnknownTarget(String),

    /// A register name is not one of `r0`..`r31`.
    #[error("Invalid register name `{0}`")]
    #[diagnostic(code(vcore_lower::bad_register), help("Registers are named r0 through r31"))]
    BadRegister(String),

    /// The same register appears twice in one list.
    #[error("Register `{register}` is listed twice in {list}")]
    #[diagnostic(code(vcore_lower::duplicate_register))]
    DuplicateRegister { register: String, list: &'static str },

    /// A register list that must not be empty is empty.
    #[error("{0} must name at least one register")]
    #[diagnostic(code(vcore_lower::empty_register_list))]
    EmptyRegisterList(&'static str),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// How a 64-bit value is placed when registers run low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WidePolicy {
    /// Low half in the last free register, high half on the stack.
    #[default]
    Split,
    /// Both halves on the stack; no later value uses a register.
    NoSplit,
}

/// Where arguments in the variadic tail of a call go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VariadicPolicy {
    /// Every variadic argument is passed on the stack.
    #[default]
    Stack,
    /// Variadic arguments follow the same rules as fixed ones.
    Registers,
}

/// The `[convention]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConventionConfig {
    pub arg_registers: Vec<String>,
    pub return_registers: Vec<String>,
    pub wide_values: WidePolicy,
    pub variadic: VariadicPolicy,
    pub return_via_pointer: bool,
}

impl Default for ConventionConfig {
    fn default() -> Self {
        ConventionConfig {
            arg_registers: (0..6).map(|i| format!("r{}", i)).collect(),
            return_registers: vec!["r0".to_string(), "r1".to_string()],
            wide_values: WidePolicy::Split,
            variadic: VariadicPolicy::Stack,
            return_via_pointer: true,
        }
    }
}

fn default_target() -> String {
    "videocore".to_string()
}

/// Target selection plus its calling-convention variant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default)]
    pub convention: ConventionConfig,
}

impl Default for TargetConfig {
    fn default() -> Self {
        TargetConfig {
            target: default_target(),
            convention: ConventionConfig::default(),
        }
    }
}

impl TargetConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config = toml::from_str::<TargetConfig>(content)?;
        log::debug!("Parsed target configuration for `{}`", config.target);
        Ok(config)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_toml_str(&content)
    }
}
