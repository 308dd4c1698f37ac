//! Runtime configuration
//!
//! Tuning for the trampoline and its host interaction:
//! - `step_budget`: nodes processed per host turn before yielding
//! - `resume_delay`: delay requested from the host for each resumption
//! - `catch_panics`: whether panicking user functions are reported as errors
//!
//! Settings come from [`RuntimeConfig::default`], a TOML file, and the
//! `EFFECTRON_*` environment variables, in that order of precedence (lowest first).
//!
//! ```toml
//! step_budget = 64
//! resume_delay_ms = 0
//! catch_panics = true
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::runtime::DEFAULT_STEP_BUDGET;

/// Environment variable overriding `step_budget`
pub const ENV_STEP_BUDGET: &str = "EFFECTRON_STEP_BUDGET";
/// Environment variable overriding `resume_delay` (milliseconds)
pub const ENV_RESUME_DELAY_MS: &str = "EFFECTRON_RESUME_DELAY_MS";
/// Environment variable overriding `catch_panics`
pub const ENV_CATCH_PANICS: &str = "EFFECTRON_CATCH_PANICS";

/// Runtime configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Nodes processed in one host turn before the run suspends. Must be at least 1.
    /// Default: 2
    pub step_budget: usize,
    /// Delay passed to the host scheduler on every suspension.
    /// Default: zero (resume as soon as the host is idle)
    pub resume_delay: Duration,
    /// Catch panics from thunks, transforms and continuations and report them
    /// as [`RunError::Panicked`](crate::RunError::Panicked).
    /// Default: true
    pub catch_panics: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            step_budget: DEFAULT_STEP_BUDGET,
            resume_delay: Duration::ZERO,
            catch_panics: true,
        }
    }
}

/// On-disk shape of [`RuntimeConfig`]; absent keys keep their defaults
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuntimeConfigFile {
    step_budget: Option<usize>,
    resume_delay_ms: Option<u64>,
    catch_panics: Option<bool>,
}

impl RuntimeConfig {
    /// A budget so large the run never yields to the host
    pub fn unbounded() -> Self {
        Self {
            step_budget: usize::MAX,
            ..Default::default()
        }
    }

    pub fn with_step_budget(mut self, step_budget: usize) -> Self {
        self.step_budget = step_budget;
        self
    }

    pub fn with_resume_delay(mut self, resume_delay: Duration) -> Self {
        self.resume_delay = resume_delay;
        self
    }

    /// Let panics from user functions unwind through the driver
    pub fn without_panic_catching(mut self) -> Self {
        self.catch_panics = false;
        self
    }

    /// Check invariants. A zero budget would suspend before every node and never progress.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.step_budget == 0 {
            return Err(ConfigError::InvalidStepBudget(self.step_budget));
        }
        Ok(self)
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: RuntimeConfigFile = toml::from_str(source).map_err(ConfigError::Parse)?;
        let mut config = Self::default();
        if let Some(step_budget) = file.step_budget {
            config.step_budget = step_budget;
        }
        if let Some(ms) = file.resume_delay_ms {
            config.resume_delay = Duration::from_millis(ms);
        }
        if let Some(catch_panics) = file.catch_panics {
            config.catch_panics = catch_panics;
        }
        config.validate()
    }

    /// Load a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply `EFFECTRON_*` overrides from the process environment
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_STEP_BUDGET) {
            self.step_budget = parse_var(ENV_STEP_BUDGET, &value)?;
        }
        if let Some(value) = lookup(ENV_RESUME_DELAY_MS) {
            self.resume_delay = Duration::from_millis(parse_var(ENV_RESUME_DELAY_MS, &value)?);
        }
        if let Some(value) = lookup(ENV_CATCH_PANICS) {
            self.catch_panics = parse_var(ENV_CATCH_PANICS, &value)?;
        }
        self.validate()
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

/// Errors produced while building a [`RuntimeConfig`]
#[derive(Debug)]
pub enum ConfigError {
    /// `step_budget` must be at least 1
    InvalidStepBudget(usize),
    /// The configuration file could not be read
    Io { path: PathBuf, source: std::io::Error },
    /// The configuration file is not valid TOML for this schema
    Parse(toml::de::Error),
    /// An environment override could not be parsed
    InvalidEnv { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStepBudget(n) => {
                write!(f, "Invalid step budget {}: must be at least 1", n)
            }
            Self::Io { path, source } => {
                write!(f, "Failed to read config '{}': {}", path.display(), source)
            }
            Self::Parse(e) => write!(f, "Invalid config: {}", e),
            Self::InvalidEnv { var, value } => write!(f, "Invalid value for {}: '{}'", var, value),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}
