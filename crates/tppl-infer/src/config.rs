use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tppl_core::{ErrorInfo, TpplError};
use tppl_wire::DEFAULT_PREVIEW_BYTES;

/// YAML-configurable parameters of a model run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Inference method passed to the compiler.
    #[serde(default = "default_method")]
    pub method: String,
    /// Number of particles (samples) per run.
    #[serde(default = "default_particles")]
    pub particles: usize,
    /// Optional number of subsamples the runtime should emit.
    #[serde(default)]
    pub subsamples: Option<usize>,
    /// Additional compiler flags keyed by option name.
    #[serde(default)]
    pub flags: BTreeMap<String, FlagValue>,
    /// Master seed and substream policy for host-side resampling.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
    /// Output handling.
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_method() -> String {
    "smc-bpf".to_string()
}

fn default_particles() -> usize {
    1000
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
            particles: default_particles(),
            subsamples: None,
            flags: BTreeMap::new(),
            seed_policy: SeedPolicy::default(),
            output: OutputConfig::default(),
        }
    }
}

impl RunConfig {
    /// Parses a YAML configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, TpplError> {
        serde_yaml::from_str(yaml)
            .map_err(|err| TpplError::Config(ErrorInfo::new("config-parse", err.to_string())))
    }

    /// Reads and parses a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self, TpplError> {
        let yaml = fs::read_to_string(path).map_err(|err| {
            TpplError::Config(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&yaml).map_err(|err| match err {
            TpplError::Config(info) => {
                TpplError::Config(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Argument vector for the external compiler.
    ///
    /// Extra flags become `--name-with-dashes value`; a `true` switch is passed
    /// bare and a `false` switch is left out.
    pub fn compiler_args(&self, source_file: &str) -> Vec<String> {
        let mut args = vec![
            source_file.to_string(),
            "-m".to_string(),
            self.method.clone(),
            "-p".to_string(),
            self.particles.to_string(),
        ];
        if let Some(subsamples) = self.subsamples {
            args.extend(["--subsample".to_string(), "-n".to_string(), subsamples.to_string()]);
        }
        for (name, value) in &self.flags {
            if matches!(value, FlagValue::Switch(false)) {
                continue;
            }
            args.push(format!("--{}", name.replace('_', "-")));
            if !matches!(value, FlagValue::Switch(true)) {
                args.push(value.to_string());
            }
        }
        args
    }
}

/// Value of an extra compiler flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    /// Presence switch.
    Switch(bool),
    /// Integer option.
    Int(i64),
    /// Real option.
    Real(f64),
    /// Free-form option.
    Text(String),
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Switch(flag) => write!(f, "{flag}"),
            FlagValue::Int(int) => write!(f, "{int}"),
            FlagValue::Real(real) => write!(f, "{real}"),
            FlagValue::Text(text) => f.write_str(text),
        }
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed; each call draws from a derived substream.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label recorded alongside results.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    0x7EE9_9151_5EED_0001_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

/// Handling of runtime output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Bytes of raw output kept in malformed-output diagnostics.
    #[serde(default = "default_preview_bytes")]
    pub preview_bytes: usize,
}

fn default_preview_bytes() -> usize {
    DEFAULT_PREVIEW_BYTES
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            preview_bytes: default_preview_bytes(),
        }
    }
}
