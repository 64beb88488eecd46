//! Run configuration for the sampler.
//!
//! Settings are layered, highest priority first:
//! 1. CLI arguments / environment variables ([`SamplerArgs`], flattened into
//!    the driver's own parser)
//! 2. Config file (`~/.config/gibbs/config.toml` or `--config-file`)
//! 3. Defaults
//!
//! # Example
//!
//! ```
//! use gibbs_core::config::SamplerConfig;
//!
//! let config = SamplerConfig::new(4)
//!     .with_node_id(1)
//!     .with_sample_evidence(true)
//!     .with_seed(7);
//! assert!(config.validate().is_ok());
//! ```
//!
//! ```toml
//! n_threads = 8
//! node_id = 0
//! sample_evidence = false
//! learn_non_evidence = true
//! seed = 1234
//! ```

use crate::error::CoreError;
use anyhow::{Context, Result};
use clap::Args;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI arguments for the sampler configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct SamplerArgs {
    /// Number of worker threads (one shard each)
    #[arg(long, env = "GIBBS_THREADS")]
    pub n_threads: Option<usize>,

    /// Opaque node label, used in thread names and logs
    #[arg(long, env = "GIBBS_NODE_ID")]
    pub node_id: Option<usize>,

    /// Resample evidence variables during inference
    #[arg(long, env = "GIBBS_SAMPLE_EVIDENCE")]
    pub sample_evidence: Option<bool>,

    /// Learn from non-evidence variables too
    #[arg(long, env = "GIBBS_LEARN_NON_EVIDENCE")]
    pub learn_non_evidence: Option<bool>,

    /// Base seed for the per-worker RNG streams
    #[arg(long, env = "GIBBS_SEED")]
    pub seed: Option<u64>,

    /// Path to config file
    #[arg(long, env = "GIBBS_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
}

/// Sampler configuration as stored in a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerConfigFile {
    pub n_threads: Option<usize>,
    pub node_id: Option<usize>,
    pub sample_evidence: Option<bool>,
    pub learn_non_evidence: Option<bool>,
    pub seed: Option<u64>,
}

/// Resolved sampler configuration; read once when a sampler is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub n_threads: usize,
    pub node_id: usize,
    /// Resample evidence variables during inference sweeps.
    pub sample_evidence: bool,
    /// Run the SGD step for non-evidence variables as well.
    pub learn_non_evidence: bool,
    /// `None` draws a fresh seed per sampler.
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            n_threads: std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1),
            node_id: 0,
            sample_evidence: false,
            learn_non_evidence: false,
            seed: None,
        }
    }
}

impl SamplerConfig {
    pub fn new(n_threads: usize) -> Self {
        SamplerConfig {
            n_threads,
            ..Default::default()
        }
    }

    pub fn with_node_id(mut self, node_id: usize) -> Self {
        self.node_id = node_id;
        self
    }

    pub fn with_sample_evidence(mut self, sample_evidence: bool) -> Self {
        self.sample_evidence = sample_evidence;
        self
    }

    pub fn with_learn_non_evidence(mut self, learn_non_evidence: bool) -> Self {
        self.learn_non_evidence = learn_non_evidence;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.n_threads == 0 {
            return Err(CoreError::ZeroThreads);
        }
        Ok(())
    }

    /// Resolve CLI/env arguments over the config file over defaults.
    ///
    /// An explicitly named config file must exist; the default location is
    /// only read when present.
    pub fn from_args(args: SamplerArgs) -> Result<Self> {
        let file = match &args.config_file {
            Some(path) => Self::load_config_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::load_config_file(&path)?,
                _ => SamplerConfigFile::default(),
            },
        };

        let config = Self::from_layers(&args, file);
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config and fill the gaps with defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: SamplerConfigFile =
            toml::from_str(contents).context("Failed to parse sampler config")?;
        let config = Self::from_layers(&SamplerArgs::default(), file);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// `config.toml` in the platform config directory, if one exists.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "gibbs").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = SamplerConfigFile {
            n_threads: Some(self.n_threads),
            node_id: Some(self.node_id),
            sample_evidence: Some(self.sample_evidence),
            learn_non_evidence: Some(self.learn_non_evidence),
            seed: self.seed,
        };
        let contents = toml::to_string_pretty(&file).context("Failed to serialize config")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
    }

    fn load_config_file(path: &Path) -> Result<SamplerConfigFile> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    fn from_layers(args: &SamplerArgs, file: SamplerConfigFile) -> Self {
        let defaults = SamplerConfig::default();
        SamplerConfig {
            n_threads: args
                .n_threads
                .or(file.n_threads)
                .unwrap_or(defaults.n_threads),
            node_id: args.node_id.or(file.node_id).unwrap_or(defaults.node_id),
            sample_evidence: args
                .sample_evidence
                .or(file.sample_evidence)
                .unwrap_or(defaults.sample_evidence),
            learn_non_evidence: args
                .learn_non_evidence
                .or(file.learn_non_evidence)
                .unwrap_or(defaults.learn_non_evidence),
            seed: args.seed.or(file.seed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Cli {
        #[command(flatten)]
        sampler: SamplerArgs,
    }

    #[test]
    fn test_toml_layer_over_defaults() {
        let config =
            SamplerConfig::from_toml_str("n_threads = 3\nsample_evidence = true\n").unwrap();
        assert_eq!(config.n_threads, 3);
        assert!(config.sample_evidence);
        assert!(!config.learn_non_evidence);
        assert_eq!(config.node_id, 0);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(SamplerConfig::from_toml_str("n_thread = 3\n").is_err());
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(SamplerConfig::from_toml_str("n_threads = 0\n").is_err());
        assert_eq!(SamplerConfig::new(0).validate(), Err(CoreError::ZeroThreads));
    }

    #[test]
    fn test_args_override_file() {
        let dir = std::env::temp_dir().join(format!("gibbs-config-{}", std::process::id()));
        let path = dir.join("config.toml");
        SamplerConfig::new(2)
            .with_node_id(5)
            .with_seed(11)
            .save_to_file(&path)
            .unwrap();

        let cli = Cli::parse_from([
            "gibbs",
            "--n-threads",
            "6",
            "--learn-non-evidence",
            "true",
            "--config-file",
            path.to_str().unwrap(),
        ]);
        let config = SamplerConfig::from_args(cli.sampler).unwrap();

        assert_eq!(config.n_threads, 6);
        assert_eq!(config.node_id, 5);
        assert_eq!(config.seed, Some(11));
        assert!(config.learn_non_evidence);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let args = SamplerArgs {
            config_file: Some(PathBuf::from("/nonexistent/gibbs/config.toml")),
            ..Default::default()
        };
        assert!(SamplerConfig::from_args(args).is_err());
    }
}
