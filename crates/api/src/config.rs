//! Service configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `STUDENT_RISK__SECTION__KEY` environment variables.

use ::config::{Config, ConfigError, Environment, File};
use data_prep::{OutlierFilter, DEFAULT_Z_THRESHOLD};
use feature_engine::FitterConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storage::LoaderOptions;
use tracing::info;

/// Config file read when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config/student-risk.toml";
pub const ENV_PREFIX: &str = "STUDENT_RISK";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub model: ModelConfig,
    pub database: DatabaseConfig,
    pub loader: LoaderConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Dataset location and fitting recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dataset_path: PathBuf,
    pub outlier_threshold: f64,
    pub excluded_label: String,
    pub test_fraction: f64,
    pub split_seed: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        let fitter = FitterConfig::default();
        Self {
            dataset_path: PathBuf::from("dataset/data.csv"),
            outlier_threshold: DEFAULT_Z_THRESHOLD,
            excluded_label: fitter.excluded_label,
            test_fraction: fitter.test_fraction,
            split_seed: fitter.split_seed,
        }
    }
}

impl DataConfig {
    pub fn outlier_filter(&self) -> OutlierFilter {
        OutlierFilter::new(self.outlier_threshold)
    }

    pub fn fitter_config(&self) -> FitterConfig {
        FitterConfig {
            excluded_label: self.excluded_label.clone(),
            test_fraction: self.test_fraction,
            split_seed: self.split_seed,
            ..FitterConfig::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// `.json` state dict or `.onnx` graph
    pub weights_path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights_path: PathBuf::from("student_model.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://students.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub max_students: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { max_students: 20 }
    }
}

impl LoaderConfig {
    pub fn options(&self, label: &str, force: bool) -> LoaderOptions {
        LoaderOptions {
            max_students: self.max_students,
            label: label.to_string(),
            force,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Load configuration. An explicit `path` must exist; the default path is
/// optional.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let (file, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };

    let settings = Config::builder()
        .add_source(Config::try_from(&ServiceConfig::default())?)
        .add_source(File::from(file.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: ServiceConfig = settings.try_deserialize()?;
    info!("Configuration loaded (file {}, required={})", file.display(), required);
    Ok(config)
}
