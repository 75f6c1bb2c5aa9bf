//! Host configuration read from the environment

use std::path::{Path, PathBuf};

use calligraph_config::{ConfigError, EngineTuning};
use tracing::info;

/// Environment variable naming the export directory
pub const OUT_DIR_VAR: &str = "CALLIGRAPH_OUT_DIR";

/// Environment variable naming a JSON file with engine tuning
pub const TUNING_VAR: &str = "CALLIGRAPH_TUNING";

/// Errors while assembling the host configuration
#[derive(Debug, thiserror::Error)]
pub enum HostConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid tuning in {path}: {source}")]
    Tuning { path: PathBuf, source: ConfigError },
}

/// Host configuration
#[derive(Debug, Clone)]
pub struct CalligraphConfig {
    /// Directory export files are written to
    pub out_dir: PathBuf,
    pub tuning: EngineTuning,
}

impl Default for CalligraphConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            tuning: EngineTuning::default(),
        }
    }
}

impl CalligraphConfig {
    /// Read CALLIGRAPH_OUT_DIR and CALLIGRAPH_TUNING
    pub fn from_env() -> Result<Self, HostConfigError> {
        let out_dir = std::env::var_os(OUT_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let tuning = match std::env::var_os(TUNING_VAR) {
            Some(path) => load_tuning(Path::new(&path))?,
            None => EngineTuning::default(),
        };
        Ok(Self { out_dir, tuning })
    }
}

/// Load and validate a tuning file; missing fields take their defaults
pub fn load_tuning(path: &Path) -> Result<EngineTuning, HostConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| HostConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let tuning = EngineTuning::from_json(&json).map_err(|source| HostConfigError::Tuning {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Loaded engine tuning from {}", path.display());
    Ok(tuning)
}
