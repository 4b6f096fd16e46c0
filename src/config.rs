use crate::bootstrap_config::BootstrapConfig;
use common::types::config::Config;
use log::info;
use std::fmt;
use std::fmt::Display;
use std::path::{Path, PathBuf};

pub(super) fn load_config(bootstrap_config: &BootstrapConfig) -> Result<Config, ConfigError> {
    let path: &Path = Path::new(&bootstrap_config.config_file);

    let contents = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    let config = parse_config(&contents)
        .map_err(|source| ConfigError::Yaml { path: path.to_path_buf(), source })?;

    info!(target: "main", "Config read successfully from '{}'", path.display());

    Ok(config)
}

// `from_reader` loses the first key after the `version` tag, so the whole file is read first
fn parse_config(contents: &str) -> Result<Config, serde_yml::Error> {
    serde_yml::from_str(contents)
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Yaml { path: PathBuf, source: serde_yml::Error },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => write!(f, "Could not open '{}': {}", path.display(), source),
            ConfigError::Yaml { path, source } => write!(f, "Could not parse '{}': {}", path.display(), source),
        }
    }
}
