//! Error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, value: impl ToString) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Element not found: {0}")]
    MissingElement(String),
    #[error("DOM operation failed: {0}")]
    Dom(String),
    #[error("Failed to load asset {path}: {reason}")]
    AssetLoad { path: String, reason: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
}
