//! Error type for the fallible edges of the engine (I/O, parsing, export)

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DepvizError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid layout config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("invalid graph JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown export format: {0}")]
    UnknownFormat(String),
}

pub type Result<T> = std::result::Result<T, DepvizError>;
