use std::path::PathBuf;
use thiserror::Error;

/// Result for everything around the walk (loading, tables, config).
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response has no `{0}` section")]
    MissingSection(String),

    #[error("table construction failed: {0}")]
    Arrow(#[from] arrow2::error::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),
}
