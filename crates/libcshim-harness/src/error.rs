use std::path::PathBuf;

use libcshim_core::{StartupError, VersionParseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("i/o error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Version(#[from] VersionParseError),
    #[error("{count} structured log violation(s) in '{}'", path.display())]
    InvalidLog { path: PathBuf, count: usize },
    #[error("unsupported link flavor '{0}', expected cc|ld")]
    UnknownFlavor(String),
}

impl HarnessError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
