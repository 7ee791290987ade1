use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop the dataset from being loaded at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no cached snapshot at {} and no source to fetch it from", path.display())]
    NoSource { path: PathBuf },

    #[error("could not download {url}: HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("could not download {url}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Transport>,
    },

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported snapshot extension: .{0}")]
    UnsupportedExtension(String),

    #[error("snapshot is missing required column '{0}'")]
    MissingColumn(&'static str),
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }
}
