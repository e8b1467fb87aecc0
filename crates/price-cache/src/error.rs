use core_types::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed cache file '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl CacheError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::DataUnavailable
    }

    pub fn path(&self) -> &PathBuf {
        match self {
            CacheError::Io { path, .. } | CacheError::Csv { path, .. } => path,
        }
    }
}
