use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for the assembly core and its configuration surface
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Validation error: {field} is invalid: {reason}")]
    Validation { field: String, reason: String },

    #[error("Input/Output error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("Malformed record {record} in {}: {message}", path.display())]
    MalformedRecord {
        path: PathBuf,
        record: usize,
        message: String,
    },

    #[error("K-mer length mismatch: expected {expected}, got {actual}")]
    KmerLength { expected: usize, actual: usize },

    #[error("Symbol {symbol:?} at position {position} is outside the ACGT alphabet")]
    InvalidSymbol { symbol: char, position: usize },
}

impl AssemblyError {
    #[cold]
    pub fn validation<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        AssemblyError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    #[cold]
    pub fn io<P: AsRef<Path>, M: ToString>(path: P, message: M) -> Self {
        AssemblyError::Io {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Locate the first non-alphabet byte of `seq`, if any.
    pub(crate) fn check_symbols(seq: &[u8]) -> Result<(), Self> {
        match seq
            .iter()
            .position(|&b| crate::core::alphabet::encode(b).is_none())
        {
            Some(position) => Err(AssemblyError::InvalidSymbol {
                symbol: seq[position] as char,
                position,
            }),
            None => Ok(()),
        }
    }
}

impl From<config::ConfigError> for AssemblyError {
    fn from(err: config::ConfigError) -> Self {
        AssemblyError::Configuration {
            message: err.to_string(),
        }
    }
}
