use std::path::PathBuf;
use thiserror::Error;

use crate::dynamics::RunState;

pub type Result<T> = std::result::Result<T, Error>;

/// Problems reading structure, coordinate or parameter files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unable to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{path}': {details} (at line {line})")]
    Parse {
        path: PathBuf,
        line: usize,
        details: String,
    },

    #[error("chemfiles could not read '{path}': {message}")]
    Chemfiles { path: PathBuf, message: String },

    #[error("malformed keyword control file: {0}")]
    TinkerKeyFile(String),

    #[error("malformed dyn file: {0}")]
    TinkerDynFile(String),

    #[error("no parameter files were given")]
    NoParameterFiles,
}

impl LoadError {
    pub fn parse(path: impl Into<PathBuf>, line: usize, details: impl Into<String>) -> Self {
        LoadError::Parse {
            path: path.into(),
            line,
            details: details.into(),
        }
    }
}

/// Failure reported by a physics engine. `Configuration` means the engine
/// rejected the inputs it was given, `Runtime` means it failed while working.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Runtime(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("configuration mismatch: {0}")]
    ConfigurationMismatch(String),

    #[error("cannot derive a bounding box from an empty coordinate set")]
    DegenerateInput,

    #[error("engine failure: {0}")]
    EngineRuntime(String),

    #[error("'{operation}' is not allowed in state {state:?}")]
    ContractViolation {
        operation: &'static str,
        state: RunState,
    },

    #[error("reporter '{destination}' failed: {message}")]
    Reporter {
        destination: String,
        message: String,
    },

    #[error("invalid configuration file: {0}")]
    Config(String),
}

impl Error {
    pub fn reporter(destination: impl Into<String>, message: impl ToString) -> Self {
        Error::Reporter {
            destination: destination.into(),
            message: message.to_string(),
        }
    }
}

impl From<EngineError> for Error {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Configuration(message) => Error::ConfigurationMismatch(message),
            EngineError::Runtime(message) => Error::EngineRuntime(message),
        }
    }
}
