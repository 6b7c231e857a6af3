use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{path:?} does not exist")]
    MissingPath { path: PathBuf },

    #[error("{raw} bytes holds fewer than one set of {ways} x {bytes_per_way} bytes")]
    CapacityTooSmall {
        raw: u64,
        ways: u64,
        bytes_per_way: u64,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("{0:?} is not a valid subexperiment suffix")]
    InvalidSuffix(String),

    #[error("unexpected file name {path:?}")]
    UnexpectedFileName { path: PathBuf },

    #[error("malformed table {path:?}: {reason}")]
    MalformedTable { path: PathBuf, reason: String },

    #[error("could not parse {value:?} for column {column:?}")]
    ParseValue {
        column: String,
        value: String,
        source: std::num::ParseFloatError,
    },

    #[error("missing column {0:?}")]
    MissingField(String),

    #[error("command {cmd} failed with {status}: {stderr}")]
    Command {
        cmd: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("could not access {path:?}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Glob(#[from] glob::PatternError),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self::MissingPath { path: path.into() }
    }
}
