use std::path::PathBuf;

use thiserror::Error;

/// A malformed sweep configuration. Always raised before any layout is built.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("at least one sweep axis is required")]
    NoAxes,

    #[error("axis `{0}` has no values")]
    EmptyAxis(String),

    #[error("axis `{axis}` has non-finite value {value}")]
    NonFinite { axis: String, value: f64 },

    #[error("axis `{0}` must specify exactly one of `values` or `linspace`")]
    AmbiguousValues(String),

    #[error("axis `{0}` is declared more than once")]
    DuplicateAxis(String),

    #[error("name `{0}` may not be empty or contain a path separator")]
    InvalidName(String),

    #[error("axis `{axis}` is not a sweepable parameter (expected one of: {expected})")]
    UnknownParameter { axis: String, expected: String },

    #[error("values {first} and {second} of axis `{axis}` both format as `{formatted}`")]
    ValueCollision {
        axis: String,
        first: f64,
        second: f64,
        formatted: String,
    },
}

/// Failure to produce or serialize the layout for one design point.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("coordinate {value} um does not fit the GDS database grid")]
    CoordinateOutOfRange { value: f64 },

    #[error("failed to export GDS to {path:?}: {message}")]
    Gds { path: PathBuf, message: String },

    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build design `{design}`: {source}")]
    Build {
        design: String,
        #[source]
        source: BuildError,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
