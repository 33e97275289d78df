//! Error types for loading and aggregating sales data

use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading the source tables. Always fatal at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data sources configured")]
    NoSources,

    #[error("data source not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed csv in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: missing required column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{}: column '{column}' is {required} and cannot be overridden as {requested}", path.display())]
    OverrideConflict {
        path: PathBuf,
        column: String,
        required: String,
        requested: String,
    },

    #[error("{} line {line}: invalid value {value:?} in column '{column}': {reason}", path.display())]
    InvalidValue {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
        reason: String,
    },

    #[error("store {store_id} has inconsistent {attribute}: {first:?} vs {other:?}")]
    InconsistentStore {
        store_id: i64,
        attribute: &'static str,
        first: String,
        other: String,
    },
}

/// Selector dimension a filtered view was asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Store,
    State,
    Family,
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Store => f.write_str("store"),
            Dimension::State => f.write_str("state"),
            Dimension::Family => f.write_str("family"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("no rows for {dimension} {value:?}")]
    NotFound { dimension: Dimension, value: String },

    #[error("{0} requires at least one row")]
    EmptyAggregate(&'static str),

    #[error("unknown sheet {0:?}")]
    UnknownSheet(String),
}

impl Error {
    pub fn not_found(dimension: Dimension, value: impl ToString) -> Self {
        Error::NotFound {
            dimension,
            value: value.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
