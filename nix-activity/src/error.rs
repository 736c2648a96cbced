//! Error type shared by loggers, activities and the wire-protocol decoder.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A `fields` entry that is neither an unsigned integer nor a string.
    ///
    /// This points at a protocol version mismatch, so the decoder reports it
    /// to its caller instead of downgrading it to a warning.
    #[error("unsupported JSON type {0}")]
    UnsupportedField(&'static str),

    #[error("invalid verbosity level: {0}")]
    InvalidVerbosity(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
