//! Error types shared by the daemon and its device backends.
//!
//! Nothing in the dispatch core surfaces these to the user: the dispatcher
//! logs and drops them. They exist so backends can report *why* a side
//! effect did not happen.

use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("write to {path} failed: {source}")]
    Sysfs {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Shell command exited non-zero or could not be spawned.
    #[error("command `{command}` failed: {message}")]
    Command { command: String, message: String },

    /// A collaborator is missing on this device (no node, no service).
    #[error("{0} unavailable")]
    Unavailable(&'static str),

    #[error("input device error: {0}")]
    Device(String),
}

pub type Result<T> = std::result::Result<T, Error>;
