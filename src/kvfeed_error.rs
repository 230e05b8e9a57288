use std::{io, path::PathBuf};

use rustyline::error::ReadlineError;
use thiserror::Error;

use crate::connection::ConnectionTarget;

pub type Result<T> = std::result::Result<T, KvfeedError>;

#[derive(Error, Debug)]
pub enum KvfeedError {
    #[error("{0}")]
    Usage(String),
    #[error("Connection error: {source}")]
    Connect {
        target: ConnectionTarget,
        source: redis::RedisError,
    },
    #[error("File open failed: {}: {source}", .path.display())]
    FileOpen { path: PathBuf, source: io::Error },
    #[error("File read failed: {0}")]
    FileRead(io::Error),
    #[error("Terminal error: {0}")]
    Terminal(#[from] ReadlineError),
    /// No reply could be obtained for a command.
    #[error("Command failed: {0}")]
    RoundTrip(String),
    /// The store answered with an error reply.
    #[error("Store error: {0}")]
    ErrorReply(String),
    #[error("Failed to read/write: {0}")]
    Io(#[from] io::Error),
}
