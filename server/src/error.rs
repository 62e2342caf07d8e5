//! Error types for the game server.
//!
//! Protocol errors (`NameError`, `MoveError`) are reported to the offending
//! connection only. `SendError` marks a peer whose outbound queue has gone
//! away; the game drops that peer as if it had disconnected. `ServerError`
//! covers the transport setup failures that end the process.

use crate::player::ClientId;
use std::io;
use thiserror::Error;

/// Why a requested name was refused. Every variant closes the connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("name is empty")]
    Empty,
    #[error("name is longer than {max} bytes")]
    TooLong { max: usize },
    #[error("name is not valid UTF-8")]
    InvalidUtf8,
    #[error("name `{0}` is already taken")]
    Taken(String),
}

/// Why a requested move was refused. The connection stays open.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("`{0}` is not a pit number")]
    NotANumber(String),
    #[error("pit {pit} is outside 0..{pits}")]
    OutOfRange { pit: i64, pits: usize },
    #[error("pit {0} is empty")]
    EmptyPit(usize),
}

/// Violations of the registry and turn invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("client {0} is not connected")]
    UnknownClient(ClientId),
    #[error("no registered player in the ring")]
    RingEmpty,
    #[error("no player holds the turn")]
    NoTurnHolder,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("connection {0} is closed")]
pub struct SendError(pub ClientId);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}
