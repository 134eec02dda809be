use thiserror::Error;

use crate::{face::FaceId, packet::ParseError};

/// All errors surfaced by the relay.
///
/// None of these are fatal to a running relay: they describe why one packet
/// or one configuration call was refused.
#[derive(Error, Debug)]
pub enum Error {
    /// The packet could not be decoded, or decoded into an invalid tuple.
    #[error("malformed packet: {0}")]
    Malformed(#[from] ParseError),

    /// A bounded resource (interface table, queue, name length) is full.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(&'static str),

    /// No interface with a matching address family is configured.
    #[error("no suitable interface")]
    NoInterface,

    #[error("unknown face {0}")]
    UnknownFace(FaceId),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
