//! Crate error types.

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// A failure of an outbound RPC.
///
/// The maintenance procedures treat every variant the same way (the peer is
/// unreachable and a recovery path runs); the categorization feeds the logs
/// and callers of the raw client.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },

    #[error("request timed out")]
    Timeout,

    #[error("connection closed before a reply arrived")]
    ConnectionClosed,

    #[error("transport failure: {0}")]
    Io(#[from] io::Error),

    #[error("unexpected reply variant: {0}")]
    UnexpectedReply(&'static str),
}
