//! Error types for the pet-post API client.
//!
//! # Design
//! Every failure of an operation, whether it happened before the request was
//! sent, on the wire, or while decoding the body, comes back through the one
//! `ApiError` enum. `NotFound` keeps its own variant because callers often
//! distinguish "the resource does not exist" from "the server returned an
//! unexpected status". `ErrorKind` is the coarse view a presentation layer
//! needs to pick a notice.

use thiserror::Error;

use crate::route::Operation;

/// Errors returned by `PetClient` and `PetApi`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The operation needs a bearer token and the session has none. The
    /// request was never sent.
    #[error("{operation} requires authentication but no token is stored")]
    Unauthenticated { operation: Operation },

    /// The request could not be delivered or no response was received.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be decoded into the expected shape.
    #[error("decoding failed: {0}")]
    Decode(String),

    /// The request payload could not be encoded to JSON.
    #[error("encoding failed: {0}")]
    Encode(String),

    /// A delete was acknowledged but removed nothing.
    #[error("nothing was deleted")]
    NothingDeleted,

    /// The base address cannot carry path segments.
    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    /// An input was rejected before any request was built.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Coarse classification of an `ApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    Transport,
    Status,
    Decode,
    Request,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            ApiError::Transport(_) => ErrorKind::Transport,
            ApiError::NotFound | ApiError::Http { .. } | ApiError::NothingDeleted => {
                ErrorKind::Status
            }
            ApiError::Decode(_) => ErrorKind::Decode,
            ApiError::Encode(_) | ApiError::InvalidUrl(_) | ApiError::InvalidArgument(_) => {
                ErrorKind::Request
            }
        }
    }

    pub(crate) fn decode(err: impl std::fmt::Display) -> Self {
        ApiError::Decode(err.to_string())
    }

    pub(crate) fn encode(err: impl std::fmt::Display) -> Self {
        ApiError::Encode(err.to_string())
    }
}

/// Errors raised while building a `ClientConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url {url:?}: {source}")]
    Parse {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base url {0:?} cannot carry path segments")]
    NotABase(String),
}

/// Errors raised by a `TokenStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("token store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("token store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("token store lock poisoned")]
    Poisoned,
}
