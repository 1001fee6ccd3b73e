//! Error types for the workmirror pipeline.
//!
//! Errors below the source adapter boundary are either retried (transport) or
//! escalated (enumeration, fetch). Errors at or above it are scoped to a single
//! sync cycle and isolated by the scheduler.

use std::fmt;
use thiserror::Error;

use crate::types::ExternalId;

/// The unified error type for workmirror operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A remote call failed after the retry budget was spent, or failed terminally.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Identifier enumeration aborted; the whole query is abandoned.
    #[error("enumeration aborted after {pages} page(s): {source}")]
    Enumeration {
        /// Pages successfully read before the failure.
        pages: usize,
        #[source]
        source: Box<Error>,
    },

    /// A bulk fetch chunk failed; no partial record set is returned.
    #[error("fetch aborted on chunk {chunk} of {chunks}: {source}")]
    Fetch {
        /// 1-indexed chunk that failed.
        chunk: usize,
        /// Total number of chunks in the fetch.
        chunks: usize,
        #[source]
        source: Box<Error>,
    },

    /// A record could not be projected into the mirror shape.
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// The local store rejected a read or write.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The remote answered with something the pipeline cannot interpret.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Input validation errors (bad collection name, URL, identifier).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Wrap an error raised while reading identifier pages.
    pub fn enumeration(pages: usize, source: Error) -> Self {
        Error::Enumeration {
            pages,
            source: Box::new(source),
        }
    }

    /// Wrap an error raised while fetching a chunk of records.
    pub fn fetch(chunk: usize, chunks: usize, source: Error) -> Self {
        Error::Fetch {
            chunk,
            chunks,
            source: Box::new(source),
        }
    }
}

/// Class of a network-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// Connection refused or reset.
    Connect,
    /// The request did not complete in time.
    Timeout,
    /// Name resolution, TLS or any other request failure.
    Other,
    /// The request could not be built, e.g. a malformed URL or header.
    Request,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NetworkErrorKind::Connect => "connection failed",
            NetworkErrorKind::Timeout => "timed out",
            NetworkErrorKind::Other => "request failed",
            NetworkErrorKind::Request => "invalid request",
        };
        f.write_str(s)
    }
}

/// Status codes the remote uses for transient conditions.
pub const TRANSIENT_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Transport-level errors, carrying the last observed failure.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The remote answered with a non-success status.
    #[error("HTTP {status} after {attempts} attempt(s){}", fmt_message(.message))]
    Status {
        status: u16,
        message: Option<String>,
        attempts: u32,
    },

    /// The request never produced a response.
    #[error("{kind} after {attempts} attempt(s): {message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
        attempts: u32,
    },
}

fn fmt_message(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

impl TransportError {
    /// Whether a fresh attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Status { status, .. } => TRANSIENT_STATUSES.contains(status),
            TransportError::Network { kind, .. } => *kind != NetworkErrorKind::Request,
        }
    }

    /// Number of attempts made before this error surfaced.
    pub fn attempts(&self) -> u32 {
        match self {
            TransportError::Status { attempts, .. } | TransportError::Network { attempts, .. } => {
                *attempts
            }
        }
    }

    /// HTTP status, when the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Network { .. } => None,
        }
    }
}

/// A record is missing a field the mirror requires.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The field is absent or null.
    #[error("record {id}: missing field '{field}'")]
    MissingField { id: ExternalId, field: String },

    /// The field is present but not a string.
    #[error("record {id}: field '{field}' is not a string")]
    NotAString { id: ExternalId, field: String },
}

/// Local store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem or connection failure.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// A stored document could not be encoded or decoded.
    #[error("corrupt document {collection}/{id}: {message}")]
    Corrupt {
        collection: String,
        id: String,
        message: String,
    },
}

/// The remote answered, but not with what the protocol promises.
#[derive(Debug)]
pub struct ProtocolError {
    /// What was being read when the problem surfaced.
    pub context: &'static str,
    /// Description of the problem.
    pub message: String,
}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(context: &'static str, message: impl Into<String>) -> Self {
        Self {
            context,
            message: message.into(),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.message)
    }
}

impl std::error::Error for ProtocolError {}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API base '{value}': {reason}")]
    ApiBase { value: String, reason: String },

    /// Invalid local collection name.
    #[error("invalid collection '{value}': {reason}")]
    Collection { value: String, reason: String },

    /// Invalid external identifier.
    #[error("invalid external id '{value}': {reason}")]
    ExternalId { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
