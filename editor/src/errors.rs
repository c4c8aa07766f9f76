use bstr::ByteSlice;
use thiserror::Error;

use crate::{ElementId, NodeKind, RevNum};

/// Errors surfaced to the driver of an edit.
///
/// Protocol violations (calls after completion, reentrancy) are not part of
/// this type, they panic.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// The cancellation hook asked for the edit to stop.
    #[error("operation cancelled")]
    Cancelled,

    /// An argument failed validation at the editor boundary.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The node-branch was changed in the repository after the revision the
    /// sender based its change on.
    #[error("{eid} is out of date: changed in r{changed}, change is based on r{since}")]
    OutOfDate {
        eid: ElementId,
        since: RevNum,
        changed: RevNum,
    },

    /// The final tree of the transaction is structurally inconsistent.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal storage error: {0}")]
    StorageError(String),
}

/// Errors related to validation of node names and node content.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidateNodeError {
    #[error("invalid name: {:?}", .0.as_bstr())]
    InvalidName(bytes::Bytes),

    #[error("invalid symlink target: {:?}", .0.as_bstr())]
    InvalidSymlinkTarget(bytes::Bytes),

    #[error("node kind must be dir, file or symlink")]
    UnknownKind,

    #[error("content of unknown kind must carry a reference")]
    MissingReference,

    #[error("{0} content without a reference must carry a body")]
    MissingBody(NodeKind),

    #[error("{kind} content can not carry a {body} body")]
    UnexpectedBody { kind: NodeKind, body: &'static str },

    #[error("expected {expected} content, got {actual}")]
    KindMismatch { expected: NodeKind, actual: NodeKind },
}

impl From<ValidateNodeError> for Error {
    fn from(value: ValidateNodeError) -> Self {
        Error::InvalidArgument(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        if value.kind() == std::io::ErrorKind::InvalidInput {
            Error::InvalidArgument(value.to_string())
        } else {
            Error::StorageError(value.to_string())
        }
    }
}
