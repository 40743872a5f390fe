// src/error.rs

//! Crate-wide error type for the prefetch pipeline
//!
//! Every failure aborts the whole fetch; nothing is recovered internally
//! except the store cache hit, which is a skip rather than a recovery.
//! Errors carry enough context (command, status, submodule path, nested
//! cause) to reproduce the failing step by hand.

use thiserror::Error;

/// Result type for quarry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching and registering a revision
#[derive(Error, Debug)]
pub enum Error {
    /// Digest string is not valid hex/base-32 for its kind
    #[error("malformed digest: {0}")]
    MalformedDigest(String),

    /// Requested hash kind is not one of md5/sha1/sha256
    #[error("unknown hash kind: {0}")]
    UnknownHashKind(String),

    /// Caller supplied both a commit hash and a ref
    #[error("ambiguous revision: both a commit hash and a ref were given")]
    AmbiguousRevision,

    /// Caller supplied neither a commit hash nor a ref
    #[error("missing revision: neither a commit hash nor a ref was given")]
    MissingRevision,

    /// Ref is absent from the remote's listing
    #[error("ref not found on remote: {0}")]
    UnknownRef(String),

    /// A collaborator process exited with a non-success status
    #[error("command `{command}` exited with status {status}")]
    ExternalCommandFailed { command: String, status: i32 },

    /// Computed digest differs from the caller-supplied expected digest.
    /// Security-relevant; never downgraded to a warning.
    #[error("hash mismatch: expected {expected}, computed {computed}")]
    HashMismatch { expected: String, computed: String },

    /// A nested submodule fetch failed; `path` is relative to the parent
    /// working tree
    #[error("submodule {path}: {source}")]
    SubmoduleFailure {
        path: String,
        #[source]
        source: Box<Error>,
    },

    /// A listed submodule has no matching entry in the declared
    /// submodule configuration. Always surfaced wrapped in
    /// [`Error::SubmoduleFailure`] naming the path.
    #[error("not declared in .gitmodules")]
    UndeclaredSubmodule,

    /// IO error during working-tree manipulation
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a nested fetch error with the failing submodule's path
    pub fn in_submodule(path: impl Into<String>, source: Error) -> Self {
        Self::SubmoduleFailure {
            path: path.into(),
            source: Box::new(source),
        }
    }
}
