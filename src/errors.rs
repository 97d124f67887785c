//! Error types for the quadrepo crate.
//!
//! This module defines a unified error enumeration used across object
//! parsing, repository access, N-Quads handling, hydration and commit
//! synthesis. It integrates with `thiserror` to provide rich `Display`
//! implementations and error source chaining where applicable.
//!
//! Notes:
//! - Each variant carries contextual details via its message payload.
//! - An empty delta or an empty staging area is *not* an error; the
//!   affected operations return `Ok(None)` instead.

use thiserror::Error;

#[derive(Error, Debug)]
/// Unified error enumeration for the quadrepo library.
///
/// - Used across object parsing, blob views, caches, hydration and
///   commit synthesis.
/// - Implements `std::error::Error` via `thiserror`.
pub enum StoreError {
    /// Invalid or unsupported object type name.
    #[error("The `{0}` is not a valid object type.")]
    InvalidObjectType(String),

    /// Malformed tree object.
    #[error("Not a valid tree object: {0}")]
    InvalidTreeObject(String),

    /// Commit parse or validation failed.
    #[error("Invalid commit: {0}")]
    InvalidCommitObject(String),

    /// Invalid author or committer signature line.
    #[error("The `{0}` is not a valid commit signature.")]
    InvalidSignature(String),

    /// Invalid object id formatting or value.
    #[error("The `{0}` is not a valid hash value.")]
    InvalidHashValue(String),

    /// N-Quads parse failure on a tree entry. Fatal for the commit being
    /// hydrated; later commits would diff against the wrong state.
    #[error("Malformed N-Quads blob `{path}`: {reason}")]
    MalformedBlob { path: String, reason: String },

    /// A graph IRI from the configuration could not be parsed.
    #[error("The `{0}` is not a valid graph IRI.")]
    InvalidGraphIri(String),

    /// Object missing from the object database.
    #[error("Can't find specific object: {0}")]
    ObjectNotFound(String),

    /// Reference or revision could not be resolved.
    #[error("Can't resolve revision: {0}")]
    RevisionNotFound(String),

    /// Repository not found.
    #[error("Repository not found")]
    RepoNotFound,

    /// Programmer error; the operation is aborted.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// I/O error from the workdir or an underlying reader.
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),

    /// Quad storage failure in the in-memory dataset.
    #[error("Storage error: {0}")]
    Storage(#[from] oxigraph::store::StorageError),

    /// SPARQL parse or evaluation failure.
    #[error("SPARQL error: {0}")]
    Sparql(#[from] oxigraph::sparql::EvaluationError),
}
