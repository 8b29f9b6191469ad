//! Errors surfaced by the scanner, the navigator, and the session facade.

/// Everything that can go wrong while parsing or navigating a [`crate::Document`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The scanner encountered invalid JSON: a bad token, an unterminated
    /// string, a malformed escape, and so on.
    #[error("syntax error at byte {offset}: {message}")]
    Syntax {
        /// Byte offset into the input buffer where the error was detected.
        offset: usize,
        /// Human-readable description of what went wrong.
        message: String,
    },

    /// [`crate::Document::move_to`] could not resolve a path.
    #[error("invalid path {path:?}: step {step_index} could not be resolved")]
    InvalidPath {
        /// The path that failed to resolve.
        path: String,
        /// Index (0-based, among `/`-separated steps) of the step that failed.
        step_index: usize,
    },

    /// Internal: a node kind was not one of the kinds expected at a given
    /// point during materialization. Reaching this variant is a bug in this
    /// crate rather than a malformed document.
    #[error("unexpected node kind during materialization: {0}")]
    Type(String),

    /// Navigation would have pushed the cursor stack past the configured bound.
    #[error("cursor stack overflow: paths deeper than {limit} steps are rejected")]
    StackOverflow {
        /// The configured stack bound.
        limit: usize,
    },

    /// [`crate::Document::open_file`] could not read the given file.
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// A caller-supplied argument was missing or of the wrong shape, e.g. an
    /// empty step between two slashes in a path.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// An operation was attempted on a [`crate::Document`] obtained through
    /// [`crate::Document::parse`] after [`crate::Document::close`] was called.
    #[error("document is closed")]
    Closed,
}

/// Convenience alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, Error>;
