//! Error types for the arbor library.
//!
//! Coercion misses are not errors: they surface as `None` and callers fall
//! back to their defaults. Everything here is either a structural violation
//! of the node tree, a failure of a backing source, or a programming error.

use thiserror::Error;

/// Result type alias for operations that may fail with an arbor error.
///
/// # Examples
///
/// ```
/// use arbor::{Error, Result};
///
/// fn first_segment(path: &[&str]) -> Result<String> {
///     path.first().map(|s| (*s).to_string()).ok_or(Error::EmptyPath)
/// }
///
/// assert!(first_segment(&[]).is_err());
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the arbor library.
#[derive(Debug, Error)]
pub enum Error {
    /// The tree was asked to do something its shape does not allow, such as
    /// adding a named child to a sequence or navigating into a scalar.
    #[error("structural violation at '{path}': {reason}")]
    Structural {
        /// The offending path, joined with the configuration's separator.
        path: String,
        /// What was attempted.
        reason: String,
    },

    /// A path-taking operation received no path segments.
    #[error("path must not be empty")]
    EmptyPath,

    /// An empty path separator was configured.
    #[error("path separator must not be empty")]
    InvalidSeparator,

    /// Assigning the parent would have made a node its own ancestor.
    #[error("circular parent between child '{child}' and parent '{parent}'")]
    CircularParent {
        /// Path of the node being attached.
        child: String,
        /// Path of the would-be parent.
        parent: String,
    },

    /// A node handle outlived the tree it was issued for.
    #[error("node handle is stale (the configuration was reloaded)")]
    StaleNode,

    /// A configuration holder was used before a configuration was bound.
    #[error("configuration holder at '{path}' is not bound to a configuration")]
    NotBound {
        /// The holder's path.
        path: String,
    },

    /// A type descriptor could not be built.
    #[error("invalid type '{input}': {reason}")]
    InvalidType {
        /// The rejected type text.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A backing source failed to load or save.
    #[error("source error in {origin}: {reason}")]
    Source {
        /// Where the source reads from or writes to.
        origin: String,
        /// The underlying failure.
        reason: String,
    },

    /// A YAML document could not be parsed or emitted.
    #[error("configuration error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration migration failed.
    #[error("migration failed: {reason}")]
    Migration {
        /// Why the migration failed.
        reason: String,
    },
}

impl Error {
    /// Builds a structural violation for the given path.
    pub(crate) fn structural(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Structural {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Check if error is a structural violation of the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use arbor::Error;
    ///
    /// let err = Error::Structural { path: "a.b".into(), reason: "scalar".into() };
    /// assert!(err.is_structural());
    /// assert!(!Error::EmptyPath.is_structural());
    /// ```
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural { .. })
    }

    /// Check if error indicates a bug in the caller rather than bad data.
    ///
    /// # Examples
    ///
    /// ```
    /// use arbor::Error;
    ///
    /// let err = Error::CircularParent { child: "a".into(), parent: "a.b".into() };
    /// assert!(err.is_programming_error());
    /// ```
    #[must_use]
    pub fn is_programming_error(&self) -> bool {
        matches!(self, Self::CircularParent { .. } | Self::StaleNode)
    }
}
