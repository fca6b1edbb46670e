//! Error types for tree rendering.

use thiserror::Error;

use crate::key::Key;

/// Broad classification of a [`TreeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The tree or one of its collaborators is wired up incorrectly.
    Configuration,
    /// More than one node definition could act as the fallback.
    Ambiguity,
    /// An item could not be matched to any node definition.
    Match,
    /// Two items in one emission resolved to the same key.
    DuplicateKey,
}

/// Errors raised while configuring or rendering a tree.
///
/// All of these are configuration-time failures. They are returned
/// synchronously from the call that detected them, or recorded as the
/// tree's fault when they surface inside an asynchronous emission.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TreeError {
    /// The builder was never given a tree control.
    #[error("a tree control is required to render a tree")]
    MissingControl,

    /// A row needs a capability the tree control does not provide.
    #[error("rows of '{template}' require the tree control to provide {capability}")]
    MissingCapability {
        /// Template name of the definition whose rows need the capability.
        template: String,
        /// Human readable name of the missing capability.
        capability: &'static str,
    },

    /// An indent string had no numeric prefix.
    #[error("invalid indent '{0}'")]
    InvalidIndent(String),

    /// More than one node definition omits its `when` predicate.
    #[error("{count} node definitions have no `when` predicate, at most one is allowed")]
    MultipleDefaults {
        /// Number of definitions without a predicate.
        count: usize,
    },

    /// No node definition matched and there is no default definition.
    #[error("no node definition matches the item at index {index}")]
    NoMatchingDef {
        /// Index of the item in its emission.
        index: usize,
    },

    /// Two items in one emission share a track-by key.
    #[error("duplicate track-by key {key} at indexes {first} and {second}")]
    DuplicateKey {
        /// The colliding key.
        key: Key,
        /// Index of the first item with this key.
        first: usize,
        /// Index of the second item with this key.
        second: usize,
    },
}

impl TreeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingControl | Self::MissingCapability { .. } | Self::InvalidIndent(_) => {
                ErrorKind::Configuration
            }
            Self::MultipleDefaults { .. } => ErrorKind::Ambiguity,
            Self::NoMatchingDef { .. } => ErrorKind::Match,
            Self::DuplicateKey { .. } => ErrorKind::DuplicateKey,
        }
    }
}

/// Failure emitted by an asynchronous source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct StreamError {
    /// Error message
    pub message: String,
}

impl StreamError {
    /// Create a new stream error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for StreamError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for StreamError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}
