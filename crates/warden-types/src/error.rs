//! Error types for the `warden-types` crate.

use crate::flag::FlagKind;

/// Errors raised while defining, registering or parsing flags.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlagError {
    /// No flag with this name is registered.
    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    /// A flag with this name is already registered.
    #[error("flag already registered: {0}")]
    DuplicateFlag(String),

    /// A value does not fit the flag's value domain.
    #[error("flag {flag} expects a {expected} value, got {found:?}")]
    TypeMismatch {
        /// The flag being set.
        flag: String,
        /// The flag's kind.
        expected: FlagKind,
        /// The rejected input, rendered as text.
        found: String,
    },

    /// A companion group flag was given an unknown group name.
    #[error("invalid region group {value:?} for flag {flag}")]
    InvalidGroup {
        /// The flag whose group was being set.
        flag: String,
        /// The rejected input, rendered as text.
        value: String,
    },
}
