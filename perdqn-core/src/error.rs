//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PerDqnError {
    /// A negative or non-finite priority was given to the priority index.
    #[error("Invalid priority: {0}")]
    InvalidPriority(f32),

    /// Access to a slot that is out of range or has never been written.
    #[error("Invalid slot {ix}: {len} slots are valid")]
    InvalidSlot {
        /// Requested slot.
        ix: usize,

        /// Number of valid slots at the time of the access.
        len: usize,
    },

    /// A batch was requested before the buffer holds enough transitions.
    #[error("Insufficient data: requested {requested} transitions, {available} available")]
    InsufficientData {
        /// Requested batch size.
        requested: usize,

        /// Number of transitions in the buffer.
        available: usize,
    },

    /// NaN or infinity surfaced from a TD-error computation.
    #[error("Numeric instability: {0}")]
    NumericInstability(String),

    /// A configuration parameter is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}
