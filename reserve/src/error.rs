//! Error types for the content store and the allocator.

use common::StorageError;

use crate::model::RecordId;

/// Error type for content store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Storage-related errors from the underlying backend.
    Storage(String),

    /// Encoding or decoding errors.
    Encoding(String),

    /// Invalid input or parameter errors.
    InvalidInput(String),

    /// Internal errors indicating bugs or invariant violations.
    Internal(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Storage(msg) => write!(f, "Storage error: {}", msg),
            Error::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Storage(msg) => Error::Storage(msg),
            StorageError::Internal(msg) => Error::Internal(msg),
        }
    }
}

/// Result type alias for content store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a target identifier was refused.
///
/// Operators only ever see one generic message; the reason is kept for logs
/// and for callers that want to react to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidTargetReason {
    /// The target was zero.
    NotPositive,
    /// The target does not exceed `current_max + 1`, so there is no gap to
    /// fill.
    NoGap {
        target: RecordId,
        current_max: RecordId,
    },
    /// The allocation guard refused the request.
    GuardRejected,
    /// The sequential strategy would need more placeholders than allowed.
    GapTooLarge { gap: u64, limit: u64 },
}

impl std::fmt::Display for InvalidTargetReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidTargetReason::NotPositive => write!(f, "target id must be positive"),
            InvalidTargetReason::NoGap {
                target,
                current_max,
            } => write!(
                f,
                "target id {} must be greater than {}",
                target,
                current_max.get().saturating_add(1)
            ),
            InvalidTargetReason::GuardRejected => write!(f, "allocation guard refused"),
            InvalidTargetReason::GapTooLarge { gap, limit } => write!(
                f,
                "gap of {} placeholders exceeds the limit of {}",
                gap, limit
            ),
        }
    }
}

/// Error returned by [`GapAllocator::allocate`](crate::GapAllocator::allocate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// The request failed validation; nothing was written.
    InvalidTarget(InvalidTargetReason),
    /// The store failed while inspecting or writing.
    StoreRejected(String),
}

impl AllocationError {
    /// Whether this failure may be escalated beyond the local log.
    pub fn is_escalatable(&self) -> bool {
        matches!(self, AllocationError::StoreRejected(_))
    }
}

impl std::error::Error for AllocationError {}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationError::InvalidTarget(reason) => write!(f, "Invalid target: {}", reason),
            AllocationError::StoreRejected(msg) => write!(f, "Store rejected: {}", msg),
        }
    }
}

impl From<InvalidTargetReason> for AllocationError {
    fn from(reason: InvalidTargetReason) -> Self {
        AllocationError::InvalidTarget(reason)
    }
}

impl From<Error> for AllocationError {
    fn from(err: Error) -> Self {
        AllocationError::StoreRejected(err.to_string())
    }
}

/// Result type alias for allocation attempts.
pub type AllocationResult<T> = std::result::Result<T, AllocationError>;

/// Error loading a [`Config`](crate::Config).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The config file could not be read.
    Io(String),
    /// The config file is not valid TOML for this schema.
    Parse(String),
}

impl std::error::Error for ConfigError {}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}
