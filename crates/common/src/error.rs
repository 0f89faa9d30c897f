use thiserror::Error;

/// Canonical Kestrel error taxonomy used across crates.
///
/// Classification guidance:
/// - [`KestrelError::Planning`]: plan shape/name/type issues discovered before execution
/// - [`KestrelError::Execution`]: runtime admission, conversion or data-shape failures
/// - [`KestrelError::InvalidConfig`]: config/environment contract violations
/// - [`KestrelError::Unsupported`]: valid request for a type or shape not implemented
/// - [`KestrelError::Cancelled`]: the op-chain was abandoned by its scheduler
/// - [`KestrelError::Io`]: raw IO failures from std APIs
///
/// Programmer errors (zero capacity, row/schema width mismatch) are not part of
/// this taxonomy; they panic at the call site.
#[derive(Debug, Error)]
pub enum KestrelError {
    /// Invalid or inconsistent configuration.
    ///
    /// Examples:
    /// - zero `default_holder_capacity` or `worker_slots`
    /// - unparsable `KESTREL_*` environment override
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Plan-to-operator lowering failures.
    ///
    /// Examples:
    /// - unknown column referenced by a distinct expression
    /// - collation key index outside the input schema
    #[error("planning error: {0}")]
    Planning(String),

    /// Runtime execution failures after planning succeeded.
    ///
    /// Examples:
    /// - column type differs from the executor's value type
    /// - arrow array/record batch construction failures
    #[error("execution error: {0}")]
    Execution(String),

    /// Transparent std IO failures.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Valid request for a feature/shape not implemented in current version.
    ///
    /// Examples:
    /// - distinct over a column type without a value implementation
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The op-chain was cancelled before it produced its final block.
    #[error("cancelled: {0}")]
    Cancelled(String),
}

/// Standard Kestrel result alias.
pub type Result<T> = std::result::Result<T, KestrelError>;
