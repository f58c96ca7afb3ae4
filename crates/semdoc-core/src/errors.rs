use thiserror::Error;

/// Errors raised by the document model and transaction engine.
///
/// Everything here is thrown synchronously and is expected to be handled at
/// the command/dispatch boundary; the model layer never retries. A failed
/// step leaves the transaction's step list as-is, and the caller should
/// drop the transaction instead of dispatching it.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The selection does not satisfy a command's basic preconditions
    /// (no range at all, wrong shape).
    #[error("misbehaved selection: {0}")]
    MisbehavedSelection(String),

    /// The selection is valid but not positioned where the command
    /// requires it.
    #[error("selection error: {0}")]
    Selection(String),

    /// An internal model invariant was violated, e.g. a position whose
    /// revision does not belong to this transaction.
    #[error("model error: {0}")]
    Model(String),

    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    #[error("illegal execution state: {0}")]
    IllegalExecutionState(String),

    /// A node was expected to be a different variant.
    #[error("type assertion failed: {0}")]
    TypeAssertion(String),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// The export writer encountered a node it cannot serialize.
    #[error("writer error: {0}")]
    Writer(String),
}
