//! Error taxonomy for the document model.
//!
//! Everything here is local and recoverable: the caller gets a `Result` and
//! the tree is guaranteed unchanged on failure.

use blockdoc_delta::DeltaError;
use thiserror::Error;

use crate::Path;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    /// A path references a non-existent node.
    #[error("path out of range: {0}")]
    PathOutOfRange(Path),
    /// A retain/delete ran past the available text; see [`DeltaError`].
    #[error(transparent)]
    Delta(#[from] DeltaError),
    /// A block registry check failed after the transaction completed.
    #[error("validation failed for block '{block_type}': {reason}")]
    ValidationFailed { block_type: String, reason: String },
    /// Table grid coverage or uniqueness broken.
    #[error("table invariant violation: {0}")]
    TableInvariantViolation(String),
}
