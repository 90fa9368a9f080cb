//! Error types.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure surfaced by a resource operation.
///
/// Errors are reported synchronously to the immediate caller; nothing is
/// retried and the resource is left in its prior state.
#[derive(Debug, Error)]
pub enum Error {
    /// The driver failed to create or allocate a GPU object.
    #[error("GPU resource creation failed: {0}")]
    Resource(String),

    /// The operation was invoked on an invalid resource, or its arguments
    /// contradict the resource state.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A transfer range or sub-rectangle exceeds the backing allocation.
    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    /// The host memory layout is not tightly packed.
    #[error("unsupported layout: {0}")]
    UnsupportedLayout(String),

    /// The feature is unavailable on the active backend.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Image file decode or encode failed.
    #[error("image codec: {0}")]
    Codec(#[from] image::ImageError),

    /// File access on behalf of the codec failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
