//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding or encoding frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error("Failed to encode event: {0}")]
    Encode(serde_json::Error),
}
