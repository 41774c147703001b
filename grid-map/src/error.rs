//! Error types for named map operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("gRPC status error: {0}")]
    Status(#[from] tonic::Status),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("invalid server address {0:?}")]
    InvalidAddress(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("session closed")]
    SessionClosed,
}
