//! Transport layer errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] std::io::Error),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    #[error("Receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
