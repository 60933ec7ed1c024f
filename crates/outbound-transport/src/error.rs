//! Error types for the transport crate.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that can occur while building or composing transport layers.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("TLS handshake failed: {0}")]
    TlsHandshake(#[source] std::io::Error),

    #[error("websocket upgrade failed: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl TransportError {
    /// Short name of the layer that failed, for log fields.
    pub fn layer(&self) -> &'static str {
        match self {
            TransportError::Io(_) => "io",
            TransportError::Tls(_) | TransportError::TlsHandshake(_) => "tls",
            TransportError::WebSocket(_) => "websocket",
            TransportError::Config(_) => "config",
        }
    }
}
