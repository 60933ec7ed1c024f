//! Adapter error types.

use std::io;

use outbound_core::errors;
use outbound_dns::DnsError;
use outbound_proto::CredentialError;
use outbound_transport::TransportError;

/// Failure class, for callers that branch on why a connection failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Socket establishment failed, including timeout and cancellation.
    Dial,
    /// TLS, WebSocket or proxy protocol handshake failed.
    Handshake,
    /// Destination hostname could not be resolved.
    Resolution,
    /// The adapter refuses the operation.
    Unsupported,
    /// The adapter could not be built from its configuration.
    Configuration,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Dial => errors::ERROR_DIAL,
            ErrorKind::Handshake => errors::ERROR_HANDSHAKE,
            ErrorKind::Resolution => errors::ERROR_RESOLVE,
            ErrorKind::Unsupported => errors::ERROR_UNSUPPORTED,
            ErrorKind::Configuration => errors::ERROR_CONFIG,
        }
    }
}

/// Errors returned by proxy adapters.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("{addr} connect error: {source}")]
    Dial {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("{addr} {} error: {source}", .source.layer())]
    Transport {
        addr: String,
        #[source]
        source: TransportError,
    },

    #[error("{addr} vless handshake error: {source}")]
    Protocol {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: DnsError,
    },

    #[error("{0}")]
    Unsupported(String),

    #[error("invalid uuid: {0}")]
    Credential(#[from] CredentialError),

    #[error("config error: {0}")]
    Config(String),
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::Dial { .. } => ErrorKind::Dial,
            AdapterError::Transport { .. } | AdapterError::Protocol { .. } => ErrorKind::Handshake,
            AdapterError::Resolve { .. } => ErrorKind::Resolution,
            AdapterError::Unsupported(_) => ErrorKind::Unsupported,
            AdapterError::Credential(_) | AdapterError::Config(_) => ErrorKind::Configuration,
        }
    }

    pub(crate) fn dial(addr: &str, source: io::Error) -> Self {
        AdapterError::Dial {
            addr: addr.to_string(),
            source,
        }
    }

    pub(crate) fn transport(addr: &str, source: TransportError) -> Self {
        AdapterError::Transport {
            addr: addr.to_string(),
            source,
        }
    }

    pub(crate) fn protocol(addr: &str, source: io::Error) -> Self {
        AdapterError::Protocol {
            addr: addr.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_labels() {
        let dial = AdapterError::dial("h:1", io::Error::from(io::ErrorKind::TimedOut));
        assert_eq!(dial.kind(), ErrorKind::Dial);
        assert_eq!(dial.kind().as_str(), "dial");
        assert!(dial.to_string().starts_with("h:1 connect error"));

        let tls = AdapterError::transport(
            "h:1",
            TransportError::TlsHandshake(io::Error::other("bad cert")),
        );
        assert_eq!(tls.kind(), ErrorKind::Handshake);
        assert_eq!(tls.to_string(), "h:1 tls error: TLS handshake failed: bad cert");

        let bad = AdapterError::from(outbound_proto::Credential::parse("nope").unwrap_err());
        assert_eq!(bad.kind(), ErrorKind::Configuration);
    }
}
