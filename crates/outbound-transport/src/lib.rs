//! Transport layering for outbound proxy connections.
//!
//! A proxy's transport is described as data: a [`TransportStack`] holds an
//! ordered list of [`StreamLayer`]s derived from configuration and threads a
//! dialed stream through them. Dialing itself sits behind the [`Dialer`] port
//! so composition can be exercised without sockets.
//!
//! # Layers
//!
//! - [`tls`]: rustls client handshake with SNI override and session resumption.
//! - [`ws`]: WebSocket upgrade, optionally running its own TLS handshake first,
//!   reusing `outbound_core::transport::WsIo` for framing.

pub mod dial;
pub mod error;
pub mod session;
pub mod stack;
pub mod tls;
pub mod ws;

use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncWrite};

pub use dial::{DialedStream, Dialer, TcpDialer};
pub use error::TransportError;
pub use session::SessionCache;
pub use stack::TransportStack;
pub use tls::TlsLayer;
pub use ws::WsLayer;

/// Marker trait for streams usable as proxy connections.
pub trait TransportStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + 'static> TransportStream for T {}

/// Type-erased transport stream.
pub type BoxedStream = Box<dyn TransportStream>;

/// Boxed future returned by the object-safe transport traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One decorator in a transport stack.
pub trait StreamLayer: Send + Sync {
    /// Name used in logs and in [`TransportStack::layer_names`].
    fn name(&self) -> &'static str;

    /// Run this layer's handshake over `stream` and return the wrapped stream.
    fn wrap(&self, stream: BoxedStream) -> BoxFuture<'_, Result<BoxedStream, TransportError>>;
}
