//! Connection envelopes returned by adapters.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use outbound_transport::BoxedStream;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::adapter::AdapterIdentity;

/// A byte stream routed through an adapter.
///
/// Pure pass-through; it only remembers which adapter produced it and the
/// socket addresses of the underlying dial, when there was one.
pub struct Connection {
    stream: BoxedStream,
    identity: Arc<AdapterIdentity>,
    local_addr: Option<SocketAddr>,
    peer_addr: Option<SocketAddr>,
}

impl Connection {
    pub fn new(stream: BoxedStream, identity: Arc<AdapterIdentity>) -> Self {
        Self {
            stream,
            identity,
            local_addr: None,
            peer_addr: None,
        }
    }

    pub fn with_addrs(mut self, local: Option<SocketAddr>, peer: Option<SocketAddr>) -> Self {
        self.local_addr = local;
        self.peer_addr = peer;
        self
    }

    pub fn adapter(&self) -> &AdapterIdentity {
        &self.identity
    }

    /// Local end of the socket to the proxy server. `None` for connections
    /// that never touch the network.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// The proxy server's address, not the destination's.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    pub fn into_inner(self) -> BoxedStream {
        self.stream
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("adapter", &self.identity.name)
            .field("peer_addr", &self.peer_addr)
            .finish_non_exhaustive()
    }
}

impl AsyncRead for Connection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for Connection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().stream).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().stream).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().stream).poll_shutdown(cx)
    }
}

/// A datagram channel.
#[async_trait]
pub trait PacketConn: Send + Sync {
    /// Receive one datagram. Bytes beyond `buf.len()` are discarded.
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    /// Send one datagram to `target`.
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize>;

    async fn close(&self) -> io::Result<()>;
}

/// A packet channel routed through an adapter.
pub struct PacketConnection {
    conn: Box<dyn PacketConn>,
    identity: Arc<AdapterIdentity>,
}

impl PacketConnection {
    pub fn new(conn: Box<dyn PacketConn>, identity: Arc<AdapterIdentity>) -> Self {
        Self { conn, identity }
    }

    pub fn adapter(&self) -> &AdapterIdentity {
        &self.identity
    }

    pub async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.conn.recv_from(buf).await
    }

    pub async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.conn.send_to(buf, target).await
    }

    pub async fn close(&self) -> io::Result<()> {
        self.conn.close().await
    }
}

impl std::fmt::Debug for PacketConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketConnection")
            .field("adapter", &self.identity.name)
            .finish_non_exhaustive()
    }
}
