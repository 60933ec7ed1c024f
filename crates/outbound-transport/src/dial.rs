//! Dialer port and the TCP implementation.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use outbound_config::TcpConfig;
use outbound_dns::DnsResolver;
use tokio::net::TcpStream;
use tracing::debug;

use crate::{BoxFuture, BoxedStream};

/// A freshly dialed base connection.
pub struct DialedStream {
    pub stream: BoxedStream,
    pub local_addr: Option<SocketAddr>,
    pub peer_addr: Option<SocketAddr>,
}

impl std::fmt::Debug for DialedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialedStream")
            .field("local_addr", &self.local_addr)
            .field("peer_addr", &self.peer_addr)
            .finish_non_exhaustive()
    }
}

/// Opens connection-oriented base streams to `host:port` addresses.
pub trait Dialer: Send + Sync {
    fn dial<'a>(&'a self, addr: &'a str) -> BoxFuture<'a, io::Result<DialedStream>>;
}

/// Plain TCP dialer.
///
/// When a [`DnsResolver`] is configured the server host is resolved through
/// it; otherwise `TcpStream::connect` uses the system resolver.
#[derive(Debug, Clone)]
pub struct TcpDialer {
    resolver: Option<DnsResolver>,
    no_delay: bool,
    keepalive: Option<Duration>,
}

impl TcpDialer {
    pub fn new(config: &TcpConfig) -> Self {
        Self {
            resolver: None,
            no_delay: config.no_delay,
            keepalive: (config.keepalive_secs > 0)
                .then(|| Duration::from_secs(config.keepalive_secs)),
        }
    }

    pub fn with_resolver(mut self, resolver: DnsResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    async fn connect(&self, addr: &str) -> io::Result<TcpStream> {
        match &self.resolver {
            Some(resolver) => {
                let socket_addr = resolver
                    .resolve(addr)
                    .await
                    .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))?;
                TcpStream::connect(socket_addr).await
            }
            None => TcpStream::connect(addr).await,
        }
    }
}

impl Default for TcpDialer {
    fn default() -> Self {
        Self::new(&TcpConfig::default())
    }
}

impl Dialer for TcpDialer {
    fn dial<'a>(&'a self, addr: &'a str) -> BoxFuture<'a, io::Result<DialedStream>> {
        Box::pin(async move {
            let tcp = self.connect(addr).await?;
            tcp.set_nodelay(self.no_delay)?;
            if let Some(time) = self.keepalive {
                let keepalive = socket2::TcpKeepalive::new().with_time(time);
                if let Err(e) = socket2::SockRef::from(&tcp).set_tcp_keepalive(&keepalive) {
                    debug!(addr = %addr, error = %e, "failed to enable tcp keepalive");
                }
            }
            let local_addr = tcp.local_addr().ok();
            let peer_addr = tcp.peer_addr().ok();
            debug!(addr = %addr, peer = ?peer_addr, "dialed");
            Ok(DialedStream {
                stream: Box::new(tcp),
                local_addr,
                peer_addr,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn dials_loopback_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            sock.write_all(b"hi").await.unwrap();
        });

        let dialer = TcpDialer::default();
        let mut dialed = dialer.dial(&addr.to_string()).await.unwrap();
        assert_eq!(dialed.peer_addr, Some(addr));
        assert!(dialed.local_addr.is_some_and(|a| a.ip().is_loopback()));

        let mut buf = [0u8; 2];
        dialed.stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hi");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dialer = TcpDialer::new(&TcpConfig {
            no_delay: false,
            keepalive_secs: 0,
        });
        assert!(dialer.dial(&addr.to_string()).await.is_err());
    }
}
