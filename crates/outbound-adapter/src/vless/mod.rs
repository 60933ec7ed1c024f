//! VLESS adapter.
//!
//! Stream path: dial the server, run the transport stack (TLS, or WebSocket
//! with its own TLS), then send the VLESS request. UDP path: resolve the
//! destination if needed, open the same chain with the UDP command under a
//! fixed timeout, and wrap it in a single-peer packet channel.

mod client;
mod packet;

pub use client::{VlessClient, VlessStream};
pub use packet::VlessPacketConn;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use outbound_config::{Network, VlessConfig};
use outbound_core::defaults::DEFAULT_TCP_CONNECT_TIMEOUT_SECS;
use outbound_dns::IpResolver;
use outbound_proto::{AddressRef, CMD_TCP, CMD_UDP};
use outbound_transport::{BoxedStream, Dialer, TransportStack};
use tracing::{debug, warn};

use crate::adapter::{AdapterIdentity, AdapterType, ProxyAdapter};
use crate::build::AdapterResources;
use crate::conn::{Connection, PacketConnection};
use crate::context::DialContext;
use crate::error::AdapterError;
use crate::metadata::{Metadata, Protocol};

pub struct VlessAdapter {
    identity: Arc<AdapterIdentity>,
    client: VlessClient,
    stack: TransportStack,
    dialer: Arc<dyn Dialer>,
    resolver: Arc<dyn IpResolver>,
}

impl std::fmt::Debug for VlessAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VlessAdapter")
            .field("identity", &self.identity)
            .field("stack", &self.stack)
            .finish_non_exhaustive()
    }
}

impl VlessAdapter {
    /// Build from configuration. A malformed UUID fails here and never at
    /// connection time.
    pub fn new(config: &VlessConfig, resources: &AdapterResources) -> Result<Self, AdapterError> {
        let client = VlessClient::new(&config.uuid)?;
        let server_addr = config.server_addr();

        if config.transport.network != Network::Ws && !config.transport.ws_headers.is_empty() {
            warn!(proxy = %config.name, "ws-headers only apply to network ws; ignoring");
        }
        let stack = TransportStack::from_config(&server_addr, &config.transport, &resources.sessions)
            .map_err(|e| AdapterError::Config(format!("{}: {e}", config.name)))?;

        Ok(Self {
            identity: Arc::new(AdapterIdentity {
                name: config.name.clone(),
                adapter_type: AdapterType::Vless,
                udp: config.udp,
                server_addr,
            }),
            client,
            stack,
            dialer: resources.dialer.clone(),
            resolver: resources.resolver.clone(),
        })
    }

    pub fn layer_names(&self) -> Vec<&'static str> {
        self.stack.layer_names()
    }

    /// Dial, compose and hand shake. Each step fails with its own error.
    async fn connect(
        &self,
        command: u8,
        target: &AddressRef<'_>,
    ) -> Result<Handshaken, AdapterError> {
        let addr = self.identity.server_addr.as_str();
        let dialed = self
            .dialer
            .dial(addr)
            .await
            .map_err(|e| AdapterError::dial(addr, e))?;
        let (local_addr, peer_addr) = (dialed.local_addr, dialed.peer_addr);
        let stream = self
            .stack
            .compose(dialed.stream)
            .await
            .map_err(|e| AdapterError::transport(addr, e))?;
        let stream = self
            .client
            .handshake(stream, command, target)
            .await
            .map_err(|e| AdapterError::protocol(addr, e))?;
        debug!(proxy = %self.identity.name, server = %addr, target = %target, "vless stream open");
        Ok(Handshaken {
            stream,
            local_addr,
            peer_addr,
        })
    }
}

struct Handshaken {
    stream: VlessStream<BoxedStream>,
    local_addr: Option<SocketAddr>,
    peer_addr: Option<SocketAddr>,
}

/// Command and destination encoding for a stream request.
fn stream_target(metadata: &Metadata) -> Result<(u8, AddressRef<'_>), AdapterError> {
    let command = match metadata.protocol {
        Protocol::Tcp => CMD_TCP,
        Protocol::Udp => CMD_UDP,
    };
    if command == CMD_UDP {
        return metadata
            .udp_addr()
            .map(|addr| (command, AddressRef::from_socket_addr(addr)))
            .ok_or_else(|| AdapterError::Unsupported("udp destination must be resolved".into()));
    }
    if let Ok(ip) = metadata.host.parse::<IpAddr>() {
        return Ok((command, AddressRef::from_ip(ip, metadata.dst_port)));
    }
    if !metadata.host.is_empty() {
        return Ok((command, AddressRef::domain(&metadata.host, metadata.dst_port)));
    }
    metadata
        .dst_ip
        .map(|ip| (command, AddressRef::from_ip(ip, metadata.dst_port)))
        .ok_or_else(|| AdapterError::Unsupported("destination has no host or ip".into()))
}

#[async_trait]
impl ProxyAdapter for VlessAdapter {
    fn identity(&self) -> &Arc<AdapterIdentity> {
        &self.identity
    }

    async fn open_stream(
        &self,
        ctx: &DialContext,
        metadata: &Metadata,
    ) -> Result<Connection, AdapterError> {
        let (command, target) = stream_target(metadata)?;
        let conn = ctx
            .run(self.connect(command, &target))
            .await
            .map_err(|e| AdapterError::dial(&self.identity.server_addr, e))??;
        Ok(Connection::new(Box::new(conn.stream), self.identity.clone())
            .with_addrs(conn.local_addr, conn.peer_addr))
    }

    async fn open_packet_channel(
        &self,
        metadata: &Metadata,
    ) -> Result<PacketConnection, AdapterError> {
        if !self.identity.udp {
            return Err(AdapterError::Unsupported(format!(
                "{} does not support udp",
                self.identity.name
            )));
        }

        let peer = match metadata.udp_addr() {
            Some(addr) => addr,
            None => {
                let ip = self
                    .resolver
                    .resolve_ip(&metadata.host)
                    .await
                    .map_err(|e| AdapterError::Resolve {
                        host: metadata.host.clone(),
                        source: e,
                    })?;
                SocketAddr::new(ip, metadata.dst_port)
            }
        };

        let ctx = DialContext::with_timeout(Duration::from_secs(DEFAULT_TCP_CONNECT_TIMEOUT_SECS));
        let target = AddressRef::from_socket_addr(peer);
        let conn = ctx
            .run(self.connect(CMD_UDP, &target))
            .await
            .map_err(|e| AdapterError::dial(&self.identity.server_addr, e))??;

        Ok(PacketConnection::new(
            Box::new(VlessPacketConn::new(conn.stream, peer)),
            self.identity.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_target_prefers_domain() {
        let m = Metadata::tcp("example.com", 443).with_ip("1.2.3.4".parse().unwrap());
        let (cmd, target) = stream_target(&m).unwrap();
        assert_eq!(cmd, CMD_TCP);
        assert_eq!(target, AddressRef::domain("example.com", 443));

        let m = Metadata::from_socket_addr(Protocol::Tcp, "1.2.3.4:80".parse().unwrap());
        let (_, target) = stream_target(&m).unwrap();
        assert_eq!(target, AddressRef::from_ip("1.2.3.4".parse().unwrap(), 80));
    }

    #[test]
    fn ip_literal_host_is_not_a_domain() {
        let meta = Metadata::tcp("1.2.3.4", 80);
        let (_, target) = stream_target(&meta).unwrap();
        assert_eq!(target, AddressRef::from_ip("1.2.3.4".parse().unwrap(), 80));

        let meta = Metadata::tcp("2001:db8::1", 443);
        let (_, target) = stream_target(&meta).unwrap();
        assert_eq!(target, AddressRef::from_ip("2001:db8::1".parse().unwrap(), 443));
    }

    #[test]
    fn udp_target_uses_resolved_ip() {
        let m = Metadata::udp("dns.example", 53).with_ip("9.9.9.9".parse().unwrap());
        let (cmd, target) = stream_target(&m).unwrap();
        assert_eq!(cmd, CMD_UDP);
        assert_eq!(target, AddressRef::from_ip("9.9.9.9".parse().unwrap(), 53));

        let err = stream_target(&Metadata::udp("dns.example", 53)).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Unsupported);
    }

    #[test]
    fn empty_destination_is_rejected() {
        let err = stream_target(&Metadata::default()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Unsupported);
    }
}
