//! Ordered transport layers derived from configuration.

use std::sync::Arc;

use outbound_config::{Network, TransportConfig};
use tracing::debug;

use crate::error::TransportError;
use crate::session::SessionCache;
use crate::tls::TlsLayer;
use crate::ws::WsLayer;
use crate::{BoxedStream, StreamLayer};

/// The layers a dialed stream passes through before the proxy handshake.
///
/// `ws-headers` are only read for network `ws`.
///
/// | network | tls   | layers            |
/// |---------|-------|-------------------|
/// | tcp     | false | (none)            |
/// | tcp     | true  | `tls`             |
/// | ws      | false | `websocket`       |
/// | ws      | true  | `websocket+tls`   |
#[derive(Clone, Default)]
pub struct TransportStack {
    layers: Vec<Arc<dyn StreamLayer>>,
}

impl std::fmt::Debug for TransportStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.layer_names()).finish()
    }
}

impl TransportStack {
    pub fn from_config(
        server_addr: &str,
        config: &TransportConfig,
        sessions: &SessionCache,
    ) -> Result<Self, TransportError> {
        let mut stack = Self::default();
        match config.network {
            Network::Ws => {
                stack = stack.push(WsLayer::new(server_addr, config, sessions)?);
            }
            Network::Tcp if config.tls => {
                stack = stack.push(TlsLayer::new(server_addr, config, sessions)?);
            }
            Network::Tcp => {}
        }
        Ok(stack)
    }

    /// Append a layer. Layers run in insertion order.
    pub fn push(mut self, layer: impl StreamLayer + 'static) -> Self {
        self.layers.push(Arc::new(layer));
        self
    }

    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Thread `stream` through every layer. The first failure aborts.
    pub async fn compose(&self, mut stream: BoxedStream) -> Result<BoxedStream, TransportError> {
        for layer in &self.layers {
            stream = layer.wrap(stream).await?;
            debug!(layer = layer.name(), "transport layer ready");
        }
        Ok(stream)
    }
}
