//! WebSocket client layer.
//!
//! Upgrades the stream with the configured path and headers and exposes the
//! result through `outbound_core::transport::WsIo`. When TLS is enabled the
//! layer runs the TLS handshake itself before the upgrade, so WebSocket over
//! TLS is a single composite layer rather than two independent ones.

use outbound_config::TransportConfig;
use outbound_core::transport::WsIo;
use tokio_tungstenite::client_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tracing::debug;

use crate::error::TransportError;
use crate::session::SessionCache;
use crate::tls::TlsLayer;
use crate::{BoxFuture, BoxedStream, StreamLayer, TransportStream};

#[derive(Debug, Clone)]
pub struct WsLayer {
    url: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    tls: Option<TlsLayer>,
}

impl WsLayer {
    pub fn new(
        server_addr: &str,
        config: &TransportConfig,
        sessions: &SessionCache,
    ) -> Result<Self, TransportError> {
        let tls = if config.tls {
            Some(TlsLayer::new(server_addr, config, sessions)?)
        } else {
            None
        };
        let scheme = if tls.is_some() { "wss" } else { "ws" };
        let url = format!("{scheme}://{server_addr}{}", normalize_path(&config.ws_path));

        let mut headers = Vec::with_capacity(config.ws_headers.len());
        for (name, value) in &config.ws_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::Config(format!("invalid ws header {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::Config(format!("invalid ws header value: {e}")))?;
            headers.push((name, value));
        }

        Ok(Self { url, headers, tls })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn upgrade<S: TransportStream>(&self, stream: S) -> Result<BoxedStream, TransportError> {
        let mut request = self.url.as_str().into_client_request()?;
        for (name, value) in &self.headers {
            request.headers_mut().insert(name.clone(), value.clone());
        }
        let (ws, response) = client_async(request, stream).await?;
        debug!(url = %self.url, status = %response.status(), "websocket upgraded");
        Ok(Box::new(WsIo::new(ws)))
    }
}

impl StreamLayer for WsLayer {
    fn name(&self) -> &'static str {
        if self.tls.is_some() {
            "websocket+tls"
        } else {
            "websocket"
        }
    }

    fn wrap(&self, stream: BoxedStream) -> BoxFuture<'_, Result<BoxedStream, TransportError>> {
        Box::pin(async move {
            match &self.tls {
                Some(tls) => {
                    let tls_stream = tls.handshake(stream).await?;
                    self.upgrade(tls_stream).await
                }
                None => self.upgrade(stream).await,
            }
        })
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use outbound_config::Network;

    use super::*;

    fn ws_config(tls: bool, path: &str) -> TransportConfig {
        TransportConfig {
            network: Network::Ws,
            tls,
            ws_path: path.into(),
            ..TransportConfig::default()
        }
    }

    #[test]
    fn url_uses_scheme_and_normalized_path() {
        let sessions = SessionCache::default();
        let plain = WsLayer::new("example.com:80", &ws_config(false, "ray"), &sessions).unwrap();
        assert_eq!(plain.url(), "ws://example.com:80/ray");
        assert_eq!(plain.name(), "websocket");

        let secure =
            WsLayer::new("example.com:443", &ws_config(true, "/ray?ed=2048"), &sessions).unwrap();
        assert_eq!(secure.url(), "wss://example.com:443/ray?ed=2048");
        assert_eq!(secure.name(), "websocket+tls");
    }

    #[test]
    fn bad_header_name_is_config_error() {
        let config = TransportConfig {
            ws_headers: HashMap::from([("bad header".to_string(), "v".to_string())]),
            ..ws_config(false, "/")
        };
        let err = WsLayer::new("h:80", &config, &SessionCache::default()).unwrap_err();
        assert!(matches!(err, TransportError::Config(_)));
    }
}
