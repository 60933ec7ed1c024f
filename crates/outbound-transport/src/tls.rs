//! TLS client layer.

use std::sync::Arc;

use outbound_config::TransportConfig;
use rustls::pki_types::{CertificateDer, ServerName};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use crate::error::TransportError;
use crate::session::SessionCache;
use crate::{BoxFuture, BoxedStream, StreamLayer, TransportStream};

/// TLS client handshake with a fixed server name.
///
/// The name is the `servername` override when set, otherwise the host part
/// of the proxy's server address. It is used both for SNI and for
/// certificate validation unless `skip-cert-verify` is on.
#[derive(Clone)]
pub struct TlsLayer {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

impl std::fmt::Debug for TlsLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsLayer")
            .field("server_name", &self.server_name)
            .finish()
    }
}

impl TlsLayer {
    pub fn new(
        server_addr: &str,
        config: &TransportConfig,
        sessions: &SessionCache,
    ) -> Result<Self, TransportError> {
        let client_config = build_client_config(config, sessions)?;
        let server_name = resolve_server_name(config.server_name.as_deref(), server_addr)?;
        Ok(Self {
            connector: TlsConnector::from(Arc::new(client_config)),
            server_name,
        })
    }

    pub fn server_name(&self) -> &ServerName<'static> {
        &self.server_name
    }

    /// Run the client handshake over `stream`.
    pub async fn handshake<S: TransportStream>(
        &self,
        stream: S,
    ) -> Result<TlsStream<S>, TransportError> {
        let tls = self
            .connector
            .connect(self.server_name.clone(), stream)
            .await
            .map_err(TransportError::TlsHandshake)?;
        debug!(
            server_name = ?self.server_name,
            resumed = matches!(
                tls.get_ref().1.handshake_kind(),
                Some(rustls::HandshakeKind::Resumed)
            ),
            "tls handshake complete"
        );
        Ok(tls)
    }
}

impl StreamLayer for TlsLayer {
    fn name(&self) -> &'static str {
        "tls"
    }

    fn wrap(&self, stream: BoxedStream) -> BoxFuture<'_, Result<BoxedStream, TransportError>> {
        Box::pin(async move {
            let tls = self.handshake(stream).await?;
            Ok(Box::new(tls) as BoxedStream)
        })
    }
}

/// Build the rustls client config for one proxy.
pub fn build_client_config(
    config: &TransportConfig,
    sessions: &SessionCache,
) -> Result<rustls::ClientConfig, TransportError> {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let builder = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?;

    let mut client_config = if config.skip_cert_verify {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerifier))
            .with_no_client_auth()
    } else {
        builder
            .with_root_certificates(load_roots(config.ca.as_deref())?)
            .with_no_client_auth()
    };
    client_config.resumption = sessions.resumption();
    Ok(client_config)
}

fn load_roots(ca: Option<&str>) -> Result<rustls::RootCertStore, TransportError> {
    let mut roots = rustls::RootCertStore::empty();
    let Some(ca_path) = ca else {
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        return Ok(roots);
    };

    let ca_data = std::fs::read(ca_path)
        .map_err(|e| TransportError::Config(format!("failed to read CA cert {ca_path}: {e}")))?;
    let certs: Vec<CertificateDer<'static>> =
        rustls_pemfile::certs(&mut std::io::Cursor::new(&ca_data))
            .collect::<Result<_, _>>()
            .map_err(|e| TransportError::Config(format!("failed to parse CA cert: {e}")))?;
    if certs.is_empty() {
        return Err(TransportError::Config(format!(
            "no certificates found in {ca_path}"
        )));
    }
    for cert in certs {
        roots.add(cert)?;
    }
    Ok(roots)
}

/// Pick the TLS server name: the override if given, else the host of `server_addr`.
pub fn resolve_server_name(
    override_name: Option<&str>,
    server_addr: &str,
) -> Result<ServerName<'static>, TransportError> {
    let host = match override_name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => extract_host(server_addr),
    };
    ServerName::try_from(host)
        .map_err(|e| TransportError::Config(format!("invalid TLS server name: {e}")))
}

fn extract_host(remote: &str) -> String {
    if let Some(stripped) = remote.strip_prefix('[')
        && let Some(end) = stripped.find(']')
    {
        return stripped[..end].to_string();
    }

    if remote.chars().filter(|&c| c == ':').count() == 1 {
        return remote
            .rsplit_once(':')
            .map(|(h, _)| h.to_string())
            .unwrap_or_else(|| remote.to_string());
    }

    remote.to_string()
}

/// Certificate verifier that accepts any certificate (for skip-cert-verify).
#[derive(Debug)]
struct NoVerifier;

impl rustls::client::danger::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::aws_lc_rs::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
