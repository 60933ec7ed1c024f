//! TLS and WebSocket-over-TLS composition against in-memory servers.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use outbound_config::{Network, TransportConfig};
use outbound_core::transport::WsIo;
use outbound_transport::{SessionCache, TlsLayer, TransportStack};
use rcgen::{BasicConstraints, CertificateParams, IsCa, KeyPair};
use rustls::HandshakeKind;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};
use tokio_rustls::TlsAcceptor;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderMap;

struct Pki {
    ca_file: NamedTempFile,
    acceptor: TlsAcceptor,
}

/// CA plus a leaf valid only for `edge.test`.
fn pki() -> Pki {
    let ca_key = KeyPair::generate().unwrap();
    let mut ca_params = CertificateParams::new(Vec::<String>::new()).unwrap();
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let ca_cert = ca_params.self_signed(&ca_key).unwrap();

    let leaf_key = KeyPair::generate().unwrap();
    let leaf = CertificateParams::new(vec!["edge.test".to_string()])
        .unwrap()
        .signed_by(&leaf_key, &ca_cert, &ca_key)
        .unwrap();

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let server_config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(
            vec![CertificateDer::from(leaf.der().to_vec())],
            PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(leaf_key.serialize_der())),
        )
        .unwrap();

    let mut ca_file = NamedTempFile::new().unwrap();
    ca_file.write_all(ca_cert.pem().as_bytes()).unwrap();

    Pki {
        ca_file,
        acceptor: TlsAcceptor::from(Arc::new(server_config)),
    }
}

fn tls_config(pki: &Pki, server_name: Option<&str>) -> TransportConfig {
    TransportConfig {
        tls: true,
        server_name: server_name.map(str::to_string),
        ca: Some(pki.ca_file.path().to_string_lossy().into_owned()),
        ..TransportConfig::default()
    }
}

/// Accept one TLS connection and answer with `ok`.
fn serve_once(acceptor: TlsAcceptor, io: DuplexStream) -> tokio::task::JoinHandle<bool> {
    tokio::spawn(async move {
        match acceptor.accept(io).await {
            Ok(mut tls) => {
                let _ = tls.write_all(b"ok").await;
                let _ = tls.flush().await;
                let mut sink = Vec::new();
                let _ = tls.read_to_end(&mut sink).await;
                true
            }
            Err(_) => false,
        }
    })
}

async fn handshake(pki: &Pki, server_addr: &str, server_name: Option<&str>) -> bool {
    let sessions = SessionCache::default();
    let layer = TlsLayer::new(server_addr, &tls_config(pki, server_name), &sessions).unwrap();
    let (client_io, server_io) = duplex(64 * 1024);
    let server = serve_once(pki.acceptor.clone(), server_io);

    let ok = match layer.handshake(client_io).await {
        Ok(mut tls) => {
            let mut buf = [0u8; 2];
            tls.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"ok");
            true
        }
        Err(_) => false,
    };
    let _ = server.await;
    ok
}

#[tokio::test]
async fn verification_name_is_server_host_without_override() {
    let pki = pki();
    assert!(handshake(&pki, "edge.test:443", None).await);
    assert!(!handshake(&pki, "other.test:443", None).await);
}

#[tokio::test]
async fn verification_name_is_override_when_set() {
    let pki = pki();
    assert!(handshake(&pki, "10.0.0.1:443", Some("edge.test")).await);
    assert!(!handshake(&pki, "edge.test:443", Some("wrong.test")).await);
}

#[tokio::test]
async fn skip_cert_verify_accepts_any_name() {
    let pki = pki();
    let config = TransportConfig {
        tls: true,
        skip_cert_verify: true,
        ..TransportConfig::default()
    };
    let layer = TlsLayer::new("unrelated.test:443", &config, &SessionCache::default()).unwrap();
    let (client_io, server_io) = duplex(64 * 1024);
    let server = serve_once(pki.acceptor.clone(), server_io);

    let mut tls = layer.handshake(client_io).await.unwrap();
    let mut buf = [0u8; 2];
    tls.read_exact(&mut buf).await.unwrap();
    drop(tls);
    assert!(server.await.unwrap());
}

#[tokio::test]
async fn second_handshake_resumes_from_shared_cache() {
    let pki = pki();
    let sessions = SessionCache::default();
    let layer = TlsLayer::new("edge.test:443", &tls_config(&pki, None), &sessions).unwrap();

    let mut kinds = Vec::new();
    for _ in 0..2 {
        let (client_io, server_io) = duplex(64 * 1024);
        let server = serve_once(pki.acceptor.clone(), server_io);
        let mut tls = layer.handshake(client_io).await.unwrap();
        // Reading past the handshake makes the client process session tickets.
        let mut buf = [0u8; 2];
        tls.read_exact(&mut buf).await.unwrap();
        kinds.push(tls.get_ref().1.handshake_kind());
        tls.shutdown().await.unwrap();
        drop(tls);
        server.await.unwrap();
    }

    assert_eq!(kinds[0], Some(HandshakeKind::Full));
    assert_eq!(kinds[1], Some(HandshakeKind::Resumed));
}

#[tokio::test]
async fn websocket_over_tls_is_one_handshake_then_upgrade() {
    let pki = pki();
    let config = TransportConfig {
        network: Network::Ws,
        ws_path: "/tunnel".into(),
        ws_headers: [
            ("Host".to_string(), "cdn.example.com".to_string()),
            ("X-Token".to_string(), "secret".to_string()),
        ]
        .into_iter()
        .collect(),
        ..tls_config(&pki, None)
    };
    let stack = TransportStack::from_config("edge.test:443", &config, &SessionCache::default())
        .unwrap();
    assert_eq!(stack.layer_names(), vec!["websocket+tls"]);

    let accepts = Arc::new(AtomicUsize::new(0));
    let (client_io, server_io) = duplex(64 * 1024);
    let (header_tx, header_rx) = tokio::sync::oneshot::channel::<(String, HeaderMap)>();
    let acceptor = pki.acceptor.clone();
    let server_accepts = accepts.clone();
    let server = tokio::spawn(async move {
        let tls = acceptor.accept(server_io).await.unwrap();
        server_accepts.fetch_add(1, Ordering::SeqCst);
        let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let _ = header_tx.send((req.uri().path().to_string(), req.headers().clone()));
            Ok(resp)
        };
        let ws = accept_hdr_async(tls, callback).await.unwrap();
        let mut io = WsIo::new(ws);
        let mut buf = [0u8; 4];
        io.read_exact(&mut buf).await.unwrap();
        io.write_all(&buf).await.unwrap();
        io.flush().await.unwrap();
    });

    let mut stream = stack.compose(Box::new(client_io)).await.unwrap();
    stream.write_all(b"ping").await.unwrap();
    stream.flush().await.unwrap();
    let mut echoed = [0u8; 4];
    stream.read_exact(&mut echoed).await.unwrap();
    assert_eq!(&echoed, b"ping");
    server.await.unwrap();

    assert_eq!(accepts.load(Ordering::SeqCst), 1);
    let (path, headers) = header_rx.await.unwrap();
    assert_eq!(path, "/tunnel");
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    assert_eq!(header("host").as_deref(), Some("cdn.example.com"));
    assert_eq!(header("x-token").as_deref(), Some("secret"));
}
