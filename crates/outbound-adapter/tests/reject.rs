#![allow(clippy::tests_outside_test_module)]
use std::time::Duration;

use outbound_adapter::{
    AdapterRegistry, AdapterType, DialContext, ErrorKind, Metadata, ProxyAdapter, Reject,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn reject_reads_eof_and_swallows_writes() {
    let reject = Reject::new();
    let mut conn = reject
        .open_stream(&DialContext::new(), &Metadata::tcp("blocked.example", 443))
        .await
        .unwrap();
    assert_eq!(conn.adapter().name, "REJECT");
    assert_eq!(conn.local_addr(), None);
    assert_eq!(conn.peer_addr(), None);

    let mut buf = [0u8; 32];
    assert_eq!(conn.read(&mut buf).await.unwrap(), 0);

    let start = Instant::now();
    assert_eq!(conn.write(b"GET / HTTP/1.1\r\n\r\n").await.unwrap(), 0);
    assert_eq!(start.elapsed(), Duration::ZERO);
    conn.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn reject_drop_stalls_each_write() {
    let reject = Reject::new_drop();
    let mut conn = reject
        .open_stream(&DialContext::new(), &Metadata::tcp("blocked.example", 443))
        .await
        .unwrap();

    let mut buf = [0u8; 8];
    let start = Instant::now();
    assert_eq!(conn.read(&mut buf).await.unwrap(), 0);
    assert_eq!(start.elapsed(), Duration::ZERO);

    let start = Instant::now();
    assert_eq!(conn.write(b"x").await.unwrap(), 0);
    assert!(start.elapsed() >= Duration::from_secs(60));

    let start = Instant::now();
    assert_eq!(conn.write(b"y").await.unwrap(), 0);
    assert!(start.elapsed() >= Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn reject_drop_stall_ignores_dial_context() {
    let reject = Reject::new_drop().with_duration(Duration::from_secs(10));
    let ctx = DialContext::with_timeout(Duration::from_secs(1));
    let mut conn = reject
        .open_stream(&ctx, &Metadata::tcp("blocked.example", 80))
        .await
        .unwrap();
    ctx.cancel_token().cancel();

    let start = Instant::now();
    assert_eq!(conn.write(b"data").await.unwrap(), 0);
    assert!(start.elapsed() >= Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn abandoned_write_releases_the_caller() {
    let reject = Reject::new_drop();
    let mut conn = reject
        .open_stream(&DialContext::new(), &Metadata::tcp("blocked.example", 80))
        .await
        .unwrap();

    let res = tokio::time::timeout(Duration::from_secs(1), conn.write(b"data")).await;
    assert!(res.is_err());
    assert_eq!(conn.read(&mut [0u8; 4]).await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn write_after_abandoned_write_stalls_in_full() {
    let reject = Reject::new_drop();
    let mut conn = reject
        .open_stream(&DialContext::new(), &Metadata::tcp("blocked.example", 80))
        .await
        .unwrap();

    let res = tokio::time::timeout(Duration::from_secs(50), conn.write(b"a")).await;
    assert!(res.is_err());

    let start = Instant::now();
    assert_eq!(conn.write(b"b").await.unwrap(), 0);
    assert!(start.elapsed() >= Duration::from_secs(60));
}

#[tokio::test]
async fn reject_refuses_packet_channels() {
    let registry = AdapterRegistry::new();
    for name in ["REJECT", "REJECT-DROP"] {
        let adapter = registry.get(name).unwrap();
        assert!(adapter.supports_udp());
        let err = adapter
            .open_packet_channel(&Metadata::udp("dns.example", 53))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(err.to_string().contains("match reject rule"));
    }
}

#[test]
fn configured_reject_names() {
    let reject = Reject::named("deny-ads");
    assert_eq!(reject.name(), "deny-ads");
    assert_eq!(reject.adapter_type(), AdapterType::Reject);
    assert_eq!(reject.duration(), Duration::ZERO);

    let tarpit = Reject::named_drop("tarpit");
    assert_eq!(tarpit.adapter_type(), AdapterType::RejectDrop);
    assert_eq!(tarpit.duration(), Duration::from_secs(60));
}
