//! Reject and Reject-Drop policy adapters.
//!
//! Neither touches the network. A rejected stream reads as EOF at once; its
//! writes report zero bytes written, after a stall for Reject-Drop. Every new
//! write stalls for the full duration, even one issued after an abandoned
//! write. The stall cannot be interrupted by shutdown or by the dial context.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};
use std::time::Duration;

use async_trait::async_trait;
use outbound_core::defaults::{DEFAULT_DROP_DURATION_SECS, REJECT_DROP_NAME, REJECT_NAME};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{Instant, Sleep};
use tracing::debug;

use crate::adapter::{AdapterIdentity, AdapterType, ProxyAdapter};
use crate::conn::{Connection, PacketConnection};
use crate::context::DialContext;
use crate::error::AdapterError;
use crate::metadata::Metadata;

#[derive(Debug, Clone)]
pub struct Reject {
    identity: Arc<AdapterIdentity>,
    duration: Duration,
}

impl Reject {
    /// The built-in `REJECT` adapter.
    pub fn new() -> Self {
        Self::named(REJECT_NAME)
    }

    /// The built-in `REJECT-DROP` adapter.
    pub fn new_drop() -> Self {
        Self::named_drop(REJECT_DROP_NAME)
    }

    /// An instant-reject adapter under a configured name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::with_type(name.into(), AdapterType::Reject, Duration::ZERO)
    }

    /// A tarpit adapter under a configured name, stalling writes for the
    /// default drop duration.
    pub fn named_drop(name: impl Into<String>) -> Self {
        Self::with_type(
            name.into(),
            AdapterType::RejectDrop,
            Duration::from_secs(DEFAULT_DROP_DURATION_SECS),
        )
    }

    fn with_type(name: String, adapter_type: AdapterType, duration: Duration) -> Self {
        Self {
            identity: Arc::new(AdapterIdentity {
                name,
                adapter_type,
                udp: true,
                server_addr: String::new(),
            }),
            duration,
        }
    }

    /// Override the write stall.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Default for Reject {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProxyAdapter for Reject {
    fn identity(&self) -> &Arc<AdapterIdentity> {
        &self.identity
    }

    async fn open_stream(
        &self,
        _ctx: &DialContext,
        metadata: &Metadata,
    ) -> Result<Connection, AdapterError> {
        debug!(proxy = %self.identity.name, target = %metadata, "rejected");
        Ok(Connection::new(
            Box::new(NopConn::new(self.duration)),
            self.identity.clone(),
        ))
    }

    async fn open_packet_channel(
        &self,
        _metadata: &Metadata,
    ) -> Result<PacketConnection, AdapterError> {
        Err(AdapterError::Unsupported("match reject rule".to_string()))
    }
}

/// A connection that never carries data.
#[derive(Debug)]
pub struct NopConn {
    duration: Duration,
    stall: Option<Stall>,
}

/// The timer of the write in progress, keyed by the buffer that armed it so
/// a re-poll of the same write resumes while a different write starts over.
#[derive(Debug)]
struct Stall {
    sleep: Pin<Box<Sleep>>,
    write: (usize, usize),
}

impl NopConn {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            stall: None,
        }
    }
}

impl AsyncRead for NopConn {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for NopConn {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.duration.is_zero() {
            return Poll::Ready(Ok(0));
        }
        let write = (buf.as_ptr() as usize, buf.len());
        let deadline = Instant::now() + this.duration;
        if let Some(stall) = &mut this.stall
            && stall.write != write
        {
            stall.sleep.as_mut().reset(deadline);
            stall.write = write;
        }
        let stall = this.stall.get_or_insert_with(|| Stall {
            sleep: Box::pin(tokio::time::sleep_until(deadline)),
            write,
        });
        ready!(stall.sleep.as_mut().poll(cx));
        this.stall = None;
        Poll::Ready(Ok(0))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
