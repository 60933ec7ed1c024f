//! UDP over a VLESS stream.

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use outbound_proto::{MAX_UDP_PAYLOAD, ParseResult, UDP_LEN_PREFIX, parse_udp_frame};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Mutex;
use tracing::debug;

use crate::conn::PacketConn;

const READ_CHUNK: usize = 4096;

/// Datagrams framed as `length(2, BE) | payload` over one stream.
///
/// The channel is bound to a single peer chosen when the stream was opened:
/// every datagram goes there and every datagram is reported as coming from
/// there. Receiving and sending lock separate halves, so one task can wait
/// for a datagram while another sends. Partially received frames stay
/// buffered, so `recv_from` is cancel safe.
pub struct VlessPacketConn<S> {
    reader: Mutex<FrameReader<S>>,
    writer: Mutex<WriteHalf<S>>,
    peer: SocketAddr,
}

struct FrameReader<S> {
    half: ReadHalf<S>,
    pending: BytesMut,
}

impl<S: AsyncRead + AsyncWrite> VlessPacketConn<S> {
    pub fn new(stream: S, peer: SocketAddr) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            reader: Mutex::new(FrameReader {
                half: reader,
                pending: BytesMut::with_capacity(READ_CHUNK),
            }),
            writer: Mutex::new(writer),
            peer,
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

#[async_trait]
impl<S> PacketConn for VlessPacketConn<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let mut reader = self.reader.lock().await;
        let FrameReader { half, pending } = &mut *reader;
        loop {
            let frame = match parse_udp_frame(&pending[..]) {
                ParseResult::Complete(frame) => {
                    let n = frame.payload.len().min(buf.len());
                    buf[..n].copy_from_slice(&frame.payload[..n]);
                    Some((n, frame.frame_len))
                }
                ParseResult::Incomplete(_) | ParseResult::Invalid(_) => None,
            };
            if let Some((n, frame_len)) = frame {
                pending.advance(frame_len);
                return Ok((n, self.peer));
            }
            pending.reserve(READ_CHUNK);
            if half.read_buf(pending).await? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "packet channel closed",
                ));
            }
        }
    }

    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        if buf.len() > MAX_UDP_PAYLOAD {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "udp payload exceeds 65535 bytes",
            ));
        }
        if target != self.peer {
            debug!(peer = %self.peer, target = %target, "udp target differs from bound peer");
        }
        let mut frame = BytesMut::with_capacity(UDP_LEN_PREFIX + buf.len());
        outbound_proto::write_udp_frame(&mut frame, buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let mut writer = self.writer.lock().await;
        writer.write_all(&frame).await?;
        writer.flush().await?;
        Ok(buf.len())
    }

    async fn close(&self) -> io::Result<()> {
        self.writer.lock().await.shutdown().await
    }
}
