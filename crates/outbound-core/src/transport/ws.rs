//! WebSocket stream adapter.
//!
//! `WsIo` wraps a `WebSocketStream` and exposes it as `AsyncRead + AsyncWrite`
//! so the proxy handshake and payload can run over WebSocket framing exactly
//! as they would over a raw socket.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::{Sink, Stream};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_tungstenite::{
    WebSocketStream,
    tungstenite::{Error as WsError, Message},
};

/// WebSocket stream adapter that exposes AsyncRead/AsyncWrite using binary frames.
///
/// - Binary and text frames are concatenated into one byte stream
/// - Every write becomes one binary frame
/// - Pings are answered, pongs ignored
/// - A close frame or end of stream reads as EOF
pub struct WsIo<S> {
    ws: WebSocketStream<S>,
    pending: Bytes,
    closed: bool,
}

impl<S> WsIo<S> {
    /// Create a new WebSocket I/O adapter.
    pub fn new(ws: WebSocketStream<S>) -> Self {
        Self {
            ws,
            pending: Bytes::new(),
            closed: false,
        }
    }

    /// Consumes the adapter and returns the underlying WebSocket stream.
    ///
    /// Buffered but unread frame data is lost.
    pub fn into_inner(self) -> WebSocketStream<S> {
        self.ws
    }

    fn drain_pending(&mut self, buf: &mut ReadBuf<'_>) {
        let n = self.pending.len().min(buf.remaining());
        buf.put_slice(&self.pending[..n]);
        self.pending = self.pending.slice(n..);
    }
}

impl<S> AsyncRead for WsIo<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        if !this.pending.is_empty() {
            this.drain_pending(buf);
            return Poll::Ready(Ok(()));
        }
        if this.closed {
            return Poll::Ready(Ok(()));
        }

        loop {
            let msg = match Pin::new(&mut this.ws).poll_next(cx) {
                Poll::Ready(Some(Ok(msg))) => msg,
                Poll::Ready(Some(Err(WsError::ConnectionClosed))) | Poll::Ready(None) => {
                    this.closed = true;
                    return Poll::Ready(Ok(()));
                }
                Poll::Ready(Some(Err(err))) => return Poll::Ready(Err(ws_err(err))),
                Poll::Pending => return Poll::Pending,
            };

            let data = match msg {
                Message::Binary(data) => Bytes::from(data),
                Message::Text(text) => Bytes::from(text.into_bytes()),
                Message::Ping(payload) => {
                    let mut ws = Pin::new(&mut this.ws);
                    match ws.as_mut().poll_ready(cx) {
                        Poll::Ready(Ok(())) => {
                            if let Err(err) = ws.start_send(Message::Pong(payload)) {
                                return Poll::Ready(Err(ws_err(err)));
                            }
                            continue;
                        }
                        Poll::Ready(Err(err)) => return Poll::Ready(Err(ws_err(err))),
                        Poll::Pending => return Poll::Pending,
                    }
                }
                Message::Close(_) => {
                    this.closed = true;
                    return Poll::Ready(Ok(()));
                }
                Message::Pong(_) | Message::Frame(_) => continue,
            };

            // Empty data frames would read as EOF; skip them.
            if data.is_empty() {
                continue;
            }
            this.pending = data;
            this.drain_pending(buf);
            return Poll::Ready(Ok(()));
        }
    }
}

impl<S> AsyncWrite for WsIo<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        if data.is_empty() {
            return Poll::Ready(Ok(0));
        }
        let mut ws = Pin::new(&mut self.get_mut().ws);
        match ws.as_mut().poll_ready(cx) {
            Poll::Ready(Ok(())) => match ws.start_send(Message::Binary(data.to_vec())) {
                Ok(()) => Poll::Ready(Ok(data.len())),
                Err(err) => Poll::Ready(Err(ws_err(err))),
            },
            Poll::Ready(Err(err)) => Poll::Ready(Err(ws_err(err))),
            Poll::Pending => Poll::Pending,
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().ws)
            .poll_flush(cx)
            .map_err(ws_err)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().ws)
            .poll_close(cx)
            .map_err(ws_err)
    }
}

fn ws_err(err: WsError) -> std::io::Error {
    std::io::Error::other(err)
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};
    use tokio_tungstenite::{accept_async, client_async};

    use super::WsIo;

    #[tokio::test]
    async fn bytes_cross_frame_boundaries() {
        let (client_io, server_io) = duplex(64 * 1024);

        let server = tokio::spawn(async move {
            let ws = accept_async(server_io).await.unwrap();
            let mut io = WsIo::new(ws);
            let mut buf = [0u8; 5];
            io.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"hello");
            io.write_all(b"wor").await.unwrap();
            io.write_all(b"ld").await.unwrap();
            io.flush().await.unwrap();
            io.shutdown().await.unwrap();
        });

        let (ws, _resp) = client_async("ws://localhost/", client_io).await.unwrap();
        let mut io = WsIo::new(ws);
        io.write_all(b"hello").await.unwrap();
        io.flush().await.unwrap();

        let mut out = Vec::new();
        io.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"world");

        server.await.unwrap();
    }

    #[tokio::test]
    async fn large_frame_is_drained_over_several_reads() {
        let (client_io, server_io) = duplex(64 * 1024);
        let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let expected = payload.clone();

        let server = tokio::spawn(async move {
            let ws = accept_async(server_io).await.unwrap();
            let mut io = WsIo::new(ws);
            io.write_all(&payload).await.unwrap();
            io.flush().await.unwrap();
        });

        let (ws, _resp) = client_async("ws://localhost/", client_io).await.unwrap();
        let mut io = WsIo::new(ws);
        let mut got = vec![0u8; expected.len()];
        let mut small = [0u8; 1000];
        let mut filled = 0;
        while filled < got.len() {
            let n = io.read(&mut small).await.unwrap();
            assert!(n > 0 && n <= small.len());
            got[filled..filled + n].copy_from_slice(&small[..n]);
            filled += n;
        }
        assert_eq!(got, expected);

        server.await.unwrap();
    }
}
