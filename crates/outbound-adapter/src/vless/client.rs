//! VLESS handshake client and stream.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Buf, Bytes, BytesMut};
use outbound_proto::{AddressRef, Credential, CredentialError, ParseResult};
use outbound_transport::TransportStream;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};

/// Holds the account credential. Handshakes share nothing else, so one
/// client serves concurrent connections.
#[derive(Debug, Clone)]
pub struct VlessClient {
    credential: Credential,
}

impl VlessClient {
    pub fn new(uuid: &str) -> Result<Self, CredentialError> {
        Ok(Self {
            credential: Credential::parse(uuid)?,
        })
    }

    /// Send the request header for `address` and return the proxied stream.
    ///
    /// The response header is consumed on the first read, since servers only
    /// answer once the destination produces data.
    pub async fn handshake<S: TransportStream>(
        &self,
        mut stream: S,
        command: u8,
        address: &AddressRef<'_>,
    ) -> io::Result<VlessStream<S>> {
        let mut header = BytesMut::new();
        outbound_proto::write_request_header(&mut header, &self.credential, command, address)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        stream.write_all(&header).await?;
        stream.flush().await?;
        Ok(VlessStream::new(stream))
    }
}

/// A stream after the VLESS request was sent.
#[derive(Debug)]
pub struct VlessStream<S> {
    inner: S,
    response: Response,
}

#[derive(Debug)]
enum Response {
    Pending(BytesMut),
    /// Header consumed; holds payload bytes read along with it.
    Received(Bytes),
}

impl<S> VlessStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            response: Response::Pending(BytesMut::new()),
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for VlessStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        while let Response::Pending(header) = &mut this.response {
            match outbound_proto::parse_response_header(header) {
                ParseResult::Complete(len) => {
                    header.advance(len);
                    let rest = std::mem::take(header).freeze();
                    this.response = Response::Received(rest);
                }
                ParseResult::Incomplete(_) => {
                    let mut chunk = [0u8; 256];
                    let mut chunk_buf = ReadBuf::new(&mut chunk);
                    ready!(Pin::new(&mut this.inner).poll_read(cx, &mut chunk_buf))?;
                    if chunk_buf.filled().is_empty() {
                        if header.is_empty() {
                            // Closed before answering: plain EOF.
                            return Poll::Ready(Ok(()));
                        }
                        return Poll::Ready(Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "truncated vless response header",
                        )));
                    }
                    header.extend_from_slice(chunk_buf.filled());
                }
                ParseResult::Invalid(e) => {
                    return Poll::Ready(Err(io::Error::new(io::ErrorKind::InvalidData, e)));
                }
            }
        }

        if let Response::Received(rest) = &mut this.response
            && !rest.is_empty()
        {
            let n = rest.len().min(buf.remaining());
            buf.put_slice(&rest[..n]);
            rest.advance(n);
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for VlessStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
