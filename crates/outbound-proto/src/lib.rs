//! VLESS protocol parsing and serialization.
//!
//! Covers the client request header, the server response header and the
//! length-prefixed framing used to carry datagrams over the stream. Parsers are
//! zero-copy and incremental; writers append to a `BytesMut`.
//!
//! ```text
//! request:  | ver | uuid(16) | addons_len | addons | cmd | port(be16) | atyp | addr |
//! response: | ver | addons_len | addons |
//! udp:      | len(be16) | payload |
//! ```

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use bytes::BytesMut;
use uuid::Uuid;

pub const VERSION: u8 = 0x00;
pub const UUID_LEN: usize = 16;

pub const CMD_TCP: u8 = 0x01;
pub const CMD_UDP: u8 = 0x02;
pub const CMD_MUX: u8 = 0x03;

pub const ATYP_IPV4: u8 = 0x01;
pub const ATYP_DOMAIN: u8 = 0x02;
pub const ATYP_IPV6: u8 = 0x03;

/// Maximum domain name length.
pub const MAX_DOMAIN_LEN: usize = 255;
/// Maximum payload of one UDP frame.
pub const MAX_UDP_PAYLOAD: usize = u16::MAX as usize;
/// Length of the UDP frame prefix.
pub const UDP_LEN_PREFIX: usize = 2;

/// The credential is not a well-formed UUID.
#[derive(Debug, thiserror::Error)]
#[error("invalid uuid: {0}")]
pub struct CredentialError(#[from] uuid::Error);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unsupported protocol version 0x{0:02x}")]
    InvalidVersion(u8),
    #[error("unknown command")]
    InvalidCommand,
    #[error("unknown address type")]
    InvalidAtyp,
    #[error("zero-length domain")]
    InvalidDomainLen,
    #[error("domain is not valid UTF-8")]
    InvalidUtf8,
}

/// Errors that can occur when writing protocol data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    /// Payload exceeds 65535 bytes.
    #[error("payload too large for a UDP frame")]
    PayloadTooLarge,
    /// Domain name exceeds 255 bytes.
    #[error("domain name too long")]
    DomainTooLong,
    /// Domain name is empty.
    #[error("empty domain name")]
    EmptyDomain,
}

/// Parse result for incremental parsing.
///
/// - `Complete(T)` - parsing succeeded.
/// - `Incomplete(n)` - buffer too small; `n` is the **minimum total bytes**
///   needed. Accumulate more data and retry.
/// - `Invalid(e)` - protocol violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult<T> {
    Complete(T),
    Incomplete(usize),
    Invalid(ParseError),
}

/// A user identity: the 16 raw bytes of a UUID.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Credential([u8; UUID_LEN]);

impl Credential {
    /// Parse a textual UUID (hyphenated, simple, braced or URN form).
    pub fn parse(s: &str) -> Result<Self, CredentialError> {
        let uuid = Uuid::parse_str(s.trim())?;
        Ok(Self(*uuid.as_bytes()))
    }

    pub fn from_bytes(bytes: [u8; UUID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; UUID_LEN] {
        &self.0
    }
}

impl FromStr for Credential {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_bytes(self.0).hyphenated())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRef<'a> {
    Ipv4([u8; 4]),
    Ipv6([u8; 16]),
    Domain(&'a [u8]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRef<'a> {
    pub host: HostRef<'a>,
    pub port: u16,
}

impl AddressRef<'static> {
    pub fn from_ip(ip: IpAddr, port: u16) -> Self {
        let host = match ip {
            IpAddr::V4(v4) => HostRef::Ipv4(v4.octets()),
            IpAddr::V6(v6) => HostRef::Ipv6(v6.octets()),
        };
        Self { host, port }
    }

    pub fn from_socket_addr(addr: SocketAddr) -> Self {
        Self::from_ip(addr.ip(), addr.port())
    }
}

impl<'a> AddressRef<'a> {
    pub fn domain(domain: &'a str, port: u16) -> Self {
        Self {
            host: HostRef::Domain(domain.as_bytes()),
            port,
        }
    }
}

impl fmt::Display for AddressRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            HostRef::Ipv4(ip) => write!(f, "{}:{}", std::net::Ipv4Addr::from(*ip), self.port),
            HostRef::Ipv6(ip) => write!(f, "[{}]:{}", std::net::Ipv6Addr::from(*ip), self.port),
            HostRef::Domain(d) => write!(f, "{}:{}", String::from_utf8_lossy(d), self.port),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlessRequest<'a> {
    pub credential: Credential,
    pub command: u8,
    /// `None` for the mux command, which carries no destination.
    pub address: Option<AddressRef<'a>>,
    pub header_len: usize,
    pub payload: &'a [u8],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpFrame<'a> {
    pub payload: &'a [u8],
    pub frame_len: usize,
}

/// Writes a VLESS request header (no addons) to the buffer.
///
/// # Errors
/// - `DomainTooLong` / `EmptyDomain` for an unencodable domain.
pub fn write_request_header(
    buf: &mut BytesMut,
    credential: &Credential,
    command: u8,
    address: &AddressRef<'_>,
) -> Result<(), WriteError> {
    if let HostRef::Domain(d) = &address.host {
        if d.is_empty() {
            return Err(WriteError::EmptyDomain);
        }
        if d.len() > MAX_DOMAIN_LEN {
            return Err(WriteError::DomainTooLong);
        }
    }
    buf.reserve(UUID_LEN + 24);
    buf.extend_from_slice(&[VERSION]);
    buf.extend_from_slice(credential.as_bytes());
    buf.extend_from_slice(&[0x00, command]);
    if command != CMD_MUX {
        buf.extend_from_slice(&address.port.to_be_bytes());
        write_address_unchecked(buf, address);
    }
    Ok(())
}

/// Parses a request header as sent by a client. Addons are skipped.
pub fn parse_request(buf: &[u8]) -> ParseResult<VlessRequest<'_>> {
    if buf.is_empty() {
        return ParseResult::Incomplete(1);
    }
    if buf[0] != VERSION {
        return ParseResult::Invalid(ParseError::InvalidVersion(buf[0]));
    }
    let mut offset = 1 + UUID_LEN;
    if buf.len() < offset + 1 {
        return ParseResult::Incomplete(offset + 1);
    }
    let mut uuid = [0u8; UUID_LEN];
    uuid.copy_from_slice(&buf[1..offset]);
    let addons_len = buf[offset] as usize;
    offset += 1 + addons_len;

    if buf.len() < offset + 1 {
        return ParseResult::Incomplete(offset + 1);
    }
    let command = buf[offset];
    offset += 1;

    let address = match command {
        CMD_MUX => None,
        CMD_TCP | CMD_UDP => {
            if buf.len() < offset + 3 {
                return ParseResult::Incomplete(offset + 3);
            }
            let port = read_u16(&buf[offset..offset + 2]);
            let atyp = buf[offset + 2];
            offset += 3;
            match parse_host(atyp, &buf[offset..]) {
                ParseResult::Complete((host, len)) => {
                    offset += len;
                    Some(AddressRef { host, port })
                }
                ParseResult::Incomplete(n) => return ParseResult::Incomplete(offset + n),
                ParseResult::Invalid(e) => return ParseResult::Invalid(e),
            }
        }
        _ => return ParseResult::Invalid(ParseError::InvalidCommand),
    };

    ParseResult::Complete(VlessRequest {
        credential: Credential(uuid),
        command,
        address,
        header_len: offset,
        payload: &buf[offset..],
    })
}

/// Writes the server response header (no addons).
pub fn write_response_header(buf: &mut BytesMut) {
    buf.extend_from_slice(&[VERSION, 0x00]);
}

/// Parses the response header, returning its total length.
pub fn parse_response_header(buf: &[u8]) -> ParseResult<usize> {
    if buf.len() < 2 {
        return ParseResult::Incomplete(2);
    }
    if buf[0] != VERSION {
        return ParseResult::Invalid(ParseError::InvalidVersion(buf[0]));
    }
    let len = 2 + buf[1] as usize;
    if buf.len() < len {
        return ParseResult::Incomplete(len);
    }
    ParseResult::Complete(len)
}

/// Writes one length-prefixed UDP frame.
#[allow(clippy::cast_possible_truncation)]
pub fn write_udp_frame(buf: &mut BytesMut, payload: &[u8]) -> Result<(), WriteError> {
    if payload.len() > MAX_UDP_PAYLOAD {
        return Err(WriteError::PayloadTooLarge);
    }
    buf.reserve(UDP_LEN_PREFIX + payload.len());
    buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    buf.extend_from_slice(payload);
    Ok(())
}

#[inline]
pub fn parse_udp_frame(buf: &[u8]) -> ParseResult<UdpFrame<'_>> {
    if buf.len() < UDP_LEN_PREFIX {
        return ParseResult::Incomplete(UDP_LEN_PREFIX);
    }
    let frame_len = UDP_LEN_PREFIX + read_u16(&buf[..UDP_LEN_PREFIX]) as usize;
    if buf.len() < frame_len {
        return ParseResult::Incomplete(frame_len);
    }
    ParseResult::Complete(UdpFrame {
        payload: &buf[UDP_LEN_PREFIX..frame_len],
        frame_len,
    })
}

#[inline]
fn parse_host(atyp: u8, buf: &[u8]) -> ParseResult<(HostRef<'_>, usize)> {
    match atyp {
        ATYP_IPV4 => {
            if buf.len() < 4 {
                return ParseResult::Incomplete(4);
            }
            ParseResult::Complete((HostRef::Ipv4([buf[0], buf[1], buf[2], buf[3]]), 4))
        }
        ATYP_DOMAIN => {
            if buf.is_empty() {
                return ParseResult::Incomplete(1);
            }
            let len = buf[0] as usize;
            if len == 0 {
                return ParseResult::Invalid(ParseError::InvalidDomainLen);
            }
            if buf.len() < 1 + len {
                return ParseResult::Incomplete(1 + len);
            }
            let domain = &buf[1..1 + len];
            if std::str::from_utf8(domain).is_err() {
                return ParseResult::Invalid(ParseError::InvalidUtf8);
            }
            ParseResult::Complete((HostRef::Domain(domain), 1 + len))
        }
        ATYP_IPV6 => {
            if buf.len() < 16 {
                return ParseResult::Incomplete(16);
            }
            let mut ip = [0u8; 16];
            ip.copy_from_slice(&buf[..16]);
            ParseResult::Complete((HostRef::Ipv6(ip), 16))
        }
        _ => ParseResult::Invalid(ParseError::InvalidAtyp),
    }
}

/// Writes atyp and address. Caller must ensure domain length is 1..=255.
#[allow(clippy::cast_possible_truncation)]
fn write_address_unchecked(buf: &mut BytesMut, address: &AddressRef<'_>) {
    match address.host {
        HostRef::Ipv4(ip) => {
            buf.extend_from_slice(&[ATYP_IPV4]);
            buf.extend_from_slice(&ip);
        }
        HostRef::Ipv6(ip) => {
            buf.extend_from_slice(&[ATYP_IPV6]);
            buf.extend_from_slice(&ip);
        }
        HostRef::Domain(domain) => {
            debug_assert!(!domain.is_empty() && domain.len() <= MAX_DOMAIN_LEN);
            buf.extend_from_slice(&[ATYP_DOMAIN, domain.len() as u8]);
            buf.extend_from_slice(domain);
        }
    }
}

#[inline]
fn read_u16(buf: &[u8]) -> u16 {
    debug_assert!(buf.len() >= 2, "read_u16 requires at least 2 bytes");
    u16::from_be_bytes([buf[0], buf[1]])
}
