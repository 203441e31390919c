//! Recognized multiaddress protocol tags.

use std::borrow::Cow;
use std::net::{Ipv4Addr, Ipv6Addr};

use libp2p::multiaddr::Protocol;

use crate::ParseError;

/// A protocol tag accepted in bootstrap addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tag {
    Ip4,
    Ip6,
    Dns,
    Dns4,
    Dns6,
    Dnsaddr,
    Tcp,
    Udp,
    Ws,
    Wss,
    Quic,
    QuicV1,
    WebTransport,
    /// Terminal peer identity (`/p2p/<id>`, legacy `/ipfs/<id>`).
    P2p,
}

impl Tag {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "ip4" => Self::Ip4,
            "ip6" => Self::Ip6,
            "dns" => Self::Dns,
            "dns4" => Self::Dns4,
            "dns6" => Self::Dns6,
            "dnsaddr" => Self::Dnsaddr,
            "tcp" => Self::Tcp,
            "udp" => Self::Udp,
            "ws" => Self::Ws,
            "wss" => Self::Wss,
            "quic" => Self::Quic,
            "quic-v1" => Self::QuicV1,
            "webtransport" => Self::WebTransport,
            "p2p" | "ipfs" => Self::P2p,
            _ => return None,
        })
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Ip4 => "ip4",
            Self::Ip6 => "ip6",
            Self::Dns => "dns",
            Self::Dns4 => "dns4",
            Self::Dns6 => "dns6",
            Self::Dnsaddr => "dnsaddr",
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Ws => "ws",
            Self::Wss => "wss",
            Self::Quic => "quic",
            Self::QuicV1 => "quic-v1",
            Self::WebTransport => "webtransport",
            Self::P2p => "p2p",
        }
    }

    pub(crate) fn takes_value(self) -> bool {
        !matches!(
            self,
            Self::Ws | Self::Wss | Self::Quic | Self::QuicV1 | Self::WebTransport
        )
    }

    /// Build the transport protocol for this tag. Not valid for [`Tag::P2p`].
    pub(crate) fn protocol(self, value: Option<&str>) -> Result<Protocol<'static>, ParseError> {
        let value = match (self.takes_value(), value) {
            (true, Some(value)) => value,
            (true, None) => return Err(ParseError::MissingValue { tag: self.name() }),
            (false, _) => "",
        };
        let invalid = || ParseError::InvalidValue {
            tag: self.name(),
            value: value.to_owned(),
        };

        Ok(match self {
            Self::Ip4 => Protocol::Ip4(value.parse::<Ipv4Addr>().map_err(|_| invalid())?),
            Self::Ip6 => Protocol::Ip6(value.parse::<Ipv6Addr>().map_err(|_| invalid())?),
            Self::Dns => Protocol::Dns(Cow::Owned(hostname(value).ok_or_else(invalid)?)),
            Self::Dns4 => Protocol::Dns4(Cow::Owned(hostname(value).ok_or_else(invalid)?)),
            Self::Dns6 => Protocol::Dns6(Cow::Owned(hostname(value).ok_or_else(invalid)?)),
            Self::Dnsaddr => Protocol::Dnsaddr(Cow::Owned(hostname(value).ok_or_else(invalid)?)),
            Self::Tcp => Protocol::Tcp(value.parse::<u16>().map_err(|_| invalid())?),
            Self::Udp => Protocol::Udp(value.parse::<u16>().map_err(|_| invalid())?),
            Self::Ws => Protocol::Ws(Cow::Borrowed("/")),
            Self::Wss => Protocol::Wss(Cow::Borrowed("/")),
            Self::Quic => Protocol::Quic,
            Self::QuicV1 => Protocol::QuicV1,
            Self::WebTransport => Protocol::WebTransport,
            Self::P2p => return Err(invalid()),
        })
    }
}

fn hostname(value: &str) -> Option<String> {
    let valid = !value.is_empty()
        && value.len() <= 253
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'));
    valid.then(|| value.to_owned())
}
