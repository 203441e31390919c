//! Bootstrap peer addressing.
//!
//! - [`EndpointDescriptor`] - dialable transport path plus the expected remote identity
//! - [`PeerIdentity`] - canonical peer identity type
//! - [`ParseError`] - precise reasons a multiaddress string was rejected
//!
//! Bootstrap addresses look like
//! `/ip4/127.0.0.1/tcp/36075/ws/p2p/12D3KooWJ4Yp8CjrbuUyeLDsAgMfCb3GAYMoBvJCRp1axjHr9cf8`:
//! an ordered transport chain followed by exactly one terminal `/p2p/<id>` segment.

mod error;
mod identity;
mod tag;

pub use error::ParseError;
pub use identity::PeerIdentity;

use std::fmt;
use std::str::FromStr;

use libp2p::Multiaddr;
use libp2p::multiaddr::{self, Protocol};

use tag::Tag;

/// A validated bootstrap endpoint.
///
/// The transport chain is kept without the identity suffix, in the order the
/// segments appeared. Ordering matters for dialing: `/ip4/../tcp/../ws` is a
/// websocket over TCP, not the other way around.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointDescriptor {
    transport: Multiaddr,
    peer: PeerIdentity,
}

impl EndpointDescriptor {
    /// Parse a multiaddress string.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseError::EmptyAddress);
        }
        let rest = text
            .strip_prefix('/')
            .ok_or_else(|| ParseError::MissingLeadingSlash(text.to_owned()))?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        if rest.is_empty() {
            return Err(ParseError::EmptyAddress);
        }

        let mut parts = rest.split('/');
        let mut transport = Multiaddr::empty();
        let mut peer = None;

        while let Some(name) = parts.next() {
            if peer.is_some() {
                return Err(ParseError::MisplacedIdentity);
            }

            let tag = Tag::from_name(name).ok_or_else(|| ParseError::UnknownTag {
                tag: name.to_owned(),
            })?;
            let value = if tag.takes_value() {
                let value = parts
                    .next()
                    .filter(|value| !value.is_empty())
                    .ok_or(ParseError::MissingValue { tag: tag.name() })?;
                Some(value)
            } else {
                None
            };

            match (tag, value) {
                (Tag::P2p, Some(value)) => peer = Some(value.parse::<PeerIdentity>()?),
                (tag, value) => transport.push(tag.protocol(value)?),
            }
        }

        let peer = peer.ok_or(ParseError::MissingIdentity)?;
        Self::from_parts(transport, peer)
    }

    /// Build from an already-split transport chain and identity.
    pub fn from_parts(transport: Multiaddr, peer: PeerIdentity) -> Result<Self, ParseError> {
        if transport.is_empty() {
            return Err(ParseError::MissingTransport);
        }
        if transport.iter().any(|p| matches!(p, Protocol::P2p(_))) {
            return Err(ParseError::MisplacedIdentity);
        }
        Ok(Self { transport, peer })
    }

    /// Transport chain without the identity suffix.
    pub fn transport(&self) -> &Multiaddr {
        &self.transport
    }

    /// Transport segments in encounter order.
    pub fn segments(&self) -> multiaddr::Iter<'_> {
        self.transport.iter()
    }

    /// Expected identity of the remote peer.
    pub fn peer(&self) -> PeerIdentity {
        self.peer
    }

    /// Full multiaddress including the `/p2p/<id>` suffix.
    pub fn to_multiaddr(&self) -> Multiaddr {
        self.transport
            .clone()
            .with(Protocol::P2p(*self.peer.peer_id()))
    }

    /// Whether dialing requires DNS resolution first.
    pub fn is_dns(&self) -> bool {
        self.transport.iter().any(|p| {
            matches!(
                p,
                Protocol::Dns(_) | Protocol::Dns4(_) | Protocol::Dns6(_) | Protocol::Dnsaddr(_)
            )
        })
    }
}

impl fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/p2p/{}", self.transport, self.peer)
    }
}

impl FromStr for EndpointDescriptor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for EndpointDescriptor {
    type Error = ParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&Multiaddr> for EndpointDescriptor {
    type Error = ParseError;

    fn try_from(value: &Multiaddr) -> Result<Self, Self::Error> {
        Self::parse(&value.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for EndpointDescriptor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for EndpointDescriptor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use std::net::Ipv4Addr;

    const PEER: &str = "12D3KooWJ4Yp8CjrbuUyeLDsAgMfCb3GAYMoBvJCRp1axjHr9cf8";
    const BOOTNODE: &str =
        "/ip4/127.0.0.1/tcp/36075/ws/p2p/12D3KooWJ4Yp8CjrbuUyeLDsAgMfCb3GAYMoBvJCRp1axjHr9cf8";

    #[test]
    fn parses_websocket_bootnode() {
        let endpoint = EndpointDescriptor::parse(BOOTNODE).unwrap();

        let segments: Vec<_> = endpoint.segments().collect();
        assert_eq!(
            segments,
            vec![
                Protocol::Ip4(Ipv4Addr::LOCALHOST),
                Protocol::Tcp(36075),
                Protocol::Ws("/".into()),
            ]
        );
        assert_eq!(endpoint.peer().to_string(), PEER);
        assert_eq!(endpoint.to_string(), BOOTNODE);
        assert!(!endpoint.is_dns());
    }

    #[test]
    fn full_multiaddr_has_identity_suffix() {
        let endpoint: EndpointDescriptor = BOOTNODE.parse().unwrap();
        let full = endpoint.to_multiaddr();
        assert_eq!(full.to_string(), BOOTNODE);
        assert_eq!(EndpointDescriptor::try_from(&full).unwrap(), endpoint);
    }

    #[test]
    fn legacy_ipfs_tag() {
        let endpoint =
            EndpointDescriptor::parse(&format!("/dns4/boot.example.org/tcp/443/wss/ipfs/{PEER}"))
                .unwrap();
        assert!(endpoint.is_dns());
        assert_eq!(endpoint.to_string(), format!("/dns4/boot.example.org/tcp/443/wss/p2p/{PEER}"));
    }

    #[test]
    fn tolerates_trailing_slash() {
        let endpoint = EndpointDescriptor::parse(&format!("{BOOTNODE}/")).unwrap();
        assert_eq!(endpoint.to_string(), BOOTNODE);
    }

    #[test]
    fn same_identity_different_path() {
        let a = EndpointDescriptor::parse(&format!("/ip4/10.0.0.1/tcp/1/p2p/{PEER}")).unwrap();
        let b = EndpointDescriptor::parse(&format!("/ip6/::1/udp/1/quic-v1/p2p/{PEER}")).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.peer(), b.peer());
    }

    #[test]
    fn empty_address() {
        assert_eq!(EndpointDescriptor::parse(""), Err(ParseError::EmptyAddress));
        assert_eq!(EndpointDescriptor::parse("  "), Err(ParseError::EmptyAddress));
        assert_eq!(EndpointDescriptor::parse("/"), Err(ParseError::EmptyAddress));
    }

    #[test]
    fn missing_leading_slash() {
        assert_matches!(
            EndpointDescriptor::parse("ip4/127.0.0.1/tcp/1"),
            Err(ParseError::MissingLeadingSlash(_))
        );
    }

    #[test]
    fn unknown_tag() {
        assert_eq!(
            EndpointDescriptor::parse(&format!("/ip4/127.0.0.1/sctp/5/p2p/{PEER}")),
            Err(ParseError::UnknownTag { tag: "sctp".into() })
        );
    }

    #[test]
    fn missing_value() {
        assert_eq!(
            EndpointDescriptor::parse("/ip4/127.0.0.1/tcp"),
            Err(ParseError::MissingValue { tag: "tcp" })
        );
        assert_eq!(
            EndpointDescriptor::parse(&format!("/ip4//tcp/1/p2p/{PEER}")),
            Err(ParseError::MissingValue { tag: "ip4" })
        );
        assert_eq!(
            EndpointDescriptor::parse("/ip4/127.0.0.1/tcp/1/p2p"),
            Err(ParseError::MissingValue { tag: "p2p" })
        );
    }

    #[test]
    fn invalid_value() {
        assert_eq!(
            EndpointDescriptor::parse(&format!("/ip4/300.0.0.1/tcp/1/p2p/{PEER}")),
            Err(ParseError::InvalidValue {
                tag: "ip4",
                value: "300.0.0.1".into()
            })
        );
    }

    #[test]
    fn invalid_identity_encoding() {
        assert_eq!(
            EndpointDescriptor::parse("/ip4/127.0.0.1/tcp/1/p2p/not-a-peer"),
            Err(ParseError::InvalidIdentityEncoding {
                value: "not-a-peer".into()
            })
        );
    }

    #[test]
    fn missing_identity() {
        assert_eq!(
            EndpointDescriptor::parse("/ip4/127.0.0.1/tcp/1"),
            Err(ParseError::MissingIdentity)
        );
    }

    #[test]
    fn misplaced_identity() {
        assert_eq!(
            EndpointDescriptor::parse(&format!("/ip4/127.0.0.1/p2p/{PEER}/tcp/1")),
            Err(ParseError::MisplacedIdentity)
        );
        assert_eq!(
            EndpointDescriptor::parse(&format!("/ip4/127.0.0.1/tcp/1/p2p/{PEER}/p2p/{PEER}")),
            Err(ParseError::MisplacedIdentity)
        );
    }

    #[test]
    fn missing_transport() {
        assert_eq!(
            EndpointDescriptor::parse(&format!("/p2p/{PEER}")),
            Err(ParseError::MissingTransport)
        );
    }

    proptest! {
        #[test]
        fn display_reparses(ip in any::<[u8; 4]>(), port in any::<u16>(), ws in any::<bool>()) {
            let peer = PeerIdentity::random();
            let ip = Ipv4Addr::from(ip);
            let suffix = if ws { "/ws" } else { "" };
            let text = format!("/ip4/{ip}/tcp/{port}{suffix}/p2p/{peer}");

            let endpoint = EndpointDescriptor::parse(&text).unwrap();
            prop_assert_eq!(endpoint.to_string(), text.clone());
            prop_assert_eq!(EndpointDescriptor::parse(&endpoint.to_string()).unwrap(), endpoint.clone());
            prop_assert_eq!(endpoint.segments().count(), if ws { 3 } else { 2 });
        }

        #[test]
        fn parse_never_panics(text in "[/a-z0-9.:-]{0,64}") {
            let _ = EndpointDescriptor::parse(&text);
        }
    }
}
