//! Error types for multiaddress parsing.

/// Errors from [`EndpointDescriptor`](crate::EndpointDescriptor) parsing.
///
/// Every variant carries enough of the offending input to report which part of
/// which address was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty multiaddress")]
    EmptyAddress,
    #[error("multiaddress must start with '/': {0:?}")]
    MissingLeadingSlash(String),
    #[error("unknown protocol tag {tag:?}")]
    UnknownTag { tag: String },
    #[error("protocol tag {tag:?} requires a value")]
    MissingValue { tag: &'static str },
    #[error("invalid value {value:?} for protocol tag {tag:?}")]
    InvalidValue { tag: &'static str, value: String },
    #[error("invalid peer identity encoding {value:?}")]
    InvalidIdentityEncoding { value: String },
    #[error("multiaddress has no terminal peer identity")]
    MissingIdentity,
    #[error("peer identity must be the terminal segment")]
    MisplacedIdentity,
    #[error("multiaddress has no transport segments")]
    MissingTransport,
}
