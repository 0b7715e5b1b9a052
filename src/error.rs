/// Error type returned by this crate.
///
/// Only configuration problems escape [`crate::Retrier::fetch`]; every
/// per-attempt outcome is folded into the returned record.
#[derive(Debug, thiserror::Error)]
pub enum RetrierError {
    /// A settings value failed validation while merging overrides.
    #[error("invalid configuration: {field} {constraint}")]
    InvalidConfiguration {
        /// Name of the offending option.
        field: &'static str,
        /// Constraint the value violated.
        constraint: &'static str,
    },
}

/// Failure raised by a [`crate::Transport`] before any response exists.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
    /// Failure reported by a custom transport.
    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Structured failure while parsing an XML body.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("xml parse error at byte {position}: {message}")]
pub struct XmlParseError {
    pub message: String,
    pub position: usize,
}

/// A declared content type's decoder rejected the body.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid json body: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Xml(#[from] XmlParseError),
}

/// Failure of a single attempt, stored as the record body.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}
