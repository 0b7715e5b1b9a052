//! `fetch-retrier` wraps a single HTTP call in a bounded retry loop and
//! normalizes whatever comes back into one record shape.
//!
//! - [`Retrier::fetch`] runs the attempt loop
//! - [`Settings`] / [`RetrierOptions`] configure attempts, backoff and decoding
//! - [`NormalizedResponse`] is the only value ever returned to the caller

mod backoff;
mod decode;
mod error;
mod response;
mod retrier;
mod settings;
mod status;
mod transport;
mod xml;

pub use backoff::{backoff_delay, wait_for};
pub use error::{DecodeError, FetchError, RetrierError, TransportError, XmlParseError};
pub use response::{Blob, Body, NormalizedResponse};
pub use retrier::{create_retrier, Retrier};
pub use settings::{AttemptLog, Logger, RetrierOptions, RetryOn, Settings};
pub use status::{status_text, TRANSPORT_FAILURE_STATUS, UNKNOWN_STATUS_TEXT};
pub use transport::{RawResponse, ReqwestTransport, Request, Transport};
pub use xml::parse_xml;

pub type Result<T> = std::result::Result<T, RetrierError>;
