//! Transfer facade: the [`Transport`] trait and its backends.
//!
//! A **transport** exposes the primitives of an HTTP transfer library one to
//! one: open a handle, configure it, run the transfer, read back error state
//! and close it again. It adds no behavior of its own: failures are reported
//! through sentinel return values (`None`, `false`, [`Content::Failed`]) and
//! the `error`/`errno` pair, never through `Err` or panics.
//!
//! This module exports three implementations:
//! - [`ReqwestTransport`]: backed by `reqwest`'s blocking client (default).
//! - `CurlTransport`: backed by libcurl through the `curl` crate
//!   (feature `libcurl`).
//! - [`RecordingTransport`]: a scripted double that records every call.
//!
//! Handles are plain [`HandleId`] values. Callers that want the handle to be
//! closed on every exit path should hold it through a [`HandleGuard`].
//!
//! ## Example
//! ```rust,no_run
//! use urlrequest::transport::{opt, ReqwestTransport, Transport};
//!
//! let transport = ReqwestTransport::new();
//! let handle = transport.init(Some("https://example.com/")).unwrap();
//! transport.setopt(handle, opt::RETURN_TRANSFER, &true.into());
//! let content = transport.exec(handle);
//! if transport.errno(handle) == 0 {
//!     println!("{}", content.as_text().unwrap_or_default());
//! }
//! transport.close(handle);
//! ```

pub mod code;
mod handle;
pub mod info;
pub mod opt;
mod blocking;
mod recording;

#[cfg(feature = "libcurl")]
mod libcurl;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

pub use handle::{HandleGuard, HandleId};
pub use info::{InfoCode, InfoValue, TransferInfo};
pub use opt::{OptionCode, OptionValue};
pub use recording::{Call, RecordingTransport};
pub use blocking::ReqwestTransport;

#[cfg(feature = "libcurl")]
pub use libcurl::CurlTransport;

/// Result of [`Transport::exec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// The transfer succeeded and the body was returned as a value.
    Body(Vec<u8>),
    /// The transfer succeeded and the body was written out directly.
    Done,
    /// Failure sentinel. Details are available through `error`/`errno`.
    Failed,
}

impl Content {
    pub fn is_failed(&self) -> bool {
        matches!(self, Content::Failed)
    }

    pub fn body(&self) -> Option<&[u8]> {
        match self {
            Content::Body(body) => Some(body),
            _ => None,
        }
    }

    /// The body as UTF-8 text, `None` if there is no body or it is not valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        self.body().and_then(|b| std::str::from_utf8(b).ok())
    }
}

/// Primitive operations of an HTTP transfer library.
///
/// Every method mirrors one primitive of the library. Implementations must be
/// `Send + Sync` and manage their own handle tables; methods take `&self`.
/// Calls with a handle that is unknown (never opened, or already closed)
/// return the failure sentinel of that method.
pub trait Transport: Send + Sync {
    /// Opens a new handle, optionally preset with `url`. `None` on failure.
    fn init(&self, url: Option<&str>) -> Option<HandleId>;

    /// Opens a new handle carrying the url and options of `handle`.
    fn copy_handle(&self, handle: HandleId) -> Option<HandleId>;

    /// Sets one option. `false` if the code is unknown or the value has the
    /// wrong type.
    fn setopt(&self, handle: HandleId, option: OptionCode, value: &OptionValue) -> bool;

    /// Sets options in order and stops at the first one that fails.
    fn setopt_array(&self, handle: HandleId, options: &[(OptionCode, OptionValue)]) -> bool {
        options
            .iter()
            .all(|(option, value)| self.setopt(handle, *option, value))
    }

    /// Runs the transfer and blocks until it finished or failed.
    fn exec(&self, handle: HandleId) -> Content;

    /// Information about the last transfer on `handle`.
    fn getinfo(&self, handle: HandleId, info: InfoCode) -> Option<InfoValue>;

    /// Message of the last error on `handle`, or `""`.
    fn error(&self, handle: HandleId) -> String;

    /// Code of the last error on `handle`, or `0`.
    fn errno(&self, handle: HandleId) -> i32;

    /// URL-encodes `input`.
    fn escape(&self, handle: HandleId, input: &str) -> Option<String>;

    /// Decodes a URL-encoded string. `None` if the result is not UTF-8.
    fn unescape(&self, handle: HandleId, input: &str) -> Option<String>;

    /// Resets every option of `handle`, including the url, to its default.
    fn reset(&self, handle: HandleId);

    /// Closes `handle`. Closing an unknown handle does nothing.
    fn close(&self, handle: HandleId);

    /// Describes an error code, `None` for unknown codes.
    fn strerror(&self, code: i32) -> Option<String>;

    /// Version string of the backend.
    fn version(&self) -> String;
}

/// Everything except the RFC 3986 unreserved characters.
const ESCAPE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub(crate) fn escape_component(input: &str) -> String {
    utf8_percent_encode(input, ESCAPE_SET).to_string()
}

pub(crate) fn unescape_component(input: &str) -> Option<String> {
    percent_decode_str(input)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}
