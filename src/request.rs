//! Single request executor: [`UrlRequest`].
//!
//! A `UrlRequest` holds a url, a [`Transport`] and a set of options. Each call
//! to [`UrlRequest::execute`] runs one full cycle on the transport:
//! open handle, set options, run the transfer, read back error state, close
//! the handle. The content and error state of the last cycle stay available
//! until the next one.
//!
//! Transfer failures are not errors: they show up as
//! [`Content::Failed`] together with a non-zero [`UrlRequest::errno`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use urlrequest::request::UrlRequest;
//! use urlrequest::transport::ReqwestTransport;
//!
//! # fn main() -> Result<(), urlrequest::RequestError> {
//! let mut request = UrlRequest::new(Some("https://example.com/"), Some(Arc::new(ReqwestTransport::new())));
//! if request.execute()?.errno() == 0 {
//!     let content = request.content().and_then(|c| c.as_text()).unwrap_or_default();
//!     println!("{content}");
//! }
//! # Ok(()) }
//! ```

mod options;

use std::fmt;
use std::sync::Arc;

use log::{debug, trace, warn};
use serde_json::Value;

use crate::config::RequestConfig;
use crate::errors::RequestError;
use crate::transport::{code, opt, Content, HandleGuard, OptionCode, OptionValue, Transport};

pub use options::OptionMap;

/// Error state captured from the handle right before it was closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferError {
    pub errno: i32,
    pub message: String,
}

pub struct UrlRequest {
    transport: Option<Arc<dyn Transport>>,
    url: Option<String>,
    options: OptionMap,
    config: RequestConfig,
    content: Option<Content>,
    last_error: Option<TransferError>,
}

impl fmt::Debug for UrlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlRequest")
            .field("transport", &self.transport.as_ref().map(|_| "Arc<dyn Transport>"))
            .field("url", &self.url)
            .field("options", &self.options)
            .field("content", &self.content)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl Default for UrlRequest {
    fn default() -> Self {
        Self::with_config(RequestConfig::default())
    }
}

impl UrlRequest {
    pub fn new(url: Option<&str>, transport: Option<Arc<dyn Transport>>) -> Self {
        let mut request = Self::default();
        request.set_transport(transport).set_url(url);
        request
    }

    /// Creates an empty request that falls back to `config`'s default options.
    pub fn with_config(config: RequestConfig) -> Self {
        Self {
            transport: None,
            url: None,
            options: OptionMap::new(),
            config,
            content: None,
            last_error: None,
        }
    }

    pub fn set_transport(&mut self, transport: Option<Arc<dyn Transport>>) -> &mut Self {
        self.transport = transport;
        self
    }

    /// The transport used by [`execute`](Self::execute).
    pub fn transport(&self) -> Result<&Arc<dyn Transport>, RequestError> {
        self.transport.as_ref().ok_or(RequestError::MissingTransport)
    }

    pub fn set_url(&mut self, url: Option<&str>) -> &mut Self {
        self.url = url.map(str::to_string);
        self
    }

    /// Sets the url from an untyped value. `null` clears the url, strings are
    /// stored, everything else is rejected.
    pub fn set_url_value(&mut self, url: &Value) -> Result<&mut Self, RequestError> {
        match url {
            Value::Null => Ok(self.set_url(None)),
            Value::String(url) => Ok(self.set_url(Some(url.as_str()))),
            other => Err(RequestError::InvalidArgument(format!(
                "url must be a string, got {other}"
            ))),
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Adds an option, replacing the value of an option with the same code.
    ///
    /// As soon as one option is present, the default options of the config
    /// are no longer applied. Add `RETURN_TRANSFER` explicitly if the body
    /// should still be returned as a value.
    pub fn add_option(&mut self, option: OptionCode, value: impl Into<OptionValue>) -> &mut Self {
        self.options.insert(option, value.into());
        self
    }

    pub fn remove_option(&mut self, option: OptionCode) -> &mut Self {
        self.options.remove(option);
        self
    }

    pub fn clear_options(&mut self) -> &mut Self {
        self.options.clear();
        self
    }

    pub fn options(&self) -> &OptionMap {
        &self.options
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// Runs one transfer and stores its content and error state.
    ///
    /// Fails only when no transport is set. Transfer failures are reported
    /// through [`content`](Self::content), [`error`](Self::error) and
    /// [`errno`](Self::errno).
    pub fn execute(&mut self) -> Result<&mut Self, RequestError> {
        let transport = Arc::clone(self.transport()?);
        debug!(
            "executing request for {:?} with {} option(s)",
            self.url,
            self.options.len()
        );

        let Some(guard) = HandleGuard::open(&*transport, self.url.as_deref()) else {
            warn!("transport could not open a handle for {:?}", self.url);
            self.content = Some(Content::Failed);
            self.last_error = Some(TransferError {
                errno: code::FAILED_INIT,
                message: transport.strerror(code::FAILED_INIT).unwrap_or_default(),
            });
            return Ok(self);
        };
        let handle = guard.id();

        let options: Vec<(OptionCode, &OptionValue)> = if self.options.is_empty() {
            self.config
                .default_options
                .iter()
                .map(|(option, value)| (*option, value))
                .collect()
        } else {
            self.options.iter().collect()
        };
        for (option, value) in options {
            trace!("setopt {} = {value}", opt::name(option).unwrap_or("<unknown>"));
            if !transport.setopt(handle, option, value) {
                warn!("transport rejected option {option} = {value}");
            }
        }

        let content = transport.exec(handle);
        let last_error = TransferError {
            message: transport.error(handle),
            errno: transport.errno(handle),
        };
        drop(guard);

        if last_error.errno != code::OK {
            debug!("transfer failed with {}: {}", last_error.errno, last_error.message);
        }
        self.content = Some(content);
        self.last_error = Some(last_error);
        Ok(self)
    }

    /// Content of the last transfer, `None` before the first `execute`.
    pub fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    /// Error message of the last transfer, `""` before the first `execute`.
    pub fn error(&self) -> &str {
        self.last_error.as_ref().map_or("", |e| e.message.as_str())
    }

    /// Error code of the last transfer, `0` before the first `execute`.
    pub fn errno(&self) -> i32 {
        self.last_error.as_ref().map_or(code::OK, |e| e.errno)
    }

    pub fn has_executed(&self) -> bool {
        self.content.is_some()
    }
}
