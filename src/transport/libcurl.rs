//! Transport backed by libcurl through the `curl` crate.
//!
//! Every handle owns one [`Easy`] session. Option codes are forwarded to the
//! matching typed setter of [`Easy`]; codes without a setter are rejected.
//! Transfers run while the handle table is locked, so transfers on one
//! `CurlTransport` are serialised.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use curl::easy::Easy;
use log::{debug, trace};

use crate::transport::info::{self, InfoCode, InfoValue};
use crate::transport::{code, opt};
use crate::transport::{Content, HandleId, OptionCode, OptionValue, Transport};

struct EasyHandle {
    easy: Easy,
    url: Option<String>,
    /// Options in the order they were set, replayed by `copy_handle`.
    options: Vec<(OptionCode, OptionValue)>,
    return_transfer: bool,
    last_error: Option<curl::Error>,
}

impl EasyHandle {
    fn open(url: Option<&str>) -> Result<Self, curl::Error> {
        let mut easy = Easy::new();
        if let Some(url) = url {
            easy.url(url)?;
        }
        Ok(Self {
            easy,
            url: url.map(str::to_string),
            options: Vec::new(),
            return_transfer: false,
            last_error: None,
        })
    }

    fn setopt(&mut self, option: OptionCode, value: &OptionValue) -> bool {
        let result = match option {
            opt::RETURN_TRANSFER => value.as_bool().map(|b| {
                self.return_transfer = b;
                Ok(())
            }),
            opt::BINARY_TRANSFER => value.as_bool().map(|_| Ok(())),
            opt::URL => value.as_str().map(|url| {
                self.url = Some(url.to_string());
                self.easy.url(url)
            }),
            _ => apply(&mut self.easy, option, value),
        };

        match result {
            Some(Ok(())) => {
                self.options.push((option, value.clone()));
                true
            }
            Some(Err(e)) => {
                debug!("libcurl rejected option {option}: {e}");
                false
            }
            None => false,
        }
    }

    fn perform(&mut self) -> Content {
        let mut body = Vec::new();
        let return_transfer = self.return_transfer;
        let result = {
            let mut transfer = self.easy.transfer();
            let registered = transfer.write_function(|data| {
                if return_transfer {
                    body.extend_from_slice(data);
                    return Ok(data.len());
                }
                // A short write makes libcurl fail with WRITE_ERROR.
                match std::io::stdout().write_all(data) {
                    Ok(()) => Ok(data.len()),
                    Err(_) => Ok(0),
                }
            });
            registered.and_then(|_| transfer.perform())
        };

        match result {
            Ok(()) => {
                self.last_error = None;
                trace!("libcurl transfer finished, {} bytes kept", body.len());
                if return_transfer {
                    Content::Body(body)
                } else {
                    Content::Done
                }
            }
            Err(e) => {
                debug!("libcurl transfer failed: {e}");
                self.last_error = Some(e);
                Content::Failed
            }
        }
    }

    fn info(&mut self, code: InfoCode) -> Option<InfoValue> {
        let easy = &mut self.easy;
        match code {
            info::EFFECTIVE_URL => easy.effective_url().ok().flatten().map(|s| InfoValue::Str(s.to_string())),
            info::CONTENT_TYPE => easy.content_type().ok().flatten().map(|s| InfoValue::Str(s.to_string())),
            info::RESPONSE_CODE => easy.response_code().ok().map(|c| InfoValue::Int(i64::from(c))),
            info::HEADER_SIZE => easy.header_size().ok().map(|s| InfoValue::Int(s as i64)),
            info::TOTAL_TIME => easy.total_time().ok().map(|d| InfoValue::Float(d.as_secs_f64())),
            info::SIZE_DOWNLOAD => easy.download_size().ok().map(InfoValue::Float),
            _ => None,
        }
    }
}

/// Forwards one option to the typed setter of `easy`. `None` when the code
/// has no setter or the value has the wrong type.
fn apply(easy: &mut Easy, option: OptionCode, value: &OptionValue) -> Option<Result<(), curl::Error>> {
    let secs = |v: &OptionValue| v.as_int().filter(|n| *n >= 0).map(|n| Duration::from_secs(n as u64));
    let millis = |v: &OptionValue| v.as_int().filter(|n| *n >= 0).map(|n| Duration::from_millis(n as u64));

    let result = match option {
        opt::TIMEOUT => easy.timeout(secs(value)?),
        opt::TIMEOUT_MS => easy.timeout(millis(value)?),
        opt::CONNECT_TIMEOUT => easy.connect_timeout(secs(value)?),
        opt::CONNECT_TIMEOUT_MS => easy.connect_timeout(millis(value)?),
        opt::VERBOSE => easy.verbose(value.as_bool()?),
        opt::HEADER => easy.show_header(value.as_bool()?),
        opt::NOBODY => easy.nobody(value.as_bool()?),
        opt::FAIL_ON_ERROR => easy.fail_on_error(value.as_bool()?),
        opt::POST => easy.post(value.as_bool()?),
        opt::HTTP_GET => easy.get(value.as_bool()?),
        opt::FOLLOW_LOCATION => easy.follow_location(value.as_bool()?),
        opt::SSL_VERIFY_PEER => easy.ssl_verify_peer(value.as_bool()?),
        opt::SSL_VERIFY_HOST => easy.ssl_verify_host(value.as_bool()?),
        opt::MAX_REDIRS => easy.max_redirections(u32::try_from(value.as_int()?).ok()?),
        opt::USER_PWD => {
            let user_pwd = value.as_str()?;
            let (user, password) = user_pwd.split_once(':').unwrap_or((user_pwd, ""));
            easy.username(user).and_then(|_| easy.password(password))
        }
        opt::POST_FIELDS => easy.post_fields_copy(value.as_str()?.as_bytes()),
        opt::REFERER => easy.referer(value.as_str()?),
        opt::USER_AGENT => easy.useragent(value.as_str()?),
        opt::COOKIE => easy.cookie(value.as_str()?),
        opt::CUSTOM_REQUEST => easy.custom_request(value.as_str()?),
        opt::ENCODING => easy.accept_encoding(value.as_str()?),
        _ => return None,
    };
    Some(result)
}

/// [`Transport`] implementation on top of libcurl's easy interface.
#[derive(Default)]
pub struct CurlTransport {
    handles: Mutex<HashMap<HandleId, EasyHandle>>,
}

impl std::fmt::Debug for CurlTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurlTransport")
            .field("handles", &self.handles().len())
            .finish()
    }
}

impl CurlTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<HandleId, EasyHandle>> {
        self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_handle<R>(&self, handle: HandleId, f: impl FnOnce(&mut EasyHandle) -> R) -> Option<R> {
        self.handles().get_mut(&handle).map(f)
    }

    fn insert(&self, easy: EasyHandle) -> HandleId {
        let id = HandleId::new();
        self.handles().insert(id, easy);
        id
    }
}

impl Transport for CurlTransport {
    fn init(&self, url: Option<&str>) -> Option<HandleId> {
        match EasyHandle::open(url) {
            Ok(easy) => Some(self.insert(easy)),
            Err(e) => {
                debug!("libcurl init failed: {e}");
                None
            }
        }
    }

    fn copy_handle(&self, handle: HandleId) -> Option<HandleId> {
        let (url, options) = self.with_handle(handle, |h| (h.url.clone(), h.options.clone()))?;
        let mut copy = EasyHandle::open(url.as_deref()).ok()?;
        for (option, value) in &options {
            copy.setopt(*option, value);
        }
        Some(self.insert(copy))
    }

    fn setopt(&self, handle: HandleId, option: OptionCode, value: &OptionValue) -> bool {
        self.with_handle(handle, |h| h.setopt(option, value)).unwrap_or(false)
    }

    fn exec(&self, handle: HandleId) -> Content {
        self.with_handle(handle, EasyHandle::perform).unwrap_or(Content::Failed)
    }

    fn getinfo(&self, handle: HandleId, info: InfoCode) -> Option<InfoValue> {
        self.with_handle(handle, |h| h.info(info)).flatten()
    }

    fn error(&self, handle: HandleId) -> String {
        self.with_handle(handle, |h| {
            h.last_error
                .as_ref()
                .map(|e| e.extra_description().unwrap_or(e.description()).to_string())
        })
        .flatten()
        .unwrap_or_default()
    }

    fn errno(&self, handle: HandleId) -> i32 {
        self.with_handle(handle, |h| h.last_error.as_ref().map(|e| e.code() as i32))
            .flatten()
            .unwrap_or(code::OK)
    }

    fn escape(&self, handle: HandleId, input: &str) -> Option<String> {
        self.with_handle(handle, |h| h.easy.url_encode(input.as_bytes()))
    }

    fn unescape(&self, handle: HandleId, input: &str) -> Option<String> {
        self.with_handle(handle, |h| String::from_utf8(h.easy.url_decode(input)).ok())
            .flatten()
    }

    fn reset(&self, handle: HandleId) {
        self.with_handle(handle, |h| {
            h.easy.reset();
            h.url = None;
            h.options.clear();
            h.return_transfer = false;
            h.last_error = None;
        });
    }

    fn close(&self, handle: HandleId) {
        self.handles().remove(&handle);
    }

    fn strerror(&self, code: i32) -> Option<String> {
        let description = curl::Error::new(code as _).description().to_string();
        if description.starts_with("Unknown error") {
            return None;
        }
        Some(description)
    }

    fn version(&self) -> String {
        format!("libcurl/{}", curl::Version::get().version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn unknown_options_are_rejected() {
        let transport = CurlTransport::new();
        let handle = transport.init(Some("http://example.test/")).unwrap();

        assert!(!transport.setopt(handle, 99_999, &OptionValue::Int(1)));
        assert!(!transport.setopt(handle, opt::USER_AGENT, &OptionValue::Int(1)));
        assert!(transport.setopt(handle, opt::USER_AGENT, &"urlrequest".into()));
        assert!(transport.setopt(handle, opt::RETURN_TRANSFER, &OptionValue::Int(1)));
    }

    #[test]
    fn refused_connection_sets_errno() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let transport = CurlTransport::new();
        let handle = transport.init(Some(url.as_str())).unwrap();
        transport.setopt(handle, opt::RETURN_TRANSFER, &true.into());

        assert_eq!(transport.exec(handle), Content::Failed);
        assert_eq!(transport.errno(handle), code::COULDNT_CONNECT);
        assert!(!transport.error(handle).is_empty());

        transport.close(handle);
        assert_eq!(transport.errno(handle), code::OK);
    }

    #[test]
    fn escape_and_strerror() {
        let transport = CurlTransport::new();
        let handle = transport.init(None).unwrap();

        assert_eq!(transport.escape(handle, "a b").as_deref(), Some("a%20b"));
        assert_eq!(transport.unescape(handle, "a%20b").as_deref(), Some("a b"));
        assert_eq!(transport.strerror(code::OPERATION_TIMEDOUT).as_deref(), Some("Timeout was reached"));
        assert!(transport.version().starts_with("libcurl/"));
    }
}
