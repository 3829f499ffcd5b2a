//! Transport backed by `reqwest`'s blocking client.
//!
//! A handle only records the url and the option settings. Every `exec`
//! builds a fresh client and request from them, so handles never share
//! connections. Transfer errors are mapped onto libcurl-compatible codes
//! from [`code`](crate::transport::code).

use std::collections::HashMap;
use std::error::Error as StdError;
use std::io::{self, ErrorKind, Write};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use http::{header, HeaderMap, Method, StatusCode, Version};
use log::{debug, log, trace, Level};
use reqwest::blocking::{Client, Response};
use reqwest::redirect::Policy;
use url::Url;

use crate::transport::info::{InfoCode, InfoValue, TransferInfo};
use crate::transport::{code, escape_component, opt, unescape_component};
use crate::transport::{Content, HandleId, OptionCode, OptionValue, Transport};

/// Redirect limit when `FOLLOW_LOCATION` is on and `MAX_REDIRS` is not set.
const DEFAULT_MAX_REDIRS: usize = 30;

/// Option state of one handle.
#[derive(Debug, Clone)]
struct Settings {
    return_transfer: bool,
    header: bool,
    nobody: bool,
    post: bool,
    fail_on_error: bool,
    follow_location: bool,
    max_redirs: Option<usize>,
    verify_peer: bool,
    verify_host: bool,
    verbose: bool,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    referer: Option<String>,
    cookie: Option<String>,
    custom_request: Option<String>,
    post_fields: Option<String>,
    user_pwd: Option<String>,
    encoding: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            return_transfer: false,
            header: false,
            nobody: false,
            post: false,
            fail_on_error: false,
            follow_location: false,
            max_redirs: None,
            verify_peer: true,
            verify_host: true,
            verbose: false,
            timeout: None,
            connect_timeout: None,
            user_agent: None,
            referer: None,
            cookie: None,
            custom_request: None,
            post_fields: None,
            user_pwd: None,
            encoding: None,
        }
    }
}

impl Settings {
    /// Applies one option. Returns `false` for unknown codes and values of
    /// the wrong type, leaving the settings untouched.
    fn apply(&mut self, url: &mut Option<String>, option: OptionCode, value: &OptionValue) -> bool {
        match option {
            opt::RETURN_TRANSFER => flag(&mut self.return_transfer, value),
            opt::BINARY_TRANSFER => value.as_bool().is_some(),
            opt::HEADER => flag(&mut self.header, value),
            opt::NOBODY => flag(&mut self.nobody, value),
            opt::POST => flag(&mut self.post, value),
            opt::HTTP_GET => match value.as_bool() {
                Some(true) => {
                    self.post = false;
                    self.nobody = false;
                    true
                }
                Some(false) => true,
                None => false,
            },
            opt::FAIL_ON_ERROR => flag(&mut self.fail_on_error, value),
            opt::FOLLOW_LOCATION => flag(&mut self.follow_location, value),
            opt::VERBOSE => flag(&mut self.verbose, value),
            opt::SSL_VERIFY_PEER => flag(&mut self.verify_peer, value),
            opt::SSL_VERIFY_HOST => flag(&mut self.verify_host, value),
            opt::MAX_REDIRS => match value.as_int() {
                Some(n) if n < 0 => {
                    self.max_redirs = None;
                    true
                }
                Some(n) => {
                    self.max_redirs = Some(n as usize);
                    true
                }
                None => false,
            },
            opt::TIMEOUT => duration(&mut self.timeout, value, Duration::from_secs),
            opt::TIMEOUT_MS => duration(&mut self.timeout, value, Duration::from_millis),
            opt::CONNECT_TIMEOUT => duration(&mut self.connect_timeout, value, Duration::from_secs),
            opt::CONNECT_TIMEOUT_MS => duration(&mut self.connect_timeout, value, Duration::from_millis),
            opt::URL => text(url, value),
            opt::USER_AGENT => text(&mut self.user_agent, value),
            opt::REFERER => text(&mut self.referer, value),
            opt::COOKIE => text(&mut self.cookie, value),
            opt::CUSTOM_REQUEST => text(&mut self.custom_request, value),
            opt::POST_FIELDS => {
                let applied = text(&mut self.post_fields, value);
                if applied {
                    self.post = true;
                }
                applied
            }
            opt::USER_PWD => text(&mut self.user_pwd, value),
            opt::ENCODING => text(&mut self.encoding, value),
            _ => false,
        }
    }

    fn method(&self) -> Result<Method, (i32, String)> {
        if let Some(custom) = &self.custom_request {
            return Method::from_bytes(custom.as_bytes())
                .map_err(|_| (code::URL_MALFORMAT, format!("Invalid request method: {custom}")));
        }
        if self.nobody {
            Ok(Method::HEAD)
        } else if self.post {
            Ok(Method::POST)
        } else {
            Ok(Method::GET)
        }
    }

    fn client(&self) -> reqwest::Result<Client> {
        let redirect = if self.follow_location {
            Policy::limited(self.max_redirs.unwrap_or(DEFAULT_MAX_REDIRS))
        } else {
            Policy::none()
        };
        // rustls cannot skip hostname checks on their own
        let accept_invalid_certs = !(self.verify_peer && self.verify_host);
        let decompress = self.encoding.is_some();

        let mut builder = Client::builder()
            .redirect(redirect)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .gzip(decompress)
            .brotli(decompress)
            .deflate(decompress);
        if let Some(ua) = &self.user_agent {
            builder = builder.user_agent(ua.as_str());
        }
        builder.build()
    }
}

fn flag(slot: &mut bool, value: &OptionValue) -> bool {
    match value.as_bool() {
        Some(b) => {
            *slot = b;
            true
        }
        None => false,
    }
}

fn text(slot: &mut Option<String>, value: &OptionValue) -> bool {
    match value.as_str() {
        Some(s) => {
            *slot = Some(s.to_string());
            true
        }
        None => false,
    }
}

/// `0` clears the timeout, negative values are rejected.
fn duration(slot: &mut Option<Duration>, value: &OptionValue, unit: fn(u64) -> Duration) -> bool {
    match value.as_int() {
        Some(0) => {
            *slot = None;
            true
        }
        Some(n) if n > 0 => {
            *slot = Some(unit(n as u64));
            true
        }
        _ => false,
    }
}

#[derive(Debug, Clone, Default)]
struct PendingTransfer {
    url: Option<String>,
    settings: Settings,
    last_error: Option<(i32, String)>,
    info: TransferInfo,
}

/// Result of one run, stored back into the handle afterwards.
struct Outcome {
    content: Content,
    error: Option<(i32, String)>,
    info: TransferInfo,
}

impl Outcome {
    fn failed(errno: i32, message: impl Into<String>, info: TransferInfo) -> Self {
        Self {
            content: Content::Failed,
            error: Some((errno, message.into())),
            info,
        }
    }
}

/// [`Transport`] implementation on top of `reqwest::blocking`.
///
/// Must not be used from inside an async runtime, as the blocking client
/// starts its own.
#[derive(Debug, Default)]
pub struct ReqwestTransport {
    handles: Mutex<HashMap<HandleId, PendingTransfer>>,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<HandleId, PendingTransfer>> {
        self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_handle<R>(&self, handle: HandleId, f: impl FnOnce(&mut PendingTransfer) -> R) -> Option<R> {
        self.handles().get_mut(&handle).map(f)
    }
}

impl Transport for ReqwestTransport {
    fn init(&self, url: Option<&str>) -> Option<HandleId> {
        let handle = HandleId::new();
        let transfer = PendingTransfer {
            url: url.map(str::to_string),
            ..Default::default()
        };
        self.handles().insert(handle, transfer);
        Some(handle)
    }

    fn copy_handle(&self, handle: HandleId) -> Option<HandleId> {
        let copy = self.with_handle(handle, |t| PendingTransfer {
            url: t.url.clone(),
            settings: t.settings.clone(),
            ..Default::default()
        })?;
        let id = HandleId::new();
        self.handles().insert(id, copy);
        Some(id)
    }

    fn setopt(&self, handle: HandleId, option: OptionCode, value: &OptionValue) -> bool {
        let applied = self
            .with_handle(handle, |t| t.settings.apply(&mut t.url, option, value))
            .unwrap_or(false);
        if !applied {
            debug!(
                "rejected option {} = {value} on handle {handle}",
                opt::name(option).unwrap_or("<unknown>")
            );
        }
        applied
    }

    fn exec(&self, handle: HandleId) -> Content {
        // Run without holding the table lock so other handles stay usable.
        let Some((url, settings)) = self.with_handle(handle, |t| (t.url.clone(), t.settings.clone())) else {
            return Content::Failed;
        };

        let outcome = perform(url.as_deref(), &settings);
        let content = outcome.content.clone();
        self.with_handle(handle, |t| {
            t.last_error = outcome.error;
            t.info = outcome.info;
        });
        content
    }

    fn getinfo(&self, handle: HandleId, info: InfoCode) -> Option<InfoValue> {
        self.with_handle(handle, |t| t.info.get(info)).flatten()
    }

    fn error(&self, handle: HandleId) -> String {
        self.with_handle(handle, |t| t.last_error.as_ref().map(|(_, msg)| msg.clone()))
            .flatten()
            .unwrap_or_default()
    }

    fn errno(&self, handle: HandleId) -> i32 {
        self.with_handle(handle, |t| t.last_error.as_ref().map(|(errno, _)| *errno))
            .flatten()
            .unwrap_or(code::OK)
    }

    fn escape(&self, handle: HandleId, input: &str) -> Option<String> {
        self.with_handle(handle, |_| escape_component(input))
    }

    fn unescape(&self, handle: HandleId, input: &str) -> Option<String> {
        self.with_handle(handle, |_| unescape_component(input)).flatten()
    }

    fn reset(&self, handle: HandleId) {
        self.with_handle(handle, |t| *t = PendingTransfer::default());
    }

    fn close(&self, handle: HandleId) {
        self.handles().remove(&handle);
    }

    fn strerror(&self, code: i32) -> Option<String> {
        code::describe(code).map(str::to_string)
    }

    fn version(&self) -> String {
        format!("urlrequest/{} (reqwest)", env!("CARGO_PKG_VERSION"))
    }
}

fn perform(url: Option<&str>, settings: &Settings) -> Outcome {
    let started = Instant::now();
    let mut info = TransferInfo::default();
    let level = if settings.verbose { Level::Info } else { Level::Trace };

    let Some(url) = url else {
        return Outcome::failed(code::URL_MALFORMAT, "No URL set", info);
    };
    let url = match Url::parse(url) {
        Ok(url) => url,
        Err(e) => return Outcome::failed(code::URL_MALFORMAT, format!("URL rejected: {e}"), info),
    };
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Outcome::failed(
                code::UNSUPPORTED_PROTOCOL,
                format!("Protocol \"{other}\" not supported"),
                info,
            )
        }
    }

    let method = match settings.method() {
        Ok(method) => method,
        Err((errno, message)) => return Outcome::failed(errno, message, info),
    };
    let client = match settings.client() {
        Ok(client) => client,
        Err(e) => return Outcome::failed(code::FAILED_INIT, error_message(e), info),
    };

    log!(level, "> {method} {url}");
    let mut request = client.request(method, url);
    if let Some(referer) = &settings.referer {
        request = request.header(header::REFERER, referer);
    }
    if let Some(cookie) = &settings.cookie {
        request = request.header(header::COOKIE, cookie);
    }
    if let Some(encoding) = settings.encoding.as_deref().filter(|e| !e.is_empty()) {
        request = request.header(header::ACCEPT_ENCODING, encoding);
    }
    if let Some(user_pwd) = &settings.user_pwd {
        let (user, password) = match user_pwd.split_once(':') {
            Some((user, password)) => (user, Some(password)),
            None => (user_pwd.as_str(), None),
        };
        request = request.basic_auth(user, password);
    }
    if let Some(fields) = &settings.post_fields {
        request = request
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(fields.clone());
    }

    let response = match request.send() {
        Ok(response) => response,
        Err(e) => {
            info.total_time = started.elapsed().as_secs_f64();
            let (errno, message) = classify(e);
            return Outcome::failed(errno, message, info);
        }
    };

    let status = response.status();
    log!(level, "< {status}");
    info.response_code = status.as_u16();
    info.effective_url = Some(response.url().to_string());
    info.content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let head = header_block(response.version(), status, response.headers());
    info.header_size = head.len();

    if settings.fail_on_error && status.as_u16() >= 400 {
        info.total_time = started.elapsed().as_secs_f64();
        return Outcome::failed(
            code::HTTP_RETURNED_ERROR,
            format!("The requested URL returned error: {}", status.as_u16()),
            info,
        );
    }

    let body = match read_body(response) {
        Ok(body) => body,
        Err(e) => {
            info.total_time = started.elapsed().as_secs_f64();
            let (errno, message) = classify(e);
            return Outcome::failed(errno, message, info);
        }
    };
    info.size_download = body.len();
    info.total_time = started.elapsed().as_secs_f64();
    trace!("received {} body bytes", body.len());

    let mut output = Vec::with_capacity(head.len() + body.len());
    if settings.header {
        output.extend_from_slice(&head);
    }
    output.extend_from_slice(&body);

    if settings.return_transfer {
        return Outcome {
            content: Content::Body(output),
            error: None,
            info,
        };
    }

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout.write_all(&output).and_then(|_| stdout.flush()) {
        return Outcome::failed(code::WRITE_ERROR, format!("Failure writing output: {e}"), info);
    }
    Outcome {
        content: Content::Done,
        error: None,
        info,
    }
}

fn read_body(response: Response) -> reqwest::Result<Vec<u8>> {
    Ok(response.bytes()?.to_vec())
}

fn header_block(version: Version, status: StatusCode, headers: &HeaderMap) -> Vec<u8> {
    let mut block = format!("{version:?} {status}\r\n").into_bytes();
    for (name, value) in headers {
        block.extend_from_slice(name.as_str().as_bytes());
        block.extend_from_slice(b": ");
        block.extend_from_slice(value.as_bytes());
        block.extend_from_slice(b"\r\n");
    }
    block.extend_from_slice(b"\r\n");
    block
}

/// Maps a reqwest error onto a libcurl-compatible code and message.
fn classify(e: reqwest::Error) -> (i32, String) {
    let errno = if e.is_timeout() {
        code::OPERATION_TIMEDOUT
    } else if e.is_redirect() {
        code::TOO_MANY_REDIRECTS
    } else if e.is_connect() {
        connect_errno(&e)
    } else if e.is_builder() {
        code::URL_MALFORMAT
    } else {
        code::RECV_ERROR
    };
    (errno, error_message(e))
}

/// The error without its url, followed by all of its causes.
fn error_message(e: reqwest::Error) -> String {
    format!("{:#}", anyhow::Error::new(e.without_url()))
}

/// Connect errors do not carry a kind, so their causes are inspected. The
/// top-level error is skipped as its message contains the request url.
fn connect_errno(e: &reqwest::Error) -> i32 {
    let mut source = e.source();
    while let Some(cause) = source {
        if let Some(errno) = cause_errno(cause) {
            return errno;
        }
        source = cause.source();
    }
    code::COULDNT_CONNECT
}

fn cause_errno(cause: &(dyn StdError + 'static)) -> Option<i32> {
    if let Some(io) = cause.downcast_ref::<io::Error>() {
        match io.kind() {
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::AddrNotAvailable => return Some(code::COULDNT_CONNECT),
            ErrorKind::InvalidData => return Some(code::SSL_CONNECT_ERROR),
            _ => {}
        }
    }
    let message = cause.to_string().to_ascii_lowercase();
    if message.contains("dns error") || message.contains("failed to lookup address") {
        Some(code::COULDNT_RESOLVE_HOST)
    } else if message.contains("certificate") || message.contains("tls") || message.contains("ssl") {
        Some(code::SSL_CONNECT_ERROR)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use tokio::runtime::{Builder, Runtime};
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Mock HTTP server. The server runs on its own thread, so the blocking
    /// client is used outside of the runtime.
    struct Server {
        server: MockServer,
        runtime: Runtime,
    }

    impl Server {
        fn start() -> Self {
            let runtime = Builder::new_current_thread().enable_all().build().unwrap();
            let server = runtime.block_on(MockServer::start());
            Self { server, runtime }
        }

        fn mount(&self, mock: Mock) -> &Self {
            self.runtime.block_on(mock.mount(&self.server));
            self
        }

        fn url(&self, path: &str) -> String {
            format!("{}{path}", self.server.uri())
        }
    }

    fn ok_body(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_string(body)
    }

    /// A url nothing listens on.
    fn refused_url(path: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}{path}", listener.local_addr().unwrap());
        drop(listener);
        url
    }

    #[test]
    fn returns_body_as_value() {
        let server = Server::start();
        server.mount(Mock::given(method("GET")).and(path("/")).respond_with(ok_body("BODY")));
        let transport = ReqwestTransport::new();
        let handle = transport.init(Some(server.url("/").as_str())).unwrap();

        assert!(transport.setopt(handle, opt::RETURN_TRANSFER, &OptionValue::Int(1)));
        assert_eq!(transport.exec(handle), Content::Body(b"BODY".to_vec()));
        assert_eq!(transport.errno(handle), code::OK);
        assert_eq!(transport.error(handle), "");
        assert_eq!(
            transport.getinfo(handle, crate::transport::info::RESPONSE_CODE),
            Some(InfoValue::Int(200))
        );
        assert_eq!(
            transport.getinfo(handle, crate::transport::info::SIZE_DOWNLOAD),
            Some(InfoValue::Float(4.0))
        );
        match transport.getinfo(handle, crate::transport::info::CONTENT_TYPE) {
            Some(InfoValue::Str(content_type)) => assert!(content_type.starts_with("text/plain")),
            other => panic!("unexpected content type {other:?}"),
        }
        transport.close(handle);
    }

    #[test]
    fn header_option_prepends_status_line() {
        let server = Server::start();
        server.mount(Mock::given(method("GET")).respond_with(ok_body("BODY")));
        let transport = ReqwestTransport::new();
        let handle = transport.init(Some(server.url("/").as_str())).unwrap();
        transport.setopt(handle, opt::RETURN_TRANSFER, &true.into());
        transport.setopt(handle, opt::HEADER, &true.into());

        let content = transport.exec(handle);
        let text = content.as_text().unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\nBODY"));
    }

    #[test]
    fn fail_on_error_reports_http_status() {
        let server = Server::start();
        server.mount(Mock::given(path("/missing")).respond_with(ResponseTemplate::new(404).set_body_string("nope")));
        let transport = ReqwestTransport::new();
        let handle = transport.init(Some(server.url("/missing").as_str())).unwrap();
        transport.setopt_array(
            handle,
            &[
                (opt::RETURN_TRANSFER, true.into()),
                (opt::FAIL_ON_ERROR, true.into()),
            ],
        );

        assert_eq!(transport.exec(handle), Content::Failed);
        assert_eq!(transport.errno(handle), code::HTTP_RETURNED_ERROR);
        assert_eq!(transport.error(handle), "The requested URL returned error: 404");
    }

    #[test]
    fn error_status_without_fail_on_error_is_a_body() {
        let server = Server::start();
        server.mount(Mock::given(path("/missing")).respond_with(ResponseTemplate::new(404).set_body_string("nope")));
        let transport = ReqwestTransport::new();
        let handle = transport.init(Some(server.url("/missing").as_str())).unwrap();
        transport.setopt(handle, opt::RETURN_TRANSFER, &true.into());

        assert_eq!(transport.exec(handle), Content::Body(b"nope".to_vec()));
        assert_eq!(transport.errno(handle), code::OK);
    }

    #[test]
    fn request_options_reach_the_server() {
        let server = Server::start();
        server.mount(
            Mock::given(method("GET"))
                .and(path("/private"))
                .and(header("referer", "http://from.test/"))
                .and(header("cookie", "session=abc"))
                .and(header("user-agent", "urlrequest-test"))
                .and(header("authorization", "Basic dXNlcjpzZWNyZXQ="))
                .respond_with(ok_body("welcome")),
        );
        let transport = ReqwestTransport::new();
        let handle = transport.init(Some(server.url("/private").as_str())).unwrap();
        assert!(transport.setopt_array(
            handle,
            &[
                (opt::RETURN_TRANSFER, true.into()),
                (opt::REFERER, "http://from.test/".into()),
                (opt::COOKIE, "session=abc".into()),
                (opt::USER_AGENT, "urlrequest-test".into()),
                (opt::USER_PWD, "user:secret".into()),
            ],
        ));

        assert_eq!(transport.exec(handle), Content::Body(b"welcome".to_vec()));
    }

    #[test]
    fn post_fields_send_a_form_body() {
        let server = Server::start();
        server.mount(
            Mock::given(method("POST"))
                .and(path("/form"))
                .and(header("content-type", "application/x-www-form-urlencoded"))
                .and(body_string("a=1&b=two"))
                .respond_with(ResponseTemplate::new(201).set_body_string("created")),
        );
        let transport = ReqwestTransport::new();
        let handle = transport.init(Some(server.url("/form").as_str())).unwrap();
        transport.setopt(handle, opt::RETURN_TRANSFER, &true.into());
        transport.setopt(handle, opt::POST_FIELDS, &"a=1&b=two".into());

        assert_eq!(transport.exec(handle), Content::Body(b"created".to_vec()));
        assert_eq!(
            transport.getinfo(handle, crate::transport::info::RESPONSE_CODE),
            Some(InfoValue::Int(201))
        );
    }

    #[test]
    fn custom_request_and_nobody_select_the_method() {
        let server = Server::start();
        server
            .mount(Mock::given(method("PUT")).and(path("/item")).respond_with(ok_body("put")))
            .mount(Mock::given(method("HEAD")).and(path("/item")).respond_with(ResponseTemplate::new(204)));
        let transport = ReqwestTransport::new();

        let handle = transport.init(Some(server.url("/item").as_str())).unwrap();
        transport.setopt(handle, opt::RETURN_TRANSFER, &true.into());
        transport.setopt(handle, opt::CUSTOM_REQUEST, &"PUT".into());
        assert_eq!(transport.exec(handle), Content::Body(b"put".to_vec()));

        let handle = transport.init(Some(server.url("/item").as_str())).unwrap();
        transport.setopt(handle, opt::RETURN_TRANSFER, &true.into());
        transport.setopt(handle, opt::NOBODY, &true.into());
        assert_eq!(transport.exec(handle), Content::Body(Vec::new()));
        assert_eq!(
            transport.getinfo(handle, crate::transport::info::RESPONSE_CODE),
            Some(InfoValue::Int(204))
        );
    }

    #[test]
    fn refused_connection_is_couldnt_connect() {
        let transport = ReqwestTransport::new();
        let handle = transport.init(Some(refused_url("/").as_str())).unwrap();
        assert_eq!(transport.exec(handle), Content::Failed);
        assert_eq!(transport.errno(handle), code::COULDNT_CONNECT);
        assert!(!transport.error(handle).is_empty());
    }

    #[test]
    fn url_text_does_not_affect_the_error_code() {
        let transport = ReqwestTransport::new();
        for path in ["/tls-status", "/ssl/certificate", "/dns%20error"] {
            let handle = transport.init(Some(refused_url(path).as_str())).unwrap();
            assert_eq!(transport.exec(handle), Content::Failed);
            assert_eq!(transport.errno(handle), code::COULDNT_CONNECT, "path {path}");
            assert!(!transport.error(handle).contains(path));
        }
    }

    #[test]
    fn bad_urls_fail_before_any_io() {
        let transport = ReqwestTransport::new();

        let handle = transport.init(Some("not a url")).unwrap();
        assert_eq!(transport.exec(handle), Content::Failed);
        assert_eq!(transport.errno(handle), code::URL_MALFORMAT);

        let handle = transport.init(Some("ftp://example.test/")).unwrap();
        assert_eq!(transport.exec(handle), Content::Failed);
        assert_eq!(transport.errno(handle), code::UNSUPPORTED_PROTOCOL);

        let handle = transport.init(None).unwrap();
        assert_eq!(transport.exec(handle), Content::Failed);
        assert_eq!(transport.error(handle), "No URL set");
    }

    #[test]
    fn unknown_options_and_wrong_types_are_rejected() {
        let transport = ReqwestTransport::new();
        let handle = transport.init(None).unwrap();

        assert!(!transport.setopt(handle, 99_999, &OptionValue::Int(1)));
        assert!(!transport.setopt(handle, opt::USER_AGENT, &OptionValue::Int(1)));
        assert!(!transport.setopt(handle, opt::TIMEOUT, &OptionValue::Int(-5)));
        assert!(transport.setopt(handle, opt::CONNECT_TIMEOUT, &OptionValue::Int(0)));
        assert!(transport.setopt(handle, opt::BINARY_TRANSFER, &OptionValue::Int(1)));
    }

    #[test]
    fn copy_reset_and_close() {
        let transport = ReqwestTransport::new();
        let handle = transport.init(Some("ftp://example.test/")).unwrap();
        transport.setopt(handle, opt::RETURN_TRANSFER, &true.into());

        let copy = transport.copy_handle(handle).unwrap();
        assert_ne!(copy, handle);
        transport.exec(copy);
        assert_eq!(transport.errno(copy), code::UNSUPPORTED_PROTOCOL);

        transport.reset(handle);
        transport.exec(handle);
        assert_eq!(transport.errno(handle), code::URL_MALFORMAT);

        transport.close(handle);
        transport.close(handle);
        assert_eq!(transport.exec(handle), Content::Failed);
        assert_eq!(transport.errno(handle), code::OK);
        assert_eq!(transport.escape(handle, "a b"), None);
        assert_eq!(transport.escape(copy, "a b").as_deref(), Some("a%20b"));
        assert_eq!(transport.unescape(copy, "a%20b").as_deref(), Some("a b"));
    }

    #[test]
    fn strerror_and_cause_classification() {
        let transport = ReqwestTransport::new();
        assert_eq!(transport.strerror(code::OPERATION_TIMEDOUT).as_deref(), Some("Timeout was reached"));
        assert_eq!(transport.strerror(9999), None);
        assert!(transport.version().contains("reqwest"));

        let refused = io::Error::from(ErrorKind::ConnectionRefused);
        assert_eq!(cause_errno(&refused), Some(code::COULDNT_CONNECT));
        let lookup = io::Error::other("failed to lookup address information: Name or service not known");
        assert_eq!(cause_errno(&lookup), Some(code::COULDNT_RESOLVE_HOST));
        let tls = io::Error::new(ErrorKind::InvalidData, "invalid peer certificate: UnknownIssuer");
        assert_eq!(cause_errno(&tls), Some(code::SSL_CONNECT_ERROR));
        let other = io::Error::other("client error (Connect)");
        assert_eq!(cause_errno(&other), None);
    }
}
