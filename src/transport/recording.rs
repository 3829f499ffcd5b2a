use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::transport::info::{InfoCode, InfoValue, TransferInfo};
use crate::transport::{code, escape_component, unescape_component};
use crate::transport::{Content, HandleId, OptionCode, OptionValue, Transport};

/// One call received by a [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Init(Option<String>),
    CopyHandle(HandleId),
    Setopt(HandleId, OptionCode, OptionValue),
    Exec(HandleId),
    Getinfo(HandleId, InfoCode),
    Error(HandleId),
    Errno(HandleId),
    Escape(HandleId, String),
    Unescape(HandleId, String),
    Reset(HandleId),
    Close(HandleId),
    Strerror(i32),
    Version,
}

#[derive(Debug)]
struct Script {
    fail_init: bool,
    panic_on_exec: bool,
    exec_result: Content,
    error: String,
    errno: i32,
    rejected: HashSet<OptionCode>,
    info: TransferInfo,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            fail_init: false,
            panic_on_exec: false,
            exec_result: Content::Done,
            error: String::new(),
            errno: code::OK,
            rejected: HashSet::new(),
            info: TransferInfo::default(),
        }
    }
}

/// Transport that performs no I/O. It replays scripted results and records
/// every call it receives, so callers can assert on the exact sequence.
///
/// ```rust
/// use urlrequest::transport::{Call, Content, RecordingTransport, Transport};
///
/// let transport = RecordingTransport::new().with_body("BODY");
/// let handle = transport.init(Some("http://example.test/")).unwrap();
/// assert_eq!(transport.exec(handle), Content::Body(b"BODY".to_vec()));
/// transport.close(handle);
///
/// assert_eq!(transport.calls().last(), Some(&Call::Close(handle)));
/// assert_eq!(transport.open_handles(), 0);
/// ```
#[derive(Debug, Default)]
pub struct RecordingTransport {
    script: Mutex<Script>,
    calls: Mutex<Vec<Call>>,
    handles: Mutex<HashSet<HandleId>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// `exec` returns `content`.
    pub fn with_exec_result(self, content: Content) -> Self {
        self.set_exec_result(content);
        self
    }

    /// `exec` returns `body` as [`Content::Body`].
    pub fn with_body(self, body: impl Into<Vec<u8>>) -> Self {
        self.with_exec_result(Content::Body(body.into()))
    }

    /// `error`/`errno` report `message`/`errno` for every handle.
    pub fn with_error(self, message: impl Into<String>, errno: i32) -> Self {
        self.set_error(message, errno);
        self
    }

    /// Changes the result of later `exec` calls.
    pub fn set_exec_result(&self, content: Content) {
        lock(&self.script).exec_result = content;
    }

    /// Changes what later `error`/`errno` calls report.
    pub fn set_error(&self, message: impl Into<String>, errno: i32) {
        let mut script = lock(&self.script);
        script.error = message.into();
        script.errno = errno;
    }

    /// `init` returns the failure sentinel.
    pub fn failing_init(self) -> Self {
        lock(&self.script).fail_init = true;
        self
    }

    /// `exec` panics. Used to check that callers release handles while unwinding.
    pub fn panicking_exec(self) -> Self {
        lock(&self.script).panic_on_exec = true;
        self
    }

    /// `setopt` returns `false` for `option`.
    pub fn rejecting_option(self, option: OptionCode) -> Self {
        lock(&self.script).rejected.insert(option);
        self
    }

    /// `getinfo` answers from `info`.
    pub fn with_info(self, info: TransferInfo) -> Self {
        lock(&self.script).info = info;
        self
    }

    /// All calls received so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    /// Only the `setopt` calls, as `(option, value)` pairs.
    pub fn setopt_calls(&self) -> Vec<(OptionCode, OptionValue)> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                Call::Setopt(_, option, value) => Some((*option, value.clone())),
                _ => None,
            })
            .collect()
    }

    /// Number of handles opened and not yet closed.
    pub fn open_handles(&self) -> usize {
        lock(&self.handles).len()
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }

    fn is_open(&self, handle: HandleId) -> bool {
        lock(&self.handles).contains(&handle)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Transport for RecordingTransport {
    fn init(&self, url: Option<&str>) -> Option<HandleId> {
        self.record(Call::Init(url.map(str::to_string)));
        if lock(&self.script).fail_init {
            return None;
        }

        let handle = HandleId::new();
        lock(&self.handles).insert(handle);
        Some(handle)
    }

    fn copy_handle(&self, handle: HandleId) -> Option<HandleId> {
        self.record(Call::CopyHandle(handle));
        if !self.is_open(handle) {
            return None;
        }

        let copy = HandleId::new();
        lock(&self.handles).insert(copy);
        Some(copy)
    }

    fn setopt(&self, handle: HandleId, option: OptionCode, value: &OptionValue) -> bool {
        self.record(Call::Setopt(handle, option, value.clone()));
        self.is_open(handle) && !lock(&self.script).rejected.contains(&option)
    }

    fn exec(&self, handle: HandleId) -> Content {
        self.record(Call::Exec(handle));
        if !self.is_open(handle) {
            return Content::Failed;
        }
        let script = lock(&self.script);
        if script.panic_on_exec {
            drop(script);
            panic!("scripted exec panic on handle {handle}");
        }
        script.exec_result.clone()
    }

    fn getinfo(&self, handle: HandleId, info: InfoCode) -> Option<InfoValue> {
        self.record(Call::Getinfo(handle, info));
        if !self.is_open(handle) {
            return None;
        }
        lock(&self.script).info.get(info)
    }

    fn error(&self, handle: HandleId) -> String {
        self.record(Call::Error(handle));
        lock(&self.script).error.clone()
    }

    fn errno(&self, handle: HandleId) -> i32 {
        self.record(Call::Errno(handle));
        lock(&self.script).errno
    }

    fn escape(&self, handle: HandleId, input: &str) -> Option<String> {
        self.record(Call::Escape(handle, input.to_string()));
        Some(escape_component(input))
    }

    fn unescape(&self, handle: HandleId, input: &str) -> Option<String> {
        self.record(Call::Unescape(handle, input.to_string()));
        unescape_component(input)
    }

    fn reset(&self, handle: HandleId) {
        self.record(Call::Reset(handle));
    }

    fn close(&self, handle: HandleId) {
        self.record(Call::Close(handle));
        lock(&self.handles).remove(&handle);
    }

    fn strerror(&self, code: i32) -> Option<String> {
        self.record(Call::Strerror(code));
        code::describe(code).map(str::to_string)
    }

    fn version(&self) -> String {
        self.record(Call::Version);
        "recording/0".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_handles_return_sentinels() {
        let transport = RecordingTransport::new().with_body("x");
        let handle = transport.init(None).unwrap();
        transport.close(handle);

        assert!(!transport.setopt(handle, 1, &OptionValue::Int(1)));
        assert_eq!(transport.exec(handle), Content::Failed);
        assert_eq!(transport.copy_handle(handle), None);
        assert_eq!(transport.open_handles(), 0);
    }

    #[test]
    fn rejected_options_stop_setopt_array() {
        let transport = RecordingTransport::new().rejecting_option(2);
        let handle = transport.init(None).unwrap();

        let options = vec![
            (1, OptionValue::Int(1)),
            (2, OptionValue::Int(2)),
            (3, OptionValue::Int(3)),
        ];
        assert!(!transport.setopt_array(handle, &options));

        let codes: Vec<OptionCode> = transport.setopt_calls().into_iter().map(|(c, _)| c).collect();
        assert_eq!(codes, vec![1, 2]);
    }

    #[test]
    fn failing_init_records_the_attempt() {
        let transport = RecordingTransport::new().failing_init();
        assert_eq!(transport.init(Some("http://example.test/")), None);
        assert_eq!(
            transport.calls(),
            vec![Call::Init(Some("http://example.test/".to_string()))]
        );
    }

    #[test]
    fn scripted_info_and_results_can_change() {
        let transport = RecordingTransport::new().with_info(TransferInfo {
            response_code: 301,
            effective_url: Some("http://example.test/moved".into()),
            ..Default::default()
        });
        let handle = transport.init(None).unwrap();

        assert_eq!(
            transport.getinfo(handle, crate::transport::info::RESPONSE_CODE),
            Some(InfoValue::Int(301))
        );
        assert_eq!(
            transport.getinfo(handle, crate::transport::info::EFFECTIVE_URL),
            Some(InfoValue::Str("http://example.test/moved".into()))
        );
        assert_eq!(transport.exec(handle), Content::Done);

        transport.set_exec_result(Content::Failed);
        transport.set_error("Couldn't connect to server", code::COULDNT_CONNECT);
        assert_eq!(transport.exec(handle), Content::Failed);
        assert_eq!(transport.errno(handle), code::COULDNT_CONNECT);
        assert_eq!(transport.error(handle), "Couldn't connect to server");
    }
}
