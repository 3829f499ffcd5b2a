//! Option codes and tagged option values.
//!
//! Option codes are the integer constants of the underlying transfer library.
//! The values below follow libcurl's numbering (`CURLOPTTYPE_LONG = 0`,
//! `CURLOPTTYPE_OBJECTPOINT = 10000`), with the two PHP-only codes
//! [`RETURN_TRANSFER`] and [`BINARY_TRANSFER`] kept at their historical values.
//!
//! Backends accept any code and report unknown ones through the `false`
//! sentinel of [`Transport::setopt`](crate::transport::Transport::setopt).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer option code as defined by the transfer library.
pub type OptionCode = i32;

pub const TIMEOUT: OptionCode = 13;
pub const VERBOSE: OptionCode = 41;
/// Include the response headers in the returned body.
pub const HEADER: OptionCode = 42;
/// Send a HEAD request.
pub const NOBODY: OptionCode = 44;
/// Treat HTTP status codes >= 400 as a transfer failure.
pub const FAIL_ON_ERROR: OptionCode = 45;
pub const POST: OptionCode = 47;
pub const FOLLOW_LOCATION: OptionCode = 52;
pub const SSL_VERIFY_PEER: OptionCode = 64;
pub const MAX_REDIRS: OptionCode = 68;
pub const CONNECT_TIMEOUT: OptionCode = 78;
pub const HTTP_GET: OptionCode = 80;
pub const SSL_VERIFY_HOST: OptionCode = 81;
pub const TIMEOUT_MS: OptionCode = 155;
pub const CONNECT_TIMEOUT_MS: OptionCode = 156;
pub const URL: OptionCode = 10002;
/// `user:password` for basic authentication.
pub const USER_PWD: OptionCode = 10005;
pub const POST_FIELDS: OptionCode = 10015;
pub const REFERER: OptionCode = 10016;
pub const USER_AGENT: OptionCode = 10018;
pub const COOKIE: OptionCode = 10022;
pub const CUSTOM_REQUEST: OptionCode = 10036;
/// `Accept-Encoding` value, empty string means "everything supported".
pub const ENCODING: OptionCode = 10102;
/// Return the body from `exec` instead of writing it to stdout.
pub const RETURN_TRANSFER: OptionCode = 19913;
/// Accepted for compatibility, has no effect.
pub const BINARY_TRANSFER: OptionCode = 19914;

/// Human readable name of a known option code.
pub fn name(code: OptionCode) -> Option<&'static str> {
    let name = match code {
        TIMEOUT => "TIMEOUT",
        VERBOSE => "VERBOSE",
        HEADER => "HEADER",
        NOBODY => "NOBODY",
        FAIL_ON_ERROR => "FAILONERROR",
        POST => "POST",
        FOLLOW_LOCATION => "FOLLOWLOCATION",
        SSL_VERIFY_PEER => "SSL_VERIFYPEER",
        MAX_REDIRS => "MAXREDIRS",
        CONNECT_TIMEOUT => "CONNECTTIMEOUT",
        HTTP_GET => "HTTPGET",
        SSL_VERIFY_HOST => "SSL_VERIFYHOST",
        TIMEOUT_MS => "TIMEOUT_MS",
        CONNECT_TIMEOUT_MS => "CONNECTTIMEOUT_MS",
        URL => "URL",
        USER_PWD => "USERPWD",
        POST_FIELDS => "POSTFIELDS",
        REFERER => "REFERER",
        USER_AGENT => "USERAGENT",
        COOKIE => "COOKIE",
        CUSTOM_REQUEST => "CUSTOMREQUEST",
        ENCODING => "ENCODING",
        RETURN_TRANSFER => "RETURNTRANSFER",
        BINARY_TRANSFER => "BINARYTRANSFER",
        _ => return None,
    };
    Some(name)
}

/// Value passed along with an option code.
///
/// Backends coerce loosely: `Int(1)` is accepted where a boolean is expected
/// and numeric strings are accepted where an integer is expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            OptionValue::Int(i) => Some(*i != 0),
            OptionValue::Str(s) => match s.trim() {
                "" | "0" => Some(false),
                "1" => Some(true),
                _ => None,
            },
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Bool(b) => Some(i64::from(*b)),
            OptionValue::Int(i) => Some(*i),
            OptionValue::Str(s) => s.trim().parse().ok(),
        }
    }

    /// Only string values are accepted, numbers are not stringified.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<i64> for OptionValue {
    fn from(i: i64) -> Self {
        OptionValue::Int(i)
    }
}

impl From<i32> for OptionValue {
    fn from(i: i32) -> Self {
        OptionValue::Int(i64::from(i))
    }
}

impl From<u32> for OptionValue {
    fn from(i: u32) -> Self {
        OptionValue::Int(i64::from(i))
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Str(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Str(s)
    }
}
