//! Transfer error codes, numbered like libcurl's `CURLcode`.

pub const OK: i32 = 0;
pub const UNSUPPORTED_PROTOCOL: i32 = 1;
pub const FAILED_INIT: i32 = 2;
pub const URL_MALFORMAT: i32 = 3;
pub const COULDNT_RESOLVE_HOST: i32 = 6;
pub const COULDNT_CONNECT: i32 = 7;
pub const HTTP_RETURNED_ERROR: i32 = 22;
pub const WRITE_ERROR: i32 = 23;
pub const OPERATION_TIMEDOUT: i32 = 28;
pub const SSL_CONNECT_ERROR: i32 = 35;
pub const TOO_MANY_REDIRECTS: i32 = 47;
pub const UNKNOWN_OPTION: i32 = 48;
pub const RECV_ERROR: i32 = 56;

/// Generic description of an error code, `None` for codes not listed here.
pub fn describe(code: i32) -> Option<&'static str> {
    let text = match code {
        OK => "No error",
        UNSUPPORTED_PROTOCOL => "Unsupported protocol",
        FAILED_INIT => "Failed initialization",
        URL_MALFORMAT => "URL using bad/illegal format or missing URL",
        COULDNT_RESOLVE_HOST => "Couldn't resolve host name",
        COULDNT_CONNECT => "Couldn't connect to server",
        HTTP_RETURNED_ERROR => "HTTP response code said error",
        WRITE_ERROR => "Failed writing received data to disk/application",
        OPERATION_TIMEDOUT => "Timeout was reached",
        SSL_CONNECT_ERROR => "SSL connect error",
        TOO_MANY_REDIRECTS => "Number of redirects hit maximum amount",
        UNKNOWN_OPTION => "An unknown option was passed in to libcurl",
        RECV_ERROR => "Failure when receiving data from the peer",
        _ => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_known_codes_only() {
        assert_eq!(describe(OK), Some("No error"));
        assert_eq!(describe(UNKNOWN_OPTION), Some("An unknown option was passed in to libcurl"));
        assert_eq!(describe(COULDNT_RESOLVE_HOST), Some("Couldn't resolve host name"));
        assert_eq!(describe(4), None);
        assert_eq!(describe(-1), None);
    }
}
