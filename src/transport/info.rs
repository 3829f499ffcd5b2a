//! Transfer info codes for [`Transport::getinfo`](crate::transport::Transport::getinfo).
//!
//! Numbering follows libcurl (`CURLINFO_STRING = 0x100000`,
//! `CURLINFO_LONG = 0x200000`, `CURLINFO_DOUBLE = 0x300000`).

use std::fmt;

pub type InfoCode = i32;

pub const EFFECTIVE_URL: InfoCode = 0x100000 + 1;
pub const CONTENT_TYPE: InfoCode = 0x100000 + 18;
pub const RESPONSE_CODE: InfoCode = 0x200000 + 2;
pub const HEADER_SIZE: InfoCode = 0x200000 + 11;
pub const TOTAL_TIME: InfoCode = 0x300000 + 3;
pub const SIZE_DOWNLOAD: InfoCode = 0x300000 + 8;

/// Value returned for an info code.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for InfoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoValue::Int(i) => write!(f, "{i}"),
            InfoValue::Float(v) => write!(f, "{v}"),
            InfoValue::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Facts recorded about the last transfer on a handle. Backends fill this in
/// after `exec` and answer `getinfo` from it.
#[derive(Debug, Clone, Default)]
pub struct TransferInfo {
    pub effective_url: Option<String>,
    pub content_type: Option<String>,
    pub response_code: u16,
    pub header_size: usize,
    pub total_time: f64,
    pub size_download: usize,
}

impl TransferInfo {
    pub fn get(&self, code: InfoCode) -> Option<InfoValue> {
        match code {
            EFFECTIVE_URL => self.effective_url.clone().map(InfoValue::Str),
            CONTENT_TYPE => self.content_type.clone().map(InfoValue::Str),
            RESPONSE_CODE => Some(InfoValue::Int(i64::from(self.response_code))),
            HEADER_SIZE => Some(InfoValue::Int(self.header_size as i64)),
            TOTAL_TIME => Some(InfoValue::Float(self.total_time)),
            SIZE_DOWNLOAD => Some(InfoValue::Float(self.size_download as f64)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_code() {
        let info = TransferInfo {
            effective_url: Some("http://example.test/".into()),
            response_code: 404,
            ..Default::default()
        };

        assert_eq!(info.get(RESPONSE_CODE), Some(InfoValue::Int(404)));
        assert_eq!(info.get(EFFECTIVE_URL), Some(InfoValue::Str("http://example.test/".into())));
        assert_eq!(info.get(CONTENT_TYPE), None);
        assert_eq!(info.get(0), None);
    }
}
