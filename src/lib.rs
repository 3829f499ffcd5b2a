pub mod config;
pub mod errors;
pub mod request;
pub mod transport;

pub use config::RequestConfig;
pub use errors::{ConfigError, RequestError};
pub use request::UrlRequest;
pub use transport::{Content, Transport};
