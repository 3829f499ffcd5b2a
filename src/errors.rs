/// Errors raised by [`UrlRequest`](crate::request::UrlRequest).
///
/// Transfer failures are not represented here: they are reported through
/// [`Content::Failed`](crate::transport::Content::Failed) and the error/errno
/// snapshot of the request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("missing transport object")]
    MissingTransport,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Validation errors for [`RequestConfig`](crate::config::RequestConfig).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one default option is required")]
    NoDefaultOptions,

    #[error("default option {0} is listed more than once")]
    DuplicateDefaultOption(i32),
}
