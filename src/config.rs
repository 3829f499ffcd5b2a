//! Request configuration.
//!
//! `RequestConfig` holds the options a [`UrlRequest`](crate::request::UrlRequest)
//! applies when no options were added to it. The default is a single
//! `RETURN_TRANSFER = true`, so `execute` hands the body back as a value.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use urlrequest::config::RequestConfig;
//! use urlrequest::transport::opt;
//!
//! let cfg = RequestConfig::default();
//! assert_eq!(cfg.default_options.len(), 1);
//! assert_eq!(cfg.default_options[0].0, opt::RETURN_TRANSFER);
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use urlrequest::config::RequestConfig;
//! use urlrequest::transport::opt;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = RequestConfig::builder()
//!     .default_option(opt::FOLLOW_LOCATION, true)
//!     .default_option(opt::CONNECT_TIMEOUT, 10)
//!     .build()?;
//! assert_eq!(cfg.default_options.len(), 3);
//! # Ok(()) }
//! ```
//!
//! ## Load from JSON
//! ```rust
//! use urlrequest::config::RequestConfig;
//! let cfg = RequestConfig::from_json(r#"{ "default_options": [[19913, true], [78, 5]] }"#).unwrap();
//! assert_eq!(cfg.default_options.len(), 2);
//! ```
//!
//! # Errors
//!
//! Builder validation returns [`ConfigError`] when the default option list is
//! empty or names the same option twice. [`RequestConfig::from_json`] returns
//! an [`anyhow::Error`] wrapping either a [`ConfigError`] or the JSON parse
//! error.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::transport::{opt, OptionCode, OptionValue};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Options applied, in order, when a request has no options of its own.
    pub default_options: Vec<(OptionCode, OptionValue)>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            default_options: vec![(opt::RETURN_TRANSFER, OptionValue::Bool(true))],
        }
    }
}

impl RequestConfig {
    pub fn builder() -> RequestConfigBuilder {
        RequestConfigBuilder::default()
    }

    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: RequestConfig = serde_json::from_str(json)?;
        validate(&config)?;
        Ok(config)
    }
}

/// Builder for [`RequestConfig`]. Starts from the defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestConfigBuilder {
    inner: RequestConfig,
}

impl RequestConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut RequestConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    /// Appends one default option.
    pub fn default_option(self, option: OptionCode, value: impl Into<OptionValue>) -> Self {
        let value = value.into();
        self.map(|c| c.default_options.push((option, value)))
    }

    /// Replaces the whole default option list.
    pub fn default_options(self, options: Vec<(OptionCode, OptionValue)>) -> Self {
        self.map(|c| c.default_options = options)
    }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut RequestConfig)) -> Self {
        self.map(f)
    }

    /// Validate and build the final config.
    pub fn build(self) -> Result<RequestConfig, ConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

fn validate(c: &RequestConfig) -> Result<(), ConfigError> {
    if c.default_options.is_empty() {
        return Err(ConfigError::NoDefaultOptions);
    }
    let mut seen = HashSet::new();
    for (option, _) in &c.default_options {
        if !seen.insert(*option) {
            return Err(ConfigError::DuplicateDefaultOption(*option));
        }
    }
    Ok(())
}
