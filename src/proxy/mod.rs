//! Proxy module for parsing and checking proxies
//!
//! This module provides functionality for:
//! - Parsing proxies from `[scheme://][user:pass@]host:port` descriptors
//! - Checking a single proxy against a fixed test URL
//! - Opening plain or TLS connections to the proxy itself
//! - Validating whole proxy lists with bounded concurrency

pub mod checker;
pub mod models;
pub mod parser;
pub mod transport;
pub mod validator;

pub use checker::{CheckerConfig, ProbeRequest, ProxyChecker, ProxyProbe};
pub use models::{ProbeDetail, Proxy, ProxyAuth, ProxyCheckResult, ProxyType};
pub use parser::{ParseError, ParseErrorReason, ProxyParser};
pub use validator::{CancelHandle, ValidationReport, Validator};
