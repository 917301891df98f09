//! Proxy parser module for parsing proxy descriptors and proxy list files

use crate::proxy::models::{Proxy, ProxyType};
use crate::Result;
use anyhow::Context;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Why a descriptor was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorReason {
    #[error("missing ':' between host and port")]
    MissingPort,
    #[error("host is empty")]
    EmptyHost,
    #[error("port is empty")]
    EmptyPort,
    #[error("port '{0}' is not a number between 1 and 65535")]
    InvalidPort(String),
    #[error("username is empty")]
    EmptyUsername,
}

/// A descriptor that could not be turned into a [`Proxy`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid proxy '{raw}': {reason}")]
pub struct ParseError {
    pub raw: String,
    pub reason: ParseErrorReason,
}

impl ParseError {
    fn new(raw: &str, reason: ParseErrorReason) -> Self {
        Self {
            raw: raw.to_string(),
            reason,
        }
    }
}

/// Proxy parser for parsing proxies from strings and files
pub struct ProxyParser;

impl ProxyParser {
    /// Parse a single proxy descriptor
    ///
    /// Supports `[scheme://][user[:pass]@]host:port`. Only `https` selects a
    /// TLS proxy, every other scheme is treated as plain http.
    pub fn parse(raw: &str) -> std::result::Result<Proxy, ParseError> {
        let (proxy_type, rest) = match raw.split_once("://") {
            Some((scheme, rest)) => (ProxyType::from_scheme(scheme), rest),
            None => (ProxyType::Http, raw),
        };

        let (credentials, host_port) = match rest.split_once('@') {
            Some((credentials, host_port)) => (Some(credentials), host_port),
            None => (None, rest),
        };

        let (host, port) = host_port
            .split_once(':')
            .ok_or_else(|| ParseError::new(raw, ParseErrorReason::MissingPort))?;
        if host.is_empty() {
            return Err(ParseError::new(raw, ParseErrorReason::EmptyHost));
        }
        let port = Self::parse_port(port).map_err(|reason| ParseError::new(raw, reason))?;

        match credentials {
            Some(credentials) => {
                let (username, password) = credentials.split_once(':').unwrap_or((credentials, ""));
                if username.is_empty() {
                    return Err(ParseError::new(raw, ParseErrorReason::EmptyUsername));
                }
                Ok(Proxy::with_auth(
                    host.to_string(),
                    port,
                    proxy_type,
                    username.to_string(),
                    password.to_string(),
                ))
            }
            None => Ok(Proxy::new(host.to_string(), port, proxy_type)),
        }
    }

    fn parse_port(port: &str) -> std::result::Result<u16, ParseErrorReason> {
        if port.is_empty() {
            return Err(ParseErrorReason::EmptyPort);
        }
        // u16::from_str would also take a leading '+'
        if !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseErrorReason::InvalidPort(port.to_string()));
        }
        match port.parse::<u16>() {
            Ok(port) if port > 0 => Ok(port),
            _ => Err(ParseErrorReason::InvalidPort(port.to_string())),
        }
    }

    /// Parse a batch of descriptors, keeping each proxy's position in the input
    pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> (Vec<(usize, Proxy)>, Vec<ParseError>) {
        let mut proxies = Vec::with_capacity(lines.len());
        let mut rejected = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            match Self::parse(line.as_ref()) {
                Ok(proxy) => proxies.push((index, proxy)),
                Err(e) => rejected.push(e),
            }
        }

        (proxies, rejected)
    }

    /// Read proxy descriptors from a file
    ///
    /// Lines are trimmed; blank lines and `#` comments are skipped.
    pub fn read_descriptors<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read proxy list {:?}", path))?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect())
    }

    /// Save descriptors to a file, one per line
    pub fn save_descriptors<P: AsRef<Path>>(descriptors: &[String], path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, descriptors.join("\n"))
            .with_context(|| format!("failed to write proxies to {:?}", path))?;
        Ok(())
    }
}
