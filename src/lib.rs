//! Proxy Checker
//!
//! Reads a list of proxies, sends one request through each of them
//! concurrently and keeps the ones that answer with a 2xx status.

pub mod proxy;

pub use proxy::*;

use std::path::PathBuf;

/// Application result type
pub type Result<T> = anyhow::Result<T>;

/// Default file the proxy list is read from
pub const DEFAULT_INPUT_FILE: &str = "proxies.txt";

/// Default file the working proxies are written to
pub const DEFAULT_OUTPUT_FILE: &str = "output.txt";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// File containing one proxy per line
    pub input_path: PathBuf,
    /// File receiving the working proxies
    pub output_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_FILE),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
        }
    }
}

impl Config {
    pub fn new(input_path: Option<PathBuf>, output_path: Option<PathBuf>) -> Self {
        let defaults = Self::default();
        Self {
            input_path: input_path.unwrap_or(defaults.input_path),
            output_path: output_path.unwrap_or(defaults.output_path),
        }
    }
}
