//! Proxy data models

use std::fmt;

/// Proxy type enumeration
///
/// Decides whether the connection to the proxy itself is plain or TLS-wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProxyType {
    #[default]
    Http,
    Https,
}

impl ProxyType {
    /// Map a descriptor scheme to a proxy type. Anything but `https` is plain.
    pub fn from_scheme(scheme: &str) -> Self {
        if scheme.eq_ignore_ascii_case("https") {
            ProxyType::Https
        } else {
            ProxyType::Http
        }
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyType::Http => write!(f, "http"),
            ProxyType::Https => write!(f, "https"),
        }
    }
}

/// Proxy authentication credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

impl ProxyAuth {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

/// Proxy model representing a single proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy {
    pub host: String,
    pub port: u16,
    pub proxy_type: ProxyType,
    pub auth: Option<ProxyAuth>,
}

impl Proxy {
    /// Create a new proxy without authentication
    pub fn new(host: String, port: u16, proxy_type: ProxyType) -> Self {
        Self {
            host,
            port,
            proxy_type,
            auth: None,
        }
    }

    /// Create a new proxy with authentication
    pub fn with_auth(
        host: String,
        port: u16,
        proxy_type: ProxyType,
        username: String,
        password: String,
    ) -> Self {
        Self {
            host,
            port,
            proxy_type,
            auth: Some(ProxyAuth::new(username, password)),
        }
    }

    /// Get the proxy URL without credentials, e.g. `https://10.0.0.1:3128`
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.proxy_type, self.host, self.port)
    }

    /// Get the proxy string in HOST:PORT format
    pub fn to_simple_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the proxy string in USER:PASS@HOST:PORT format
    ///
    /// The scheme is not part of the output, so an `https` proxy comes back
    /// as a bare descriptor.
    pub fn to_credential_string(&self) -> String {
        match &self.auth {
            Some(auth) => format!(
                "{}:{}@{}:{}",
                auth.username, auth.password, self.host, self.port
            ),
            None => self.to_simple_string(),
        }
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

/// What a probe observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeDetail {
    /// A response arrived with this status code
    HttpStatus(u16),
    /// The connection failed before any response
    NetworkError(String),
    /// No response headers within the timeout window
    Timeout,
}

impl fmt::Display for ProbeDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeDetail::HttpStatus(code) => write!(f, "HTTP status: {}", code),
            ProbeDetail::NetworkError(message) => write!(f, "network error: {}", message),
            ProbeDetail::Timeout => write!(f, "timeout"),
        }
    }
}

/// Result of a single proxy check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyCheckResult {
    proxy: Proxy,
    succeeded: bool,
    detail: ProbeDetail,
    response_time_ms: Option<u64>,
}

impl ProxyCheckResult {
    /// Classify a received status code. Only 2xx counts as working.
    pub fn from_status(proxy: Proxy, status: u16, response_time_ms: u64) -> Self {
        Self {
            proxy,
            succeeded: (200..300).contains(&status),
            detail: ProbeDetail::HttpStatus(status),
            response_time_ms: Some(response_time_ms),
        }
    }

    pub fn failed(proxy: Proxy, error: String) -> Self {
        Self {
            proxy,
            succeeded: false,
            detail: ProbeDetail::NetworkError(error),
            response_time_ms: None,
        }
    }

    pub fn timeout(proxy: Proxy) -> Self {
        Self {
            proxy,
            succeeded: false,
            detail: ProbeDetail::Timeout,
            response_time_ms: None,
        }
    }

    pub fn proxy(&self) -> &Proxy {
        &self.proxy
    }

    pub fn detail(&self) -> &ProbeDetail {
        &self.detail
    }

    pub fn response_time_ms(&self) -> Option<u64> {
        self.response_time_ms
    }

    pub fn is_working(&self) -> bool {
        self.succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_creation() {
        let proxy = Proxy::new("127.0.0.1".to_string(), 8080, ProxyType::Http);
        assert_eq!(proxy.host, "127.0.0.1");
        assert_eq!(proxy.port, 8080);
        assert_eq!(proxy.proxy_type, ProxyType::Http);
        assert!(proxy.auth.is_none());
    }

    #[test]
    fn test_proxy_type_from_scheme() {
        assert_eq!(ProxyType::from_scheme("https"), ProxyType::Https);
        assert_eq!(ProxyType::from_scheme("HTTPS"), ProxyType::Https);
        assert_eq!(ProxyType::from_scheme("http"), ProxyType::Http);
        assert_eq!(ProxyType::from_scheme("socks5"), ProxyType::Http);
    }

    #[test]
    fn test_proxy_url() {
        let proxy = Proxy::new("127.0.0.1".to_string(), 8080, ProxyType::Http);
        assert_eq!(proxy.url(), "http://127.0.0.1:8080");

        let proxy = Proxy::with_auth(
            "192.168.1.1".to_string(),
            443,
            ProxyType::Https,
            "user".to_string(),
            "pass".to_string(),
        );
        // credentials travel in a header, never in the URL
        assert_eq!(proxy.url(), "https://192.168.1.1:443");
        assert_eq!(proxy.to_string(), "https://192.168.1.1:443");
    }

    #[test]
    fn test_proxy_credential_string() {
        let proxy = Proxy::with_auth(
            "127.0.0.1".to_string(),
            8080,
            ProxyType::Https,
            "user".to_string(),
            "pass".to_string(),
        );
        assert_eq!(proxy.to_credential_string(), "user:pass@127.0.0.1:8080");

        let proxy = Proxy::new("127.0.0.1".to_string(), 8080, ProxyType::Http);
        assert_eq!(proxy.to_credential_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_proxy_check_result() {
        let proxy = Proxy::new("127.0.0.1".to_string(), 8080, ProxyType::Http);

        let result = ProxyCheckResult::from_status(proxy.clone(), 200, 100);
        assert!(result.is_working());
        assert_eq!(result.detail(), &ProbeDetail::HttpStatus(200));
        assert_eq!(result.response_time_ms(), Some(100));

        let result = ProxyCheckResult::from_status(proxy.clone(), 299, 5);
        assert!(result.is_working());

        let result = ProxyCheckResult::from_status(proxy.clone(), 300, 5);
        assert!(!result.is_working());

        let result = ProxyCheckResult::from_status(proxy.clone(), 407, 5);
        assert!(!result.is_working());
        assert_eq!(result.detail(), &ProbeDetail::HttpStatus(407));

        let result = ProxyCheckResult::failed(proxy.clone(), "Connection refused".to_string());
        assert!(!result.is_working());
        assert_eq!(result.response_time_ms(), None);

        let result = ProxyCheckResult::timeout(proxy);
        assert!(!result.is_working());
        assert_eq!(result.detail(), &ProbeDetail::Timeout);
    }

    #[test]
    fn test_probe_detail_display() {
        assert_eq!(ProbeDetail::HttpStatus(502).to_string(), "HTTP status: 502");
        assert_eq!(ProbeDetail::Timeout.to_string(), "timeout");
        assert_eq!(
            ProbeDetail::NetworkError("reset".to_string()).to_string(),
            "network error: reset"
        );
    }
}
