//! Proxy checker module for checking proxy validity

use crate::proxy::models::{Proxy, ProxyCheckResult};
use crate::proxy::transport::{self, default_tls_config};
use crate::Result;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use http::header::{HeaderValue, HOST, PROXY_AUTHORIZATION, USER_AGENT};
use http::{Method, Request, Response, Uri};
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper_util::rt::TokioIo;
use rustls::ClientConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Default timeout for proxy checks in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default URL to test proxies against
pub const DEFAULT_TEST_URL: &str = "https://api64.ipify.org/";

/// User agent sent with every probe
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each proxy check
    pub timeout: Duration,
    /// URL to test proxies against
    pub test_url: String,
    /// User agent header for probe requests
    pub user_agent: String,
    /// TLS settings for `https` proxies; the bundled webpki roots when unset
    pub tls_config: Option<Arc<ClientConfig>>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            test_url: DEFAULT_TEST_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            tls_config: None,
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_test_url(mut self, url: String) -> Self {
        self.test_url = url;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_tls_config(mut self, tls_config: Arc<ClientConfig>) -> Self {
        self.tls_config = Some(tls_config);
        self
    }
}

/// Anything that can turn one proxy into a verdict.
///
/// Implementations must not fail: every outcome is folded into the
/// returned [`ProxyCheckResult`].
#[async_trait]
pub trait ProxyProbe: Send + Sync {
    async fn probe(&self, proxy: &Proxy) -> ProxyCheckResult;
}

/// Background task driving one proxy connection; aborted on drop.
struct ConnectionTask(JoinHandle<()>);

impl Drop for ConnectionTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Everything needed to probe one proxy, fixed at construction time
///
/// The GET goes straight to the proxy with the absolute test URL as its
/// target, so the proxy is the next hop rather than a CONNECT tunnel.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    proxy: Proxy,
    target: Uri,
    host: HeaderValue,
    authorization: Option<HeaderValue>,
    user_agent: HeaderValue,
    tls: Arc<ClientConfig>,
    timeout: Duration,
}

impl ProbeRequest {
    pub fn new(proxy: &Proxy, config: &CheckerConfig) -> Result<Self> {
        let target: Uri = config
            .test_url
            .parse()
            .with_context(|| format!("invalid test URL '{}'", config.test_url))?;
        let authority = target
            .authority()
            .ok_or_else(|| anyhow!("test URL '{}' has no host", config.test_url))?;
        let host = HeaderValue::from_str(authority.as_str())?;

        let authorization = match &proxy.auth {
            Some(auth) => {
                let token = BASE64.encode(format!("{}:{}", auth.username, auth.password));
                let mut value = HeaderValue::from_str(&format!("Basic {}", token))?;
                value.set_sensitive(true);
                Some(value)
            }
            None => None,
        };

        let tls = match &config.tls_config {
            Some(tls) => Arc::clone(tls),
            None => default_tls_config()?,
        };

        Ok(Self {
            proxy: proxy.clone(),
            target,
            host,
            authorization,
            user_agent: HeaderValue::from_str(&config.user_agent)?,
            tls,
            timeout: config.timeout,
        })
    }

    pub fn proxy_url(&self) -> String {
        self.proxy.url()
    }

    pub fn target(&self) -> &Uri {
        &self.target
    }

    pub fn authorization(&self) -> Option<&HeaderValue> {
        self.authorization.as_ref()
    }

    fn request(&self) -> Result<Request<Empty<Bytes>>> {
        let mut builder = Request::builder()
            .method(Method::GET)
            .uri(self.target.clone())
            .header(HOST, self.host.clone())
            .header(USER_AGENT, self.user_agent.clone());
        if let Some(value) = &self.authorization {
            builder = builder.header(PROXY_AUTHORIZATION, value.clone());
        }

        Ok(builder.body(Empty::new())?)
    }

    /// Connect, send the GET and wait for the response headers
    async fn send(&self) -> Result<(Response<Incoming>, ConnectionTask)> {
        let stream = transport::connect(&self.proxy, &self.tls).await?;
        let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .context("HTTP handshake failed")?;

        let address = self.proxy.to_simple_string();
        let task = ConnectionTask(tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!("Connection to proxy {} ended: {}", address, e);
            }
        }));

        let response = sender
            .send_request(self.request()?)
            .await
            .context("request failed")?;

        Ok((response, task))
    }

    /// Send the GET and classify what comes back
    pub async fn execute(&self) -> ProxyCheckResult {
        let start = Instant::now();
        let (response, _connection) = match timeout(self.timeout, self.send()).await {
            Ok(Ok(exchange)) => exchange,
            Ok(Err(e)) => return ProxyCheckResult::failed(self.proxy.clone(), format!("{:#}", e)),
            Err(_) => return ProxyCheckResult::timeout(self.proxy.clone()),
        };

        let elapsed = start.elapsed();
        let status = response.status().as_u16();
        drain(response.into_body(), self.timeout.saturating_sub(elapsed)).await;

        ProxyCheckResult::from_status(self.proxy.clone(), status, elapsed.as_millis() as u64)
    }
}

/// Read and discard the body so the connection is released
async fn drain(mut body: Incoming, window: Duration) {
    let drained = timeout(window, async {
        while let Some(Ok(_)) = body.frame().await {}
    })
    .await;

    if drained.is_err() {
        debug!("Response body not drained in time, dropping connection");
    }
}

/// Proxy checker for validating proxies
#[derive(Debug, Clone, Default)]
pub struct ProxyChecker {
    config: CheckerConfig,
}

impl ProxyChecker {
    /// Create a new proxy checker with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new proxy checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Check a single proxy
    pub async fn check_proxy(&self, proxy: &Proxy) -> ProxyCheckResult {
        debug!("Checking proxy {} against {}", proxy, self.config.test_url);

        let result = match ProbeRequest::new(proxy, &self.config) {
            Ok(request) => request.execute().await,
            Err(e) => ProxyCheckResult::failed(proxy.clone(), format!("{:#}", e)),
        };

        if !result.is_working() {
            warn!("Proxy {} failed: {}", proxy.to_simple_string(), result.detail());
        }

        result
    }
}

#[async_trait]
impl ProxyProbe for ProxyChecker {
    async fn probe(&self, proxy: &Proxy) -> ProxyCheckResult {
        self.check_proxy(proxy).await
    }
}
