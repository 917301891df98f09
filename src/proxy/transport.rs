//! Connections to the proxy itself
//!
//! Plain proxies get a bare TCP stream, `https` proxies get the same stream
//! wrapped in TLS before any HTTP is spoken.

use crate::proxy::models::{Proxy, ProxyType};
use crate::Result;
use anyhow::Context;
use once_cell::sync::OnceCell;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

static DEFAULT_TLS_CONFIG: OnceCell<Arc<ClientConfig>> = OnceCell::new();

/// TLS client configuration trusting the bundled webpki roots
pub fn default_tls_config() -> Result<Arc<ClientConfig>> {
    DEFAULT_TLS_CONFIG
        .get_or_try_init(|| -> Result<Arc<ClientConfig>> {
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

            let config = ClientConfig::builder_with_provider(Arc::new(
                rustls::crypto::ring::default_provider(),
            ))
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots)
            .with_no_client_auth();

            Ok(Arc::new(config))
        })
        .cloned()
}

/// Byte stream to a proxy, plain or TLS-wrapped
pub trait ProxyConnection: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + 'static> ProxyConnection for T {}

/// Open a connection to the proxy, using TLS for `https` proxies
pub async fn connect(proxy: &Proxy, tls: &Arc<ClientConfig>) -> Result<Box<dyn ProxyConnection>> {
    let address = proxy.to_simple_string();
    let stream = TcpStream::connect((proxy.host.as_str(), proxy.port))
        .await
        .with_context(|| format!("connect to {} failed", address))?;

    match proxy.proxy_type {
        ProxyType::Http => Ok(Box::new(stream)),
        ProxyType::Https => {
            let server_name = ServerName::try_from(proxy.host.as_str())
                .with_context(|| format!("'{}' is not a valid TLS server name", proxy.host))?
                .to_owned();
            let stream = TlsConnector::from(Arc::clone(tls))
                .connect(server_name, stream)
                .await
                .with_context(|| format!("TLS handshake with {} failed", address))?;

            debug!("TLS established with proxy {}", address);
            Ok(Box::new(stream))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tls_config_is_shared() {
        let first = default_tls_config().unwrap();
        let second = default_tls_config().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_connect_refused_reports_address() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let proxy = Proxy::new("127.0.0.1".to_string(), port, ProxyType::Http);
        let err = match connect(&proxy, &default_tls_config().unwrap()).await {
            Ok(_) => panic!("connection to a closed port succeeded"),
            Err(e) => e,
        };
        assert!(format!("{:#}", err).starts_with(&format!("connect to 127.0.0.1:{} failed: ", port)));
    }
}
