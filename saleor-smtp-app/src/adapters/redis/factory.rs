//! Builds a [`RedisApl`] from configuration on first use

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redis::{Client, ConnectionInfo, IntoConnectionInfo};

use saleor_smtp_core::error::{AplError, AplResult};
use saleor_smtp_core::traits::Apl;

use crate::adapters::lazy::AplFactory;
use crate::config::{redact_url, RedisConfig, RedisEndpoint};

use super::apl::RedisApl;
use super::transport::RedisConnector;

const PEM_CERTIFICATE_MARKER: &str = "-----BEGIN CERTIFICATE-----";

/// Creates the Redis APL. No file or network I/O happens until [`AplFactory::build`].
pub struct RedisAplFactory {
    config: RedisConfig,
}

impl RedisAplFactory {
    /// Validates the endpoint without touching the network.
    pub fn new(config: RedisConfig) -> AplResult<Self> {
        connection_info(&config.endpoint)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// Build the `redis::Client`, loading the CA bundle when configured.
    pub async fn build_client(&self) -> AplResult<Client> {
        let info = connection_info(&self.config.endpoint)?;

        match &self.config.tls_ca_cert_path {
            Some(path) => {
                let root_cert = read_ca_certificate(path).await?;
                tls_client(info, root_cert, path)
            }
            None => Client::open(info).map_err(|e| AplError::Configuration(e.to_string())),
        }
    }
}

#[async_trait]
impl AplFactory for RedisAplFactory {
    async fn build(&self) -> AplResult<Arc<dyn Apl>> {
        let client = self.build_client().await?;
        let apl = RedisApl::new(RedisConnector::new(client), self.config.key_layout());

        tracing::info!(
            endpoint = ?self.config.endpoint,
            layout = ?apl.layout(),
            tls = self.config.tls_ca_cert_path.is_some(),
            "Redis APL initialized"
        );
        Ok(Arc::new(apl))
    }
}

fn connection_info(endpoint: &RedisEndpoint) -> AplResult<ConnectionInfo> {
    match endpoint {
        RedisEndpoint::Url(url) => url.as_str().into_connection_info().map_err(|e| {
            AplError::Configuration(format!("invalid REDIS_URL \"{}\": {e}", redact_url(url)))
        }),
        RedisEndpoint::Host {
            host,
            port,
            password,
            db,
        } => {
            let mut info = (host.as_str(), *port)
                .into_connection_info()
                .map_err(|e| AplError::Configuration(e.to_string()))?;
            info.redis.db = *db;
            info.redis.password.clone_from(password);
            Ok(info)
        }
    }
}

async fn read_ca_certificate(path: &Path) -> AplResult<Vec<u8>> {
    let tls_error = |message: String| AplError::TlsCertificate {
        path: path.display().to_string(),
        message,
    };

    let pem = tokio::fs::read(path)
        .await
        .map_err(|e| tls_error(e.to_string()))?;

    if !String::from_utf8_lossy(&pem).contains(PEM_CERTIFICATE_MARKER) {
        return Err(tls_error("no PEM certificate found".to_string()));
    }
    Ok(pem)
}

/// TLS client trusting only `root_cert`. Certificate verification is always on.
#[cfg(feature = "rustls")]
fn tls_client(mut info: ConnectionInfo, root_cert: Vec<u8>, path: &Path) -> AplResult<Client> {
    use redis::{ConnectionAddr, TlsCertificates};

    // Already installed by the host application is fine.
    let _ = rustls::crypto::ring::default_provider().install_default();

    info.addr = match info.addr {
        ConnectionAddr::Tcp(host, port) | ConnectionAddr::TcpTls { host, port, .. } => {
            ConnectionAddr::TcpTls {
                host,
                port,
                insecure: false,
                tls_params: None,
            }
        }
        _ => {
            return Err(AplError::Configuration(
                "REDIS_TLS_CA_CERT_PATH requires a TCP endpoint".to_string(),
            ))
        }
    };

    Client::build_with_tls(
        info,
        TlsCertificates {
            client_tls: None,
            root_cert: Some(root_cert),
        },
    )
    .map_err(|e| AplError::TlsCertificate {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(not(feature = "rustls"))]
fn tls_client(_info: ConnectionInfo, _root_cert: Vec<u8>, _path: &Path) -> AplResult<Client> {
    Err(AplError::Configuration(
        "REDIS_TLS_CA_CERT_PATH is set but TLS support is not compiled in (enable the `rustls` feature)"
            .to_string(),
    ))
}
