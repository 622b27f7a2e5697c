pub mod api;

use crate::cli::Args;
use self::api::AppState;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use axum_server::tls_rustls::RustlsConfig;
use rustls::ServerConfig;
use rustls::pki_types::CertificateDer;
use rustls_pemfile::{ certs, private_key };
use log::{ info, warn, error };

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// How the listener is exposed, decided once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Http,
    Https {
        cert_path: String,
        key_path: String,
    },
}

impl Transport {
    pub fn from_args(args: &Args) -> Self {
        if !args.use_https {
            info!("HTTPS disabled by configuration. Running plain HTTP.");
            return Transport::Http;
        }

        if Path::new(&args.tls_cert_path).exists() && Path::new(&args.tls_key_path).exists() {
            return Transport::Https {
                cert_path: args.tls_cert_path.clone(),
                key_path: args.tls_key_path.clone(),
            };
        }

        warn!(
            "HTTPS certificates not found ('{}', '{}'). Running on HTTP.",
            args.tls_cert_path,
            args.tls_key_path
        );
        warn!("Outlook requires HTTPS. Generate certificates with:");
        warn!(
            "   openssl req -x509 -newkey rsa:4096 -nodes -keyout {} -out {} -days 365 -subj \"/CN=localhost\"",
            args.tls_key_path,
            args.tls_cert_path
        );
        warn!("   Or set USE_HTTPS=false for development");
        Transport::Http
    }

    fn scheme(&self) -> &'static str {
        match self {
            Transport::Http => "http",
            Transport::Https { .. } => "https",
        }
    }
}

pub fn load_tls_config(
    cert_path: &str,
    key_path: &str
) -> Result<Arc<ServerConfig>, Box<dyn Error + Send + Sync>> {
    let cert_file = File::open(cert_path).map_err(|e|
        format!("Failed to open TLS certificate file '{}': {}", cert_path, e)
    )?;
    let key_file = File::open(key_path).map_err(|e|
        format!("Failed to open TLS key file '{}': {}", key_path, e)
    )?;

    let mut cert_reader = BufReader::new(cert_file);
    let mut key_reader = BufReader::new(key_file);
    let cert_chain: Vec<CertificateDer<'static>> = certs(&mut cert_reader)
        .collect::<Result<_, _>>()
        .map_err(|e| format!("Failed to read certificate(s): {}", e))?;

    let key = private_key(&mut key_reader)
        .map_err(|e| format!("Error reading private key: {}", e))?
        .ok_or("No private key found in key file")?;

    // ring and aws-lc-rs are both enabled, so no process default is chosen for us.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut config = ServerConfig::builder().with_no_client_auth().with_single_cert(cert_chain, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

pub struct Server {
    args: Args,
    state: AppState,
}

impl Server {
    pub fn new(args: Args, state: AppState) -> Self {
        Self { args, state }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = resolve_addr(&self.args.server_addr()).await?;
        let app = api::router(self.state.clone(), &self.args.public_dir);
        let transport = Transport::from_args(&self.args);

        info!("Server running on {}://localhost:{}", transport.scheme(), addr.port());
        if self.state.chat_client.is_none() {
            warn!("Make sure to configure OPENAI_API_KEY in your .env file");
        }

        match transport {
            Transport::Https { cert_path, key_path } => {
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    cert_path,
                    key_path
                );
                let tls_config = RustlsConfig::from_config(load_tls_config(&cert_path, &key_path)?);

                let handle = axum_server::Handle::new();
                let shutdown_handle = handle.clone();
                tokio::spawn(async move {
                    shutdown_signal().await;
                    shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
                });

                axum_server::bind_rustls(addr, tls_config)
                    .handle(handle)
                    .serve(app.into_make_service()).await?;
            }
            Transport::Http => {
                let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                    error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
                    e
                })?;
                axum::serve(listener, app.into_make_service())
                    .with_graceful_shutdown(shutdown_signal()).await?;
            }
        }

        info!("Server stopped");
        Ok(())
    }
}

async fn resolve_addr(addr: &str) -> Result<SocketAddr, Box<dyn Error + Send + Sync>> {
    tokio::net
        ::lookup_host(addr).await?
        .next()
        .ok_or_else(|| format!("Could not resolve server address '{}'", addr).into())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
