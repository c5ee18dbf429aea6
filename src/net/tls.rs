//! TLS certificate loading for the gateway listener.

use std::path::Path;
use axum_server::tls_rustls::RustlsConfig;

/// Load the PEM certificate chain and private key.
///
/// Missing files are reported by path before rustls parses anything.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, std::io::Error> {
    for (what, path) in [("certificate", cert_path), ("private key", key_path)] {
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("gateway TLS {} not found: {}", what, path.display()),
            ));
        }
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}
