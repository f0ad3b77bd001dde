//! TLS configuration for the HTTPS listener.
//!
//! Protocol and cipher choices follow Cloudflare's recommendations for
//! internet-facing servers: TLS 1.2 at minimum, P-256 and X25519 key
//! exchange, and AEAD-only ECDHE suites picked in server order.

use rustls::crypto::aws_lc_rs::{self, cipher_suite, kx_group};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::ServerError;

/// Crypto provider restricted to the accepted groups and suites.
///
/// TLS 1.3 suites are not configurable by peers and are listed first; the
/// TLS 1.2 suites keep their preference order.
pub fn crypto_provider() -> CryptoProvider {
    CryptoProvider {
        cipher_suites: vec![
            cipher_suite::TLS13_AES_256_GCM_SHA384,
            cipher_suite::TLS13_CHACHA20_POLY1305_SHA256,
            cipher_suite::TLS13_AES_128_GCM_SHA256,
            cipher_suite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
            cipher_suite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
            cipher_suite::TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256,
            cipher_suite::TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
            cipher_suite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
            cipher_suite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
        ],
        kx_groups: vec![kx_group::SECP256R1, kx_group::X25519],
        ..aws_lc_rs::default_provider()
    }
}

/// Build the rustls server configuration from PEM files.
pub fn load_server_config(cert_path: &Path, key_path: &Path) -> Result<Arc<ServerConfig>, ServerError> {
    let certs = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;

    let mut config = ServerConfig::builder_with_provider(Arc::new(crypto_provider()))
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    config.ignore_client_order = true;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    info!(
        cert = %cert_path.display(),
        key = %key_path.display(),
        "Loaded TLS certificate"
    );

    Ok(Arc::new(config))
}

fn open(path: &Path) -> Result<BufReader<File>, ServerError> {
    File::open(path).map(BufReader::new).map_err(|source| ServerError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, ServerError> {
    let mut reader = open(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| ServerError::Io {
            path: path.display().to_string(),
            source,
        })?;

    if certs.is_empty() {
        return Err(ServerError::MissingCertificate(path.display().to_string()));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, ServerError> {
    let mut reader = open(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| ServerError::Io {
            path: path.display().to_string(),
            source,
        })?
        .ok_or_else(|| ServerError::MissingPrivateKey(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    #[test]
    fn test_provider_suites_and_groups() {
        let provider = crypto_provider();

        let tls12: Vec<_> = provider
            .cipher_suites
            .iter()
            .filter(|s| s.tls13().is_none())
            .map(|s| s.suite())
            .collect();
        assert_eq!(
            tls12,
            vec![
                rustls::CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
                rustls::CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
                rustls::CipherSuite::TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256,
                rustls::CipherSuite::TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
                rustls::CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
                rustls::CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            ]
        );

        let groups: Vec<_> = provider.kx_groups.iter().map(|g| g.name()).collect();
        assert_eq!(
            groups,
            vec![rustls::NamedGroup::secp256r1, rustls::NamedGroup::X25519]
        );
    }

    #[test]
    fn test_loads_fixture_pair() {
        let config = load_server_config(&fixture("app.crt"), &fixture("app.key")).unwrap();
        assert!(config.ignore_client_order);
        assert_eq!(config.alpn_protocols[0], b"h2".to_vec());
    }

    #[test]
    fn test_missing_cert_file() {
        let err = load_server_config(&fixture("absent.crt"), &fixture("app.key")).unwrap_err();
        assert!(matches!(err, ServerError::Io { .. }));
    }

    #[test]
    fn test_key_file_without_key() {
        let err = load_server_config(&fixture("app.crt"), &fixture("app.crt")).unwrap_err();
        assert!(matches!(err, ServerError::MissingPrivateKey(_)));
    }

    #[test]
    fn test_cert_file_without_cert() {
        let err = load_server_config(&fixture("app.key"), &fixture("app.key")).unwrap_err();
        assert!(matches!(err, ServerError::MissingCertificate(_)));
    }
}
