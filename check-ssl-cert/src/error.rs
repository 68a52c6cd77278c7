use std::io;
use std::path::PathBuf;

use thiserror::Error;
use x509_parser::error::X509Error;

/// Error from [`crate::Checker`] and [`crate::Opts`]
#[derive(Debug, Error)]
pub enum CheckError {
    /// Command line cannot be parsed
    #[error("{0}")]
    InvalidArguments(String),
    /// Neither PEM file nor both host and port are given
    #[error("Host and port required")]
    MissingEndpoint,
    /// PEM file does not exist
    #[error("No such cert")]
    NoSuchCert,
    /// PEM file exists but cannot be read
    #[error("failed to read {}: {source}", .path.display())]
    ReadCert {
        /// Path of certificate file
        path: PathBuf,
        /// Underlying IO error
        source: io::Error,
    },
    /// PEM file holds blocks but none of them is a certificate
    #[error("no certificate found in PEM file")]
    NoCertificateBlock,
    /// Bytes are neither a PEM nor a DER encoded certificate
    #[error("failed to parse certificate: {0}")]
    ParseCert(#[from] x509_parser::nom::Err<X509Error>),
    /// Server name is not a valid DNS name or IP address
    #[error("invalid server name: {0}")]
    ServerName(String),
    /// Host name cannot be resolved
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        /// Host and port
        endpoint: String,
        /// Underlying IO error
        source: io::Error,
    },
    /// TCP connection cannot be established
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        /// Host and port
        endpoint: String,
        /// Underlying IO error
        source: io::Error,
    },
    /// TLS session cannot be set up
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),
    /// TLS handshake failed or timed out
    #[error("TLS handshake with {endpoint} failed: {source}")]
    Handshake {
        /// Host and port
        endpoint: String,
        /// Underlying IO error
        source: io::Error,
    },
    /// Peer finished handshake without any certificate
    #[error("no peer certificate found on {0}")]
    NoPeerCertificate(String),
    /// notAfter cannot be represented as date time
    #[error("expiry timestamp {0} is out of range")]
    Timestamp(i64),
}
