use std::fmt;
use std::fs;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use log::debug;
use rustls::client::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::{Certificate, ClientConfig, ClientConnection, DigitallySignedStruct, ServerName};
use x509_parser::pem::Pem;
use x509_parser::{parse_x509_certificate, prelude::X509Certificate};

use crate::verdict::{days_until, Thresholds, Verdict};
use crate::CheckError;

/// Where the certificate comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CertificateSource {
    /// PEM or DER file on disk
    LocalFile(PathBuf),
    /// TLS server
    RemoteEndpoint {
        /// Host name or IP address to connect to
        host: String,
        /// TCP port
        port: u16,
        /// Server name sent in SNI extension
        servername: String,
    },
}

impl fmt::Display for CertificateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateSource::LocalFile(path) => write!(f, "{}", path.display()),
            CertificateSource::RemoteEndpoint {
                host,
                port,
                servername,
            } => write!(f, "{host}:{port} ({servername})"),
        }
    }
}

/// Accepts any certificate. Only metadata of the certificate is read,
/// trust is never established.
struct NoVerification;

impl ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: SystemTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &Certificate,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &Certificate,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }
}

/// Default network timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Checker for SSL certificate
pub struct Checker {
    config: Arc<ClientConfig>,
    /// Timeout of connect, read and write on socket
    pub timeout: Duration,
    /// Date which remaining days are counted from
    pub today: NaiveDate,
}

impl fmt::Debug for Checker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checker")
            .field("timeout", &self.timeout)
            .field("today", &self.today)
            .finish()
    }
}

impl Default for Checker {
    fn default() -> Checker {
        let config = ClientConfig::builder()
            .with_safe_defaults()
            .with_custom_certificate_verifier(Arc::new(NoVerification))
            .with_no_client_auth();

        Checker {
            config: Arc::new(config),
            timeout: DEFAULT_TIMEOUT,
            today: Local::now().date_naive(),
        }
    }
}

impl Checker {
    /// Create checker with network timeout
    ///
    /// ```
    /// # use check_ssl_cert::Checker;
    /// use std::time::Duration;
    /// let checker = Checker::new(Duration::from_secs(5));
    /// ```
    pub fn new(timeout: Duration) -> Self {
        Checker {
            timeout,
            ..Default::default()
        }
    }

    /// Check certificate from source against thresholds
    ///
    /// ```
    /// # use check_ssl_cert::{CertificateSource, Checker, Thresholds};
    /// let checker = Checker::default();
    /// let source = CertificateSource::LocalFile("/no/such/file".into());
    /// let thresholds = Thresholds { critical: 7, warning: 30 };
    /// assert!(checker.check(&source, &thresholds).is_err());
    /// ```
    pub fn check(
        &self,
        source: &CertificateSource,
        thresholds: &Thresholds,
    ) -> Result<Verdict, CheckError> {
        let not_after = self.not_after(source)?;
        let days = days_until(&not_after, self.today);
        debug!("{source} expires at {not_after}, {days} days from {}", self.today);
        Ok(Verdict::evaluate(days, thresholds))
    }

    /// Expiry time of certificate from source
    pub fn not_after(&self, source: &CertificateSource) -> Result<DateTime<Utc>, CheckError> {
        match source {
            CertificateSource::LocalFile(path) => {
                debug!("read certificate from {}", path.display());
                if !path.exists() {
                    return Err(CheckError::NoSuchCert);
                }
                let bytes = fs::read(path).map_err(|source| CheckError::ReadCert {
                    path: path.clone(),
                    source,
                })?;
                parse_not_after(&bytes)
            }
            CertificateSource::RemoteEndpoint {
                host,
                port,
                servername,
            } => self.fetch_not_after(host, *port, servername),
        }
    }

    fn connect(&self, host: &str, port: u16) -> Result<TcpStream, CheckError> {
        let endpoint = format!("{host}:{port}");
        let addrs = (host, port)
            .to_socket_addrs()
            .map_err(|source| CheckError::Resolve {
                endpoint: endpoint.clone(),
                source,
            })?;

        let mut last_error = io::Error::new(io::ErrorKind::NotFound, "no address resolved");
        for addr in addrs {
            debug!("connect to {addr} with timeout {:?}", self.timeout);
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!("failed to connect to {addr}: {e}");
                    last_error = e;
                }
            }
        }
        Err(CheckError::Connect {
            endpoint,
            source: last_error,
        })
    }

    fn fetch_not_after(
        &self,
        host: &str,
        port: u16,
        servername: &str,
    ) -> Result<DateTime<Utc>, CheckError> {
        let server_name = ServerName::try_from(servername)
            .map_err(|_| CheckError::ServerName(servername.to_string()))?;
        let mut conn = ClientConnection::new(self.config.clone(), server_name)?;

        let mut stream = self.connect(host, port)?;
        let endpoint = format!("{host}:{port}");
        let socket_error = |source| CheckError::Connect {
            endpoint: endpoint.clone(),
            source,
        };
        stream
            .set_read_timeout(Some(self.timeout))
            .map_err(socket_error)?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(socket_error)?;

        let start = Instant::now();
        while conn.is_handshaking() {
            conn.complete_io(&mut stream)
                .map_err(|source| CheckError::Handshake {
                    endpoint: endpoint.clone(),
                    source,
                })?;
        }
        debug!(
            "handshake with {endpoint} took {}ms",
            start.elapsed().as_millis()
        );

        let not_after = {
            let certificates = conn
                .peer_certificates()
                .ok_or_else(|| CheckError::NoPeerCertificate(endpoint.clone()))?;
            let certificate = certificates
                .first()
                .ok_or_else(|| CheckError::NoPeerCertificate(endpoint.clone()))?;
            let (_, cert) = parse_x509_certificate(certificate.as_ref())?;
            not_after_of(&cert)?
        };

        conn.send_close_notify();
        if let Err(e) = conn.complete_io(&mut stream) {
            debug!("failed to close TLS session with {endpoint}: {e}");
        }
        Ok(not_after)
    }
}

/// PEM labels OpenSSL accepts for a certificate
const CERTIFICATE_LABELS: [&str; 3] = ["CERTIFICATE", "X509 CERTIFICATE", "TRUSTED CERTIFICATE"];

/// Read notAfter from the first certificate block of a PEM file, skipping
/// keys and other blocks in front of it. Raw DER when there is no PEM block.
fn parse_not_after(bytes: &[u8]) -> Result<DateTime<Utc>, CheckError> {
    let mut blocks = 0;
    for pem in Pem::iter_from_buffer(bytes) {
        let pem = match pem {
            Ok(pem) => pem,
            Err(e) => {
                debug!("stop reading PEM blocks: {e}");
                break;
            }
        };
        blocks += 1;
        if !CERTIFICATE_LABELS.contains(&pem.label.as_str()) {
            debug!("skip PEM block labelled {}", pem.label);
            continue;
        }
        let cert = pem.parse_x509()?;
        return not_after_of(&cert);
    }

    if blocks > 0 {
        return Err(CheckError::NoCertificateBlock);
    }
    debug!("no PEM block found, try DER");
    let (_, cert) = parse_x509_certificate(bytes)?;
    not_after_of(&cert)
}

fn not_after_of(cert: &X509Certificate<'_>) -> Result<DateTime<Utc>, CheckError> {
    let timestamp = cert.validity().not_after.timestamp();
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .ok_or(CheckError::Timestamp(timestamp))
}
