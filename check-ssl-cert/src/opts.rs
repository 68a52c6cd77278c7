use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use log::warn;

use crate::{CertificateSource, CheckError, Thresholds, DEFAULT_TIMEOUT};

/// Argument parser
#[derive(Debug, Parser)]
#[command(author, about, version, disable_help_flag = true)]
pub struct Opts {
    /// Numbers of days left
    #[arg(short, long, value_name = "DAYS")]
    pub critical: u32,
    /// Numbers of days left
    #[arg(short, long, value_name = "DAYS")]
    pub warning: u32,
    /// Path to PEM file
    #[arg(short = 'P', long, value_name = "PEM")]
    pub pem: Option<PathBuf>,
    /// Host to validate
    #[arg(short = 'h', long)]
    pub host: Option<String>,
    /// Port to validate
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,
    /// Set the TLS SNI (Server Name Indication) extension
    #[arg(short, long, value_name = "SERVER")]
    pub servername: Option<String>,
    /// Timeout of network operations in seconds
    #[arg(
        short,
        long,
        value_name = "SECONDS",
        default_value_t = DEFAULT_TIMEOUT.as_secs(),
        env = "CHECK_SSL_CERT_TIMEOUT",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,
    /// Print help
    #[allow(dead_code)]
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

/// Validated configuration of one check
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckConfig {
    /// Where the certificate comes from
    pub source: CertificateSource,
    /// Thresholds in days
    pub thresholds: Thresholds,
    /// Timeout of network operations
    pub timeout: Duration,
}

impl Opts {
    /// Validate options before any IO happens. PEM file takes precedence
    /// over host and port, and server name falls back to host.
    pub fn config(&self) -> Result<CheckConfig, CheckError> {
        let source = match (&self.pem, &self.host, self.port) {
            (Some(path), _, _) => {
                if !path.exists() {
                    return Err(CheckError::NoSuchCert);
                }
                CertificateSource::LocalFile(path.clone())
            }
            (None, Some(host), Some(port)) => CertificateSource::RemoteEndpoint {
                host: host.clone(),
                port,
                servername: self.servername.clone().unwrap_or_else(|| host.clone()),
            },
            _ => return Err(CheckError::MissingEndpoint),
        };

        let thresholds = Thresholds {
            critical: self.critical,
            warning: self.warning,
        };
        if thresholds.warning < thresholds.critical {
            warn!(
                "warning threshold {} is less than critical threshold {}, WARNING is unreachable",
                thresholds.warning, thresholds.critical
            );
        }

        Ok(CheckConfig {
            source,
            thresholds,
            timeout: Duration::from_secs(self.timeout),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use clap::error::ErrorKind;

    fn fixture(name: &str) -> String {
        format!("{}/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
    }

    fn parse(args: &[&str]) -> Opts {
        let args = ["check-ssl-cert"].iter().chain(args.iter());
        Opts::try_parse_from(args).unwrap()
    }

    #[test]
    fn t_missing_endpoint() {
        let opts = parse(&["--critical", "7", "--warning", "30"]);
        assert!(matches!(opts.config(), Err(CheckError::MissingEndpoint)));
        assert_eq!(
            "Host and port required",
            opts.config().unwrap_err().to_string()
        );
    }

    #[test]
    fn t_host_without_port() {
        let opts = parse(&["-c", "7", "-w", "30", "-h", "example.com"]);
        assert!(matches!(opts.config(), Err(CheckError::MissingEndpoint)));

        let opts = parse(&["-c", "7", "-w", "30", "-p", "443"]);
        assert!(matches!(opts.config(), Err(CheckError::MissingEndpoint)));
    }

    #[test]
    fn t_no_such_cert() {
        let opts = parse(&["--pem", "/no/such/file", "--critical", "7", "--warning", "30"]);
        assert!(matches!(opts.config(), Err(CheckError::NoSuchCert)));
        assert_eq!("No such cert", opts.config().unwrap_err().to_string());
    }

    #[test]
    fn t_pem() {
        let path = fixture("cert.pem");
        let opts = parse(&["-P", &path, "-c", "7", "-w", "30"]);
        let config = opts.config().unwrap();
        assert_eq!(CertificateSource::LocalFile(path.into()), config.source);
        assert_eq!(
            Thresholds {
                critical: 7,
                warning: 30
            },
            config.thresholds
        );
    }

    #[test]
    fn t_pem_wins_over_host() {
        let path = fixture("cert.pem");
        let opts = parse(&["-P", &path, "-h", "example.com", "-p", "443", "-c", "7", "-w", "30"]);
        let config = opts.config().unwrap();
        assert!(matches!(config.source, CertificateSource::LocalFile(..)));
    }

    #[test]
    fn t_servername_defaults_to_host() {
        let opts = parse(&["-h", "example.com", "-p", "443", "-c", "7", "-w", "30"]);
        let config = opts.config().unwrap();
        assert_eq!(
            CertificateSource::RemoteEndpoint {
                host: "example.com".to_string(),
                port: 443,
                servername: "example.com".to_string(),
            },
            config.source
        );
    }

    #[test]
    fn t_servername() {
        let opts = parse(&[
            "--host",
            "192.0.2.1",
            "--port",
            "8443",
            "--servername",
            "example.com",
            "-c",
            "7",
            "-w",
            "30",
        ]);
        let config = opts.config().unwrap();
        assert_eq!(
            CertificateSource::RemoteEndpoint {
                host: "192.0.2.1".to_string(),
                port: 8443,
                servername: "example.com".to_string(),
            },
            config.source
        );
    }

    #[test]
    fn t_timeout() {
        let opts = parse(&["-h", "example.com", "-p", "443", "-c", "7", "-w", "30", "-t", "3"]);
        assert_eq!(Duration::from_secs(3), opts.config().unwrap().timeout);
    }

    #[test]
    fn t_default_timeout() {
        let opts = parse(&["-h", "example.com", "-p", "443", "-c", "7", "-w", "30"]);
        assert_eq!(DEFAULT_TIMEOUT, opts.config().unwrap().timeout);
    }

    #[test]
    fn t_reversed_thresholds_are_kept() {
        let opts = parse(&["-h", "example.com", "-p", "443", "-c", "30", "-w", "7"]);
        let thresholds = opts.config().unwrap().thresholds;
        assert_eq!(30, thresholds.critical);
        assert_eq!(7, thresholds.warning);
    }

    #[test]
    fn t_thresholds_required() {
        let err = Opts::try_parse_from(["check-ssl-cert", "-c", "7"]).unwrap_err();
        assert_eq!(ErrorKind::MissingRequiredArgument, err.kind());
    }

    #[test]
    fn t_invalid_port() {
        let err = Opts::try_parse_from(["check-ssl-cert", "-c", "7", "-w", "30", "-p", "0"])
            .unwrap_err();
        assert_eq!(ErrorKind::ValueValidation, err.kind());

        let err = Opts::try_parse_from(["check-ssl-cert", "-c", "7", "-w", "30", "-p", "https"])
            .unwrap_err();
        assert_eq!(ErrorKind::ValueValidation, err.kind());
    }

    #[test]
    fn t_help() {
        let err = Opts::try_parse_from(["check-ssl-cert", "--help"]).unwrap_err();
        assert_eq!(ErrorKind::DisplayHelp, err.kind());
    }
}
