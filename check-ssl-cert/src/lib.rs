#![deny(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

//! Check when a SSL certificate will expire

pub use checker::{CertificateSource, Checker, DEFAULT_TIMEOUT};
pub use error::CheckError;
pub use opts::{CheckConfig, Opts};
pub use verdict::{Thresholds, Verdict};

mod checker;
mod error;
mod opts;
mod verdict;

/// Name printed in front of every status line
pub const CHECK_NAME: &str = "CheckSSLCert";
