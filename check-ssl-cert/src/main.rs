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

use clap::error::ErrorKind;
use clap::Parser;
use log::debug;
use nagiosplugin::{safe_run, Resource, RunResult, ServiceState};

use check_ssl_cert::{CheckError, Checker, Opts};

fn main() {
    pretty_env_logger::init();

    let opts = match Opts::try_parse() {
        Ok(opts) => Ok(opts),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => Err(invalid_arguments(&e)),
    };

    run(&opts).print_and_exit()
}

fn run(opts: &Result<Opts, String>) -> RunResult<anyhow::Error> {
    safe_run(|| do_check(opts), ServiceState::Unknown)
}

fn do_check(opts: &Result<Opts, String>) -> anyhow::Result<Resource> {
    let opts = opts
        .as_ref()
        .map_err(|e| CheckError::InvalidArguments(e.clone()))?;
    debug!("{opts:?}");
    let config = opts.config()?;
    debug!("check {} with {:?}", config.source, config.thresholds);
    let checker = Checker::new(config.timeout);
    let verdict = checker.check(&config.source, &config.thresholds)?;
    Ok(verdict.into())
}

fn invalid_arguments(e: &clap::Error) -> String {
    let rendered = e.to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.trim_start_matches("error: ").to_string()
}
