use std::io;
use std::process;

use clap::Parser;
use semrel::utils::{logging, Secrets};
use semrel::Cli;
use tracing::debug;

fn main() {
    let cli = Cli::parse();

    let (secrets, ignored_settings) = Secrets::load();
    // Everything written through tracing is redacted; `run` redacts its own error output.
    logging::init(secrets.redactor(), &cli.global.verbosity);
    if let Some(e) = ignored_settings {
        debug!("Ignoring settings file: {e:#}");
    }
    debug!("Environment: {}", secrets.describe());

    let status = semrel::run(cli, &secrets, &mut io::stderr());
    process::exit(status);
}
