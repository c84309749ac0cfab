mod cli;

use clap::Parser;
use driftcheck::report::ExitStatus;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    cli::init_tracing(cli.verbose);

    match cli::run(&cli) {
        Ok(status) => ExitCode::from(status.code()),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(ExitStatus::Fault.code())
        }
    }
}
