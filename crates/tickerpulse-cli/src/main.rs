mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use std::process::ExitCode;

use crate::cli::Cli;
use crate::error::CliError;
use crate::output::Reporter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            tracing::error!(error = %error, "command failed");
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let mut reporter = Reporter::new(cli.format, cli.pretty);
    commands::run(&cli, &mut reporter).await?;

    if cli.strict && reporter.saw_no_data() {
        return Err(CliError::NoData);
    }

    Ok(ExitCode::SUCCESS)
}
