//! Quantifying CLI — quarterly commons reporting pipeline helper.
//!
//! Keeps each quarter's generated `README.md` report up to date and
//! synchronizes the data tree with its git remote.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;
use quantifying_shared::QuantifyingError;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);

    if let Err(report) = commands::run(cli) {
        if let Some(err) = report.downcast_ref::<QuantifyingError>() {
            tracing::error!("{err}");
            std::process::exit(err.exit_code());
        }
        return Err(report);
    }
    Ok(())
}
