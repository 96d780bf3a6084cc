use clap::Parser;
use robtools::runtime::{LogArgs, MnasetoolsCommands};
use std::process::ExitCode;

///////////////////////////////
/// Gaussian fits of MNase-seq dyad coverage
#[derive(Parser)]
#[command(name = "mnasetools", version, about)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,

    #[command(subcommand)]
    command: MnasetoolsCommands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = cli.log.init() {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    log::debug!("Running {:?}", cli.command);

    let result = match cli.command {
        MnasetoolsCommands::Fitgaussians(mut cmd) => cmd.try_execute(),
        MnasetoolsCommands::Fitdoublegaussian(mut cmd) => cmd.try_execute(),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
