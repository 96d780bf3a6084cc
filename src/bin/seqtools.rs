use clap::Parser;
use robtools::runtime::{LogArgs, SeqtoolsCommands};
use std::process::ExitCode;

///////////////////////////////
/// Sequencing data conversions, coverage and downloads
#[derive(Parser)]
#[command(name = "seqtools", version, about)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,

    #[command(subcommand)]
    command: SeqtoolsCommands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = cli.log.init() {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    log::debug!("Running {:?}", cli.command);

    let result = match cli.command {
        SeqtoolsCommands::Bam2bed(mut cmd) => cmd.try_execute(),
        SeqtoolsCommands::Genomecov(mut cmd) => cmd.try_execute(),
        SeqtoolsCommands::Download(mut cmd) => cmd.try_execute(),
        SeqtoolsCommands::Slowsplit(mut cmd) => cmd.try_execute(),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
