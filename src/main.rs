use clap::Parser;
use robtools::runtime::{LogArgs, RobtoolsCommands};
use std::process::ExitCode;

///////////////////////////////
/// Wrappers for the alignment, filtering, coverage and Hi-C steps of the pipeline
#[derive(Parser)]
#[command(name = "robtools", version, about)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,

    #[command(subcommand)]
    command: RobtoolsCommands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = cli.log.init() {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    log::debug!("Running {:?}", cli.command);

    let result = match cli.command {
        RobtoolsCommands::Bam2bed(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Bowtie2(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Bwa(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Centerannotations(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Chipexoqual(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Distillerresolutions(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Download(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Filterbam(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Genomecov(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Keeprandomreads(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Keeprandomreadsbam(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Merge(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Pairs2hic(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Plot2do(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Printsample(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Shiftannotations(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Siqchip(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Siqchipbed(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Slowsplit(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Statistics(mut cmd) => cmd.try_execute(),
        RobtoolsCommands::Trimmomatic(mut cmd) => cmd.try_execute(),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
